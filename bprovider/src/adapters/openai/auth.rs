//! Credential resolution for chat-completions endpoints.

use crate::{ProviderError, ProviderId, SecureCredentialManager};

#[derive(Clone, PartialEq, Eq)]
pub enum OpenAiAuth {
    ApiKey(String),
    /// Local compatible servers frequently run without authentication.
    Anonymous,
}

impl std::fmt::Debug for OpenAiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("OpenAiAuth::ApiKey([REDACTED])"),
            Self::Anonymous => f.write_str("OpenAiAuth::Anonymous"),
        }
    }
}

pub(crate) fn resolve_auth(
    credentials: &SecureCredentialManager,
    provider: ProviderId,
) -> Result<OpenAiAuth, ProviderError> {
    if let Some(api_key) = credentials.api_key(provider)? {
        return Ok(OpenAiAuth::ApiKey(api_key));
    }

    match provider {
        ProviderId::OpenAiCompatible => Ok(OpenAiAuth::Anonymous),
        ProviderId::OpenAi | ProviderId::Mistral => Err(ProviderError::authentication(format!(
            "no {provider} API key configured"
        ))),
    }
}
