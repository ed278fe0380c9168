//! Provider construction for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use bobserve::{SafeProviderHooks, TracingObservabilityHooks};
use bprovider::{
    ModelProvider, ProviderError, ProviderId, ProviderOperationHooks, RetryPolicy, SecretString,
    SecureCredentialManager,
};

use crate::EngineConfig;

#[derive(Clone)]
pub struct ProviderBuildConfig {
    pub provider_id: ProviderId,
    pub api_key: Option<Arc<SecretString>>,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub hooks: Arc<dyn ProviderOperationHooks>,
}

impl std::fmt::Debug for ProviderBuildConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBuildConfig")
            .field("provider_id", &self.provider_id)
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl ProviderBuildConfig {
    pub fn new(provider_id: ProviderId) -> Self {
        Self {
            provider_id,
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(90),
            retry_policy: RetryPolicy::default(),
            hooks: Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)),
        }
    }

    pub fn from_engine_config(config: &EngineConfig) -> Self {
        let mut build = Self::new(config.provider).with_timeout(config.http_timeout());
        build.base_url = config.base_url.clone();
        build
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Arc::new(SecretString::new(api_key)));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The endpoint the provider will talk to: the explicit override, else the well-known one.
    pub fn resolved_base_url(&self) -> Result<String, ProviderError> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .or_else(|| self.provider_id.default_base_url())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::invalid_request(format!(
                    "{} provider requires a base url",
                    self.provider_id
                ))
            })
    }

    fn credentials(&self) -> Result<Arc<SecureCredentialManager>, ProviderError> {
        let credentials = Arc::new(SecureCredentialManager::new());

        match self.api_key.as_deref() {
            Some(secret) => credentials.set_api_key(self.provider_id, secret.expose())?,
            None if self.provider_id == ProviderId::OpenAiCompatible => {}
            None => {
                return Err(ProviderError::authentication(format!(
                    "{} provider API key must not be empty",
                    self.provider_id
                )));
            }
        }

        Ok(credentials)
    }
}

pub fn build_provider_from_api_key(
    provider_id: ProviderId,
    api_key: impl Into<String>,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    build_provider_with_config(ProviderBuildConfig::new(provider_id).with_api_key(api_key))
}

#[cfg(feature = "provider-openai")]
pub fn build_provider_with_config(
    config: ProviderBuildConfig,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    use bprovider::adapters::openai::{OpenAiCompatibleProvider, OpenAiHttpTransport};

    let base_url = config.resolved_base_url()?;
    let credentials = config.credentials()?;
    let http = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    tracing::debug!(
        provider = %config.provider_id,
        base_url = base_url.as_str(),
        timeout_ms = config.timeout.as_millis() as u64,
        "building chat-completions provider"
    );

    let transport = Arc::new(OpenAiHttpTransport::new(http, base_url));
    let provider = OpenAiCompatibleProvider::new(config.provider_id, credentials, transport)
        .with_retry_policy(config.retry_policy)
        .with_operation_hooks(config.hooks);

    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-openai"))]
pub fn build_provider_with_config(
    config: ProviderBuildConfig,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    config.resolved_base_url()?;
    config.credentials()?;
    Err(ProviderError::invalid_request(
        "provider-openai feature is not enabled on brook",
    ))
}
