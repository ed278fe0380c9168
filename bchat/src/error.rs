//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use bprovider::{ProviderError, ProviderErrorKind};
use btooling::{ToolError, ToolErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    Store,
    Tooling,
    Cancelled,
}

/// Where in the round the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    Building,
    Streaming,
    Executing,
    Finalizing,
    Recording,
    TitleGeneration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatErrorSource {
    Provider {
        kind: ProviderErrorKind,
        retryable: bool,
    },
    Tool {
        kind: ToolErrorKind,
        retryable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatErrorPhase>,
    pub source: Option<ChatErrorSource>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
            source: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn is_retryable(&self) -> bool {
        match &self.source {
            Some(ChatErrorSource::Provider { retryable, .. })
            | Some(ChatErrorSource::Tool { retryable, .. }) => *retryable,
            None => false,
        }
    }

    pub fn is_user_error(&self) -> bool {
        match (&self.kind, &self.source) {
            (ChatErrorKind::InvalidRequest, _) => true,
            (
                _,
                Some(ChatErrorSource::Provider {
                    kind: ProviderErrorKind::InvalidRequest,
                    ..
                }),
            ) => true,
            (
                _,
                Some(ChatErrorSource::Tool {
                    kind: ToolErrorKind::InvalidArguments | ToolErrorKind::NotFound,
                    ..
                }),
            ) => true,
            _ => false,
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} during {:?}: {}", self.kind, phase, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        Self {
            kind: ChatErrorKind::Provider,
            source: Some(ChatErrorSource::Provider {
                kind: value.kind,
                retryable: value.retryable,
            }),
            message: value.message,
            phase: None,
        }
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        Self {
            kind: ChatErrorKind::Tooling,
            source: Some(ChatErrorSource::Tool {
                kind: value.kind,
                retryable: value.retryable,
            }),
            message: value.message,
            phase: Some(ChatErrorPhase::Executing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_classification() {
        let error = ChatError::from(ProviderError::rate_limited("slow down"))
            .with_phase(ChatErrorPhase::Building);

        assert_eq!(error.kind, ChatErrorKind::Provider);
        assert!(error.is_retryable());
        assert!(!error.is_user_error());
        assert_eq!(error.to_string(), "Provider during Building: slow down");
    }

    #[test]
    fn user_errors_are_recognised() {
        assert!(ChatError::invalid_request("no turns").is_user_error());
        assert!(ChatError::from(ProviderError::invalid_request("bad temperature")).is_user_error());
        assert!(ChatError::from(ToolError::not_found("missing")).is_user_error());
        assert!(!ChatError::cancelled("client left").is_user_error());
    }
}
