//! Facade-level setup errors: configuration, logging, storage and provider construction.

use std::error::Error;
use std::fmt::{Display, Formatter};

use bmemory::MemoryError;
use bprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrookErrorKind {
    Config,
    Logging,
    Memory,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrookError {
    pub kind: BrookErrorKind,
    pub message: String,
}

impl BrookError {
    pub fn new(kind: BrookErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(BrookErrorKind::Config, message)
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::new(BrookErrorKind::Logging, message)
    }
}

impl Display for BrookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for BrookError {}

impl From<MemoryError> for BrookError {
    fn from(value: MemoryError) -> Self {
        Self::new(BrookErrorKind::Memory, value.to_string())
    }
}

impl From<ProviderError> for BrookError {
    fn from(value: ProviderError) -> Self {
        Self::new(BrookErrorKind::Provider, value.to_string())
    }
}

impl From<serde_json::Error> for BrookError {
    fn from(value: serde_json::Error) -> Self {
        Self::config(format!("invalid engine configuration: {value}"))
    }
}
