//! Tool execution errors and argument parse failures.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotFound,
    InvalidArguments,
    Execution,
    Timeout,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message, false)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message, false)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Other, message, false)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::InvalidArguments | ToolErrorKind::NotFound
        )
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(tool_name) = &self.tool_name {
            write!(f, " [tool={tool_name}")?;
            if let Some(tool_call_id) = &self.tool_call_id {
                write!(f, ", call_id={tool_call_id}")?;
            }
            f.write_str("]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Error for ToolError {}

/// A streamed tool call whose accumulated arguments could not be turned into a call.
///
/// Scoped to one call: the rest of the batch still executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolArgumentParseError {
    pub index: u32,
    pub tool_call_id: String,
    pub function_name: Option<String>,
    pub raw_arguments: String,
    pub message: String,
}

impl ToolArgumentParseError {
    pub fn display_name(&self) -> &str {
        self.function_name.as_deref().unwrap_or("<unnamed>")
    }
}

impl Display for ToolArgumentParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tool call {} (index {}) for '{}' has invalid arguments: {}",
            self.tool_call_id,
            self.index,
            self.display_name(),
            self.message
        )
    }
}

impl Error for ToolArgumentParseError {}

impl From<ToolArgumentParseError> for ToolError {
    fn from(value: ToolArgumentParseError) -> Self {
        let mut error = ToolError::invalid_arguments(value.message).with_tool_call_id(value.tool_call_id);
        error.tool_name = value.function_name;
        error
    }
}
