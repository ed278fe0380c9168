//! Client-facing output frames in server-sent-events framing.
//!
//! ```rust
//! use bchat::OutputFrame;
//!
//! assert_eq!(OutputFrame::data("<p>Hi</p>").encode(), "data: {\"text\":\"<p>Hi</p>\"}\n\n");
//! assert_eq!(OutputFrame::Close.encode(), "event: close\n\n");
//! ```

use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Close,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    /// The whole round buffer rendered so far, never a delta.
    Data { text: String },
    Close,
    Error { message: String },
}

impl OutputFrame {
    pub fn data(text: impl Into<String>) -> Self {
        Self::Data { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Data { .. } => FrameKind::Data,
            Self::Close => FrameKind::Close,
            Self::Error { .. } => FrameKind::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Data { .. })
    }

    /// JSON payload carried by the frame, if any.
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::Data { text } => Some(json!({ "text": text }).to_string()),
            Self::Close => None,
            Self::Error { message } => Some(json!({ "error": message }).to_string()),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Data { text } => format!("data: {}\n\n", json!({ "text": text })),
            Self::Close => "event: close\n\n".to_string(),
            Self::Error { message } => {
                format!("event: error\ndata: {}\n\n", json!({ "error": message }))
            }
        }
    }
}
