//! Stored conversation history and its assembly into provider turns.
//!
//! ```rust
//! use brook::{Attachment, ConversationMessage, Role, assemble_turns};
//!
//! let history = vec![
//!     ConversationMessage::user("Summarize this").with_attachment(Attachment::new(3, "uploads/q3.pdf")),
//!     ConversationMessage::waiting(),
//! ];
//!
//! let turns = assemble_turns("You are a helpful assistant!", &history);
//! assert_eq!(turns.len(), 3);
//! assert_eq!(turns[2].role, Role::System);
//! assert_eq!(turns[2].content, "The user has uploaded a file: **q3.pdf** with context_file_id: 3");
//! ```

use std::path::Path;

use bprovider::{Role, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    /// Placeholder row standing in for the reply still being generated.
    Waiting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub context_file_id: i64,
    pub file_name: String,
}

impl Attachment {
    pub fn new(context_file_id: i64, file_name: impl Into<String>) -> Self {
        Self {
            context_file_id,
            file_name: file_name.into(),
        }
    }

    pub fn basename(&self) -> &str {
        Path::new(&self.file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file_name)
    }

    fn announcement(&self) -> String {
        format!(
            "The user has uploaded a file: **{}** with context_file_id: {}",
            self.basename(),
            self.context_file_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub sender: Sender,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl ConversationMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    pub fn waiting() -> Self {
        Self::new(Sender::Waiting, "")
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// System prompt first, then history in order with waiting rows skipped. Each message with
/// attachments is followed by one system turn per attached file.
pub fn assemble_turns(system_prompt: &str, history: &[ConversationMessage]) -> Vec<Turn> {
    let mut turns = vec![Turn::system(system_prompt)];

    for message in history {
        let role = match message.sender {
            Sender::User => Role::User,
            Sender::Assistant => Role::Assistant,
            Sender::Waiting => continue,
        };

        turns.push(Turn::new(role, message.text.clone()));
        turns.extend(
            message
                .attachments
                .iter()
                .map(|attachment| Turn::system(attachment.announcement())),
        );
    }

    turns
}
