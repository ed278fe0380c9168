//! Memory backend trait, backend configuration and the in-memory backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bchat::{AssistantMessage, UsageEntry, UsageKind};
use bcommon::{BoxFuture, SessionId};
use serde::Deserialize;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;
use crate::types::ContextWindowUsage;

pub use crate::backends::sqlite::SqliteMemoryBackend;

pub trait MemoryBackend: Send + Sync {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn load_assistant_messages<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<AssistantMessage>, MemoryError>>;

    fn load_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<String>, MemoryError>>;

    fn save_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn append_usage_entry<'a>(
        &'a self,
        entry: UsageEntry,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    /// Entries in the order they were recorded.
    fn load_usage_entries<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<UsageEntry>, MemoryError>>;

    /// `total_tokens` of the most recent conversation round, ignoring title calls.
    fn latest_total_tokens<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<u64>, MemoryError>> {
        Box::pin(async move {
            let entries = self.load_usage_entries(conversation_id).await?;
            Ok(entries
                .iter()
                .rev()
                .find(|entry| entry.kind == UsageKind::Round)
                .and_then(UsageEntry::total_tokens))
        })
    }

    fn context_window_usage<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        context_window: u64,
    ) -> BoxFuture<'a, Result<Option<ContextWindowUsage>, MemoryError>> {
        Box::pin(async move {
            Ok(self
                .latest_total_tokens(conversation_id)
                .await?
                .map(|total| ContextWindowUsage::new(total, context_window)))
        })
    }

    /// Formatted as `"12.34 %"`; `None` until a round with usage was recorded.
    fn context_window_percentage<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        context_window: u64,
    ) -> BoxFuture<'a, Result<Option<String>, MemoryError>> {
        Box::pin(async move {
            Ok(self
                .context_window_usage(conversation_id, context_window)
                .await?
                .map(|usage| usage.to_string()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryBackendConfig {
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
    InMemory,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_memory_backend(
    config: MemoryBackendConfig,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match config {
        MemoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteMemoryBackend::new(path)?)),
        MemoryBackendConfig::InMemory => Ok(Arc::new(InMemoryMemoryBackend::new())),
    }
}

pub fn create_default_memory_backend() -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    create_memory_backend(MemoryBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    conversations: Mutex<HashMap<SessionId, ConversationRows>>,
}

#[derive(Debug, Default, Clone)]
struct ConversationRows {
    title: Option<String>,
    messages: Vec<AssistantMessage>,
    usage: Vec<UsageEntry>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_rows<T>(
        &self,
        conversation_id: &SessionId,
        f: impl FnOnce(&mut ConversationRows) -> T,
    ) -> Result<T, MemoryError> {
        let mut conversations = self
            .conversations
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))?;
        Ok(f(conversations.entry(conversation_id.clone()).or_default()))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let conversation_id = message.conversation_id.clone();
            self.with_rows(&conversation_id, |rows| rows.messages.push(message))
        })
    }

    fn load_assistant_messages<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<AssistantMessage>, MemoryError>> {
        Box::pin(async move { self.with_rows(conversation_id, |rows| rows.messages.clone()) })
    }

    fn load_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<String>, MemoryError>> {
        Box::pin(async move { self.with_rows(conversation_id, |rows| rows.title.clone()) })
    }

    fn save_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            if title.trim().is_empty() {
                return Err(MemoryError::invalid_request("title must not be empty"));
            }
            self.with_rows(conversation_id, |rows| rows.title = Some(title))
        })
    }

    fn append_usage_entry<'a>(
        &'a self,
        entry: UsageEntry,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let conversation_id = entry.conversation_id.clone();
            self.with_rows(&conversation_id, |rows| rows.usage.push(entry))
        })
    }

    fn load_usage_entries<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<UsageEntry>, MemoryError>> {
        Box::pin(async move { self.with_rows(conversation_id, |rows| rows.usage.clone()) })
    }
}
