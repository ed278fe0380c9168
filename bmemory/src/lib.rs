//! Conversation and usage persistence with adapters for the chat layer.
//!
//! ```rust
//! use bmemory::{MemoryBackendConfig, create_memory_backend};
//!
//! let backend = create_memory_backend(MemoryBackendConfig::InMemory)
//!     .expect("in-memory backend always builds");
//! let _shared = backend.clone();
//! ```

mod adapter;
mod backend;
mod backends;
mod error;
mod types;

pub mod prelude {
    pub use crate::{
        ContextWindowUsage, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
        MemoryConversationStore, MemoryError, MemoryErrorKind, MemoryUsageRecorder,
        SqliteMemoryBackend, create_default_memory_backend, create_memory_backend,
    };
}

pub use adapter::{MemoryConversationStore, MemoryUsageRecorder};
pub use backend::{
    InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig, SqliteMemoryBackend,
    create_default_memory_backend, create_memory_backend,
};
pub use error::{MemoryError, MemoryErrorKind};
pub use types::ContextWindowUsage;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bchat::{AssistantMessage, ConversationStore, UsageEntry, UsageKind, UsageRecorder};
    use bcommon::SessionId;
    use bprovider::UsageRecord;
    use serde_json::json;

    use crate::{
        InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig, MemoryConversationStore,
        MemoryErrorKind, MemoryUsageRecorder, SqliteMemoryBackend,
    };

    fn temp_path(prefix: &str) -> std::path::PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("bmemory-{prefix}-{unique}"))
            .join("brook.sqlite3")
    }

    fn round(conversation: &str, round: u32, usage: Option<UsageRecord>) -> UsageEntry {
        UsageEntry::for_round(
            SessionId::from(conversation),
            round,
            json!({"model": "gpt-4o-mini", "stream": true}),
            vec![json!({"choices": [{"delta": {"content": "hi"}}]})],
            usage,
        )
    }

    async fn exercise_backend(backend: &dyn MemoryBackend) {
        let conversation = SessionId::from("conversation-a");

        backend
            .save_assistant_message(AssistantMessage {
                conversation_id: conversation.clone(),
                raw_text: "**hi**".to_string(),
                rendered: "<p><strong>hi</strong></p>\n".to_string(),
            })
            .await
            .expect("message should save");
        assert_eq!(backend.load_title(&conversation).await.expect("title"), None);

        backend
            .save_title(&conversation, "Greetings".to_string())
            .await
            .expect("title should save");

        backend
            .append_usage_entry(round("conversation-a", 1, Some(UsageRecord::new(100, 28))))
            .await
            .expect("usage should append");
        backend
            .append_usage_entry(UsageEntry::for_title(
                conversation.clone(),
                json!({"messages": []}),
                json!({"choices": []}),
                Some(UsageRecord::new(5, 2)),
            ))
            .await
            .expect("title usage should append");

        let messages = backend
            .load_assistant_messages(&conversation)
            .await
            .expect("messages should load");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].raw_text, "**hi**");
        assert_eq!(
            backend.load_title(&conversation).await.expect("title"),
            Some("Greetings".to_string())
        );

        let entries = backend
            .load_usage_entries(&conversation)
            .await
            .expect("usage should load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, UsageKind::Round);
        assert_eq!(entries[0].response, json!([{"choices": [{"delta": {"content": "hi"}}]}]));
        assert_eq!(entries[1].kind, UsageKind::Title);

        assert_eq!(
            backend
                .latest_total_tokens(&conversation)
                .await
                .expect("latest tokens"),
            Some(128)
        );
        assert_eq!(
            backend
                .context_window_percentage(&conversation, 1_280)
                .await
                .expect("percentage"),
            Some("10.00 %".to_string())
        );
    }

    #[tokio::test]
    async fn in_memory_backend_round_trips_conversation_rows() {
        exercise_backend(&InMemoryMemoryBackend::new()).await;
    }

    #[tokio::test]
    async fn sqlite_backend_round_trips_conversation_rows() {
        let backend =
            SqliteMemoryBackend::new_in_memory().expect("sqlite backend should initialize");
        exercise_backend(&backend).await;
    }

    #[tokio::test]
    async fn sqlite_backend_persists_across_reopen() {
        let path = temp_path("reopen");
        let conversation = SessionId::from("conversation-b");

        {
            let backend = SqliteMemoryBackend::new(&path).expect("sqlite file should open");
            backend
                .append_usage_entry(round("conversation-b", 1, None))
                .await
                .expect("usage should append");
        }

        let reopened = SqliteMemoryBackend::new(&path).expect("sqlite file should reopen");
        let entries = reopened
            .load_usage_entries(&conversation)
            .await
            .expect("usage should load");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].usage, None);
        assert_eq!(
            reopened
                .latest_total_tokens(&conversation)
                .await
                .expect("latest tokens"),
            None
        );

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).expect("temporary directory should be removable");
        }
    }

    #[tokio::test]
    async fn usage_details_survive_sqlite_storage() {
        let backend =
            SqliteMemoryBackend::new_in_memory().expect("sqlite backend should initialize");
        let usage = UsageRecord {
            prompt_tokens_details: Some(json!({"cached_tokens": 64})),
            ..UsageRecord::new(80, 20)
        };
        backend
            .append_usage_entry(round("conversation-c", 2, Some(usage.clone())))
            .await
            .expect("usage should append");

        let entries = backend
            .load_usage_entries(&SessionId::from("conversation-c"))
            .await
            .expect("usage should load");
        assert_eq!(entries[0].round, 2);
        assert_eq!(entries[0].usage, Some(usage));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let backend = InMemoryMemoryBackend::new();
        let error = backend
            .save_title(&SessionId::from("c"), "  ".to_string())
            .await
            .expect_err("blank title");
        assert_eq!(error.kind, MemoryErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn adapters_route_chat_seams_into_the_backend() {
        let backend: Arc<dyn MemoryBackend> = Arc::new(InMemoryMemoryBackend::new());
        let store = MemoryConversationStore::new(backend.clone());
        let recorder = MemoryUsageRecorder::new(backend.clone());
        let conversation = SessionId::from("conversation-d");

        store
            .save_assistant_message(AssistantMessage {
                conversation_id: conversation.clone(),
                raw_text: "done".to_string(),
                rendered: "<p>done</p>\n".to_string(),
            })
            .await
            .expect("save should work");
        store
            .set_title(&conversation, "Wrap-up".to_string())
            .await
            .expect("title should work");
        recorder
            .record(round("conversation-d", 1, Some(UsageRecord::new(3, 4))))
            .await
            .expect("record should work");

        assert_eq!(
            store.title(&conversation).await.expect("title"),
            Some("Wrap-up".to_string())
        );
        assert_eq!(
            backend
                .load_assistant_messages(&conversation)
                .await
                .expect("messages")
                .len(),
            1
        );
        assert_eq!(
            backend
                .latest_total_tokens(&conversation)
                .await
                .expect("tokens"),
            Some(7)
        );
    }

    #[test]
    fn backend_config_deserializes_from_tagged_json() {
        let config: MemoryBackendConfig =
            serde_json::from_value(json!({"kind": "sqlite", "path": "/tmp/brook.sqlite3"}))
                .expect("config should parse");
        assert_eq!(
            config,
            MemoryBackendConfig::Sqlite {
                path: "/tmp/brook.sqlite3".into()
            }
        );

        let in_memory: MemoryBackendConfig =
            serde_json::from_value(json!({"kind": "in_memory"})).expect("config should parse");
        assert_eq!(in_memory, MemoryBackendConfig::InMemory);
    }
}
