//! Unified facade over the brook workspace crates.
//!
//! This crate is the single dependency for most applications. It re-exports the engine
//! crates and wires providers, persistence, observability and the document tool together.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use brook::{ConversationMessage, EngineConfig, InMemoryDocumentSource, MemoryBackendConfig};
//!
//! let mut config = EngineConfig::default();
//! config.memory = MemoryBackendConfig::InMemory;
//!
//! let documents = Arc::new(InMemoryDocumentSource::new());
//! documents.insert(1, "budget.pdf", "quarterly budget: 10k").expect("insert");
//!
//! let provider = brook::build_provider_from_api_key(config.provider, "sk-test")
//!     .expect("provider should build");
//! let runtime = brook::build_runtime_with_documents(provider, config, documents)
//!     .expect("runtime should build");
//!
//! let request = runtime.turn_request("conversation-1", &[ConversationMessage::user("hi")]);
//! assert_eq!(request.turns.len(), 2);
//! ```

mod config;
mod documents;
mod error;
mod history;
mod macros;
mod providers;

pub mod logging;
pub mod prelude;
pub mod runtime;

pub use bchat;
pub use bcommon;
pub use bmemory;
pub use bobserve;
pub use bprovider;
pub use btooling;

pub use bchat::{
    ChatError, ChatErrorKind, ChatErrorPhase, ChatErrorSource, ChatEvent, ChatEventStream,
    ChatPolicy, ChatRuntimeHooks, ConversationOrchestrator, ConversationOrchestratorBuilder,
    ConversationStore, DisconnectPolicy, FrameKind, FrameSink, OutputFrame, Readiness,
    ReadinessHandle, ReadinessSignal, TurnRequest, TurnSummary, UsageEntry, UsageKind,
    UsageRecorder, readiness,
};
pub use bcommon::{BoxFuture, GenerationOptions, MetadataMap, SessionId, TraceId};
pub use bmemory::{
    ContextWindowUsage, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    MemoryConversationStore, MemoryError, MemoryErrorKind, MemoryUsageRecorder,
    SqliteMemoryBackend,
};
pub use bobserve::{
    MetricsObservabilityHooks, SafeChatHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use bprovider::{
    ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderErrorKind, ProviderId,
    RetryPolicy, Role, SecretString, ToolSchema, Turn, UsageRecord,
};
pub use btooling::{
    Tool, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionRouter, ToolRegistry,
    ToolResult, ToolRouter,
};

pub use config::{DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, EngineConfig, MAX_TIMEOUT_SECS};
pub use documents::{
    Document, DocumentSource, GET_FILE_TEXT, GetFileTextTool, InMemoryDocumentSource,
    file_not_found_text, get_file_text_schema,
};
pub use error::{BrookError, BrookErrorKind};
pub use history::{Attachment, ConversationMessage, Sender, assemble_turns};
pub use providers::{ProviderBuildConfig, build_provider_from_api_key, build_provider_with_config};
pub use runtime::{
    RuntimeBundle, build_runtime, build_runtime_with, build_runtime_with_documents,
    document_tools, in_memory_backend, memory_backed_builder, orchestrator_with_memory,
};

#[cfg(test)]
mod tests {
    use crate::Role;

    #[test]
    fn brook_turn_macro_creates_expected_turn() {
        let turn = crate::brook_turn!(user => "hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hello");
    }

    #[test]
    fn brook_turns_macro_builds_turn_vector() {
        let turns = crate::brook_turns![
            system => "You are a helpful assistant!",
            user => "Summarize file 1",
            tool => "quarterly budget: 10k",
        ];

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[2].role, Role::Tool);
    }
}
