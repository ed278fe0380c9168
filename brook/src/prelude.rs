//! Common imports for most brook applications.

pub use crate::{brook_turn, brook_turns};
pub use crate::{
    Attachment, BrookError, ChatError, ChatEvent, ChatPolicy, ConversationMessage,
    ConversationOrchestrator, DocumentSource, EngineConfig, GetFileTextTool,
    InMemoryDocumentSource, MemoryBackend, MemoryBackendConfig, ModelProvider, OutputFrame,
    ProviderBuildConfig, ProviderError, ProviderId, Role, RuntimeBundle, SessionId, Tool,
    ToolRegistry, Turn, TurnRequest, TurnSummary, assemble_turns, build_provider_from_api_key,
    build_provider_with_config, build_runtime, build_runtime_with, build_runtime_with_documents,
    in_memory_backend,
};
