//! Streaming conversation orchestration: provider rounds, tool-call reassembly, live
//! frames, finalization and usage recording.

mod accumulator;
mod error;
mod finalizer;
mod frame;
mod hooks;
mod orchestrator;
mod policy;
mod readiness;
mod recorder;
mod render;
mod session;
mod sink;
mod store;
mod title;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatErrorPhase, ChatEvent, ChatEventStream, ChatPolicy,
        ConversationOrchestrator, ConversationStore, DisconnectPolicy, FrameSink,
        InMemoryConversationStore, InMemoryUsageRecorder, OutputFrame, TurnRequest, TurnSummary,
        UsageEntry, UsageRecorder,
    };
    pub use bcommon::{MetadataMap, SessionId, TraceId};
    pub use btooling::{
        Tool, ToolCall, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionRouter,
        ToolRegistry, ToolResult, ToolRouter,
    };
}

pub use accumulator::{PartialToolCall, ToolCallAccumulator};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase, ChatErrorSource};
pub use finalizer::{FinalizeOutcome, Finalizer};
pub use frame::{FrameKind, OutputFrame};
pub use hooks::{ChatRuntimeHooks, NoopChatRuntimeHooks};
pub use orchestrator::{ConversationOrchestrator, ConversationOrchestratorBuilder};
pub use policy::{ChatPolicy, DisconnectPolicy};
pub use readiness::{Readiness, ReadinessError, ReadinessHandle, ReadinessSignal, readiness};
pub use recorder::{InMemoryUsageRecorder, UsageEntry, UsageKind, UsageRecorder};
pub use render::{MarkdownRenderer, PlainTextRenderer, Renderer};
pub use session::{OrchestratorState, SessionState};
pub use sink::{FrameSink, SinkClosed};
pub use store::{AssistantMessage, ChatFuture, ConversationStore, InMemoryConversationStore};
pub use title::{MAX_TITLE_CHARS, TitleGenerator, sanitize_title, title_prompt};
pub use types::{ChatEvent, ChatEventStream, TurnRequest, TurnSummary};
pub use bcommon::{MetadataMap, SessionId, TraceId};
