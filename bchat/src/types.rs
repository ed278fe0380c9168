//! Turn request and event types exposed by the orchestrator.

use std::pin::Pin;

use bcommon::{GenerationOptions, MetadataMap, SessionId, TraceId};
use bprovider::{Turn, UsageRecord};
use btooling::ToolResult;
use futures_core::Stream;

use crate::{ChatError, OutputFrame, ReadinessHandle};

/// Everything needed to drive one client-facing turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: SessionId,
    pub model: String,
    /// Assembled history, system prompt first, ending with the new user turn.
    pub turns: Vec<Turn>,
    pub options: GenerationOptions,
    /// Background work that must finish before the first round is built.
    pub readiness: Vec<ReadinessHandle>,
    pub trace_id: Option<TraceId>,
    pub metadata: MetadataMap,
}

impl TurnRequest {
    pub fn new(
        conversation_id: impl Into<SessionId>,
        model: impl Into<String>,
        turns: Vec<Turn>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            model: model.into(),
            turns,
            options: GenerationOptions::standard(),
            readiness: Vec::new(),
            trace_id: None,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn await_ready(mut self, handle: ReadinessHandle) -> Self {
        self.readiness.push(handle);
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnSummary {
    pub conversation_id: SessionId,
    pub rounds: u32,
    /// Raw buffer of the final round.
    pub final_text: String,
    pub rendered: String,
    /// One entry per round in order; `None` where the provider sent no usage.
    pub usage: Vec<Option<UsageRecord>>,
    pub round_limit_reached: bool,
    pub title: Option<String>,
    pub message_saved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Frame(OutputFrame),
    ToolResults { round: u32, results: Vec<ToolResult> },
    TurnComplete(TurnSummary),
    TurnFailed(ChatError),
}

impl ChatEvent {
    pub fn frame(&self) -> Option<&OutputFrame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

pub type ChatEventStream<'a> = Pin<Box<dyn Stream<Item = ChatEvent> + Send + 'a>>;
