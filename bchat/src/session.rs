//! Per-round state owned by the orchestrator.

use std::fmt::{Display, Formatter};

use crate::ToolCallAccumulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Building,
    Streaming,
    Aggregating,
    Executing,
    Finalizing,
    Done,
    Failed,
}

impl OrchestratorState {
    pub fn can_transition_to(self, next: OrchestratorState) -> bool {
        use OrchestratorState::*;

        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Building, Streaming)
            | (Streaming, Aggregating)
            | (Aggregating, Executing | Finalizing)
            | (Executing, Building | Finalizing)
            | (Finalizing, Done) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Streaming => "streaming",
            Self::Aggregating => "aggregating",
            Self::Executing => "executing",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl Display for OrchestratorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one provider round accumulates. Created at round start and dropped at
/// round end; never shared.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub round: u32,
    pub tools_enabled: bool,
    pub buffer: String,
    pub accumulator: ToolCallAccumulator,
    pub state: OrchestratorState,
}

impl SessionState {
    pub fn new(round: u32, tools_enabled: bool) -> Self {
        Self {
            round,
            tools_enabled,
            buffer: String::new(),
            accumulator: ToolCallAccumulator::new(),
            state: OrchestratorState::Building,
        }
    }

    /// Moves to `next` and returns the state left behind.
    pub fn transition(&mut self, next: OrchestratorState) -> OrchestratorState {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        std::mem::replace(&mut self.state, next)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
