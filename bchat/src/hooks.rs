//! Runtime hooks for orchestrator lifecycle events.
//!
//! ```rust
//! use bchat::{ChatRuntimeHooks, NoopChatRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! assert_hooks_trait(&NoopChatRuntimeHooks);
//! ```

use std::time::Duration;

use bcommon::SessionId;
use btooling::ToolResult;

use crate::{ChatError, OrchestratorState, TurnSummary};

pub trait ChatRuntimeHooks: Send + Sync {
    fn on_turn_start(&self, _conversation_id: &SessionId) {}

    fn on_round_start(&self, _conversation_id: &SessionId, _round: u32, _tools_enabled: bool) {}

    fn on_state_change(
        &self,
        _conversation_id: &SessionId,
        _round: u32,
        _from: OrchestratorState,
        _to: OrchestratorState,
    ) {
    }

    fn on_tool_batch(&self, _conversation_id: &SessionId, _round: u32, _results: &[ToolResult]) {}

    fn on_recording_failure(&self, _conversation_id: &SessionId, _round: u32, _error: &ChatError) {
    }

    fn on_finalized(&self, _conversation_id: &SessionId, _saved: bool, _title: Option<&str>) {}

    fn on_title_failure(&self, _conversation_id: &SessionId, _error: &ChatError) {}

    fn on_turn_complete(&self, _summary: &TurnSummary, _elapsed: Duration) {}

    fn on_turn_failure(&self, _conversation_id: &SessionId, _error: &ChatError, _elapsed: Duration) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatRuntimeHooks;

impl ChatRuntimeHooks for NoopChatRuntimeHooks {}
