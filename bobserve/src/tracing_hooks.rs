//! Tracing-based observability hooks for provider dispatch, tool execution and turns.
//!
//! ```rust
//! use bobserve::TracingObservabilityHooks;
//! use bchat::ChatRuntimeHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_chat_hooks(&hooks);
//! ```

use std::time::Duration;

use bchat::{ChatError, ChatRuntimeHooks, OrchestratorState, TurnSummary};
use bcommon::SessionId;
use bprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use btooling::{
    ToolArgumentParseError, ToolCall, ToolError, ToolExecutionContext, ToolResult,
    ToolRuntimeHooks,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.function_name,
            tool_call_id = tool_call.id,
            conversation_id = %context.session_id,
            round = context.round,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.function_name,
            tool_call_id = tool_call.id,
            conversation_id = %context.session_id,
            round = context.round,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            has_output = result.has_output(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.function_name,
            tool_call_id = tool_call.id,
            conversation_id = %context.session_id,
            round = context.round,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_arguments_rejected(&self, error: &ToolArgumentParseError, context: &ToolExecutionContext) {
        tracing::warn!(
            phase = "tool",
            event = "arguments_rejected",
            tool_name = error.display_name(),
            tool_call_id = error.tool_call_id,
            index = error.index,
            conversation_id = %context.session_id,
            round = context.round,
            error = %error
        );
    }
}

impl ChatRuntimeHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, conversation_id: &SessionId) {
        tracing::info!(phase = "chat", event = "turn_start", conversation_id = %conversation_id);
    }

    fn on_round_start(&self, conversation_id: &SessionId, round: u32, tools_enabled: bool) {
        tracing::debug!(
            phase = "chat",
            event = "round_start",
            conversation_id = %conversation_id,
            round,
            tools_enabled
        );
    }

    fn on_state_change(
        &self,
        conversation_id: &SessionId,
        round: u32,
        from: OrchestratorState,
        to: OrchestratorState,
    ) {
        tracing::debug!(
            phase = "chat",
            event = "state_change",
            conversation_id = %conversation_id,
            round,
            from = ?from,
            to = ?to
        );
    }

    fn on_tool_batch(&self, conversation_id: &SessionId, round: u32, results: &[ToolResult]) {
        tracing::info!(
            phase = "chat",
            event = "tool_batch",
            conversation_id = %conversation_id,
            round,
            calls = results.len(),
            with_output = results.iter().filter(|result| result.has_output()).count()
        );
    }

    fn on_recording_failure(&self, conversation_id: &SessionId, round: u32, error: &ChatError) {
        tracing::warn!(
            phase = "chat",
            event = "recording_failure",
            conversation_id = %conversation_id,
            round,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_finalized(&self, conversation_id: &SessionId, saved: bool, title: Option<&str>) {
        tracing::info!(
            phase = "chat",
            event = "finalized",
            conversation_id = %conversation_id,
            saved,
            title
        );
    }

    fn on_title_failure(&self, conversation_id: &SessionId, error: &ChatError) {
        tracing::warn!(
            phase = "chat",
            event = "title_failure",
            conversation_id = %conversation_id,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_turn_complete(&self, summary: &TurnSummary, elapsed: Duration) {
        tracing::info!(
            phase = "chat",
            event = "turn_complete",
            conversation_id = %summary.conversation_id,
            rounds = summary.rounds,
            round_limit_reached = summary.round_limit_reached,
            message_saved = summary.message_saved,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failure(&self, conversation_id: &SessionId, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "chat",
            event = "turn_failure",
            conversation_id = %conversation_id,
            error_kind = ?error.kind,
            error_phase = ?error.phase,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error
        );
    }
}
