//! Metrics-based observability hooks for provider dispatch, tool execution and turns.
//!
//! ```rust
//! use bobserve::MetricsObservabilityHooks;
//! use bprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
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
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "brook_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "brook_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "brook_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "brook_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "brook_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "brook_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "brook_tool_execution_start_total",
            "tool_name" => tool_call.function_name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "brook_tool_execution_success_total",
            "tool_name" => tool_call.function_name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "brook_tool_execution_duration_seconds",
            "tool_name" => tool_call.function_name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "brook_tool_execution_failure_total",
            "tool_name" => tool_call.function_name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "brook_tool_execution_duration_seconds",
            "tool_name" => tool_call.function_name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_arguments_rejected(&self, error: &ToolArgumentParseError, _context: &ToolExecutionContext) {
        metrics::counter!(
            "brook_tool_arguments_rejected_total",
            "tool_name" => error.display_name().to_string()
        )
        .increment(1);
    }
}

impl ChatRuntimeHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _conversation_id: &SessionId) {
        metrics::counter!("brook_chat_turn_start_total").increment(1);
    }

    fn on_round_start(&self, _conversation_id: &SessionId, _round: u32, tools_enabled: bool) {
        metrics::counter!(
            "brook_chat_round_start_total",
            "tools_enabled" => tools_enabled.to_string()
        )
        .increment(1);
    }

    fn on_state_change(
        &self,
        _conversation_id: &SessionId,
        _round: u32,
        _from: OrchestratorState,
        to: OrchestratorState,
    ) {
        metrics::counter!("brook_chat_state_enter_total", "state" => format!("{:?}", to))
            .increment(1);
    }

    fn on_tool_batch(&self, _conversation_id: &SessionId, _round: u32, results: &[ToolResult]) {
        metrics::histogram!("brook_chat_tool_batch_size").record(results.len() as f64);
    }

    fn on_recording_failure(&self, _conversation_id: &SessionId, _round: u32, error: &ChatError) {
        metrics::counter!(
            "brook_chat_recording_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_finalized(&self, _conversation_id: &SessionId, saved: bool, _title: Option<&str>) {
        metrics::counter!("brook_chat_finalized_total", "saved" => saved.to_string())
            .increment(1);
    }

    fn on_title_failure(&self, _conversation_id: &SessionId, error: &ChatError) {
        metrics::counter!(
            "brook_chat_title_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_turn_complete(&self, summary: &TurnSummary, elapsed: Duration) {
        metrics::counter!(
            "brook_chat_turn_success_total",
            "round_limit_reached" => summary.round_limit_reached.to_string()
        )
        .increment(1);
        metrics::histogram!("brook_chat_rounds_per_turn").record(summary.rounds as f64);
        metrics::histogram!("brook_chat_turn_duration_seconds", "status" => "success")
            .record(elapsed.as_secs_f64());

        let total_tokens = summary
            .usage
            .iter()
            .flatten()
            .filter_map(|usage| usage.total_tokens)
            .sum::<u64>();
        metrics::counter!("brook_chat_total_tokens").increment(total_tokens);
    }

    fn on_turn_failure(&self, _conversation_id: &SessionId, error: &ChatError, elapsed: Duration) {
        metrics::counter!(
            "brook_chat_turn_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("brook_chat_turn_duration_seconds", "status" => "failure")
            .record(elapsed.as_secs_f64());
    }
}
