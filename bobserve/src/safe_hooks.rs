//! Wrappers that keep a panicking hook from taking down a turn.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use bchat::{ChatError, ChatRuntimeHooks, OrchestratorState, TurnSummary};
use bcommon::SessionId;
use bprovider::{ProviderError, ProviderId, ProviderOperationHooks};
use btooling::{
    ToolArgumentParseError, ToolCall, ToolError, ToolExecutionContext, ToolResult,
    ToolRuntimeHooks,
};

fn guarded(hook: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(hook)).is_err() {
        tracing::warn!("observability hook panicked; event dropped");
    }
}

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        guarded(|| self.inner.on_attempt_start(provider, operation, attempt));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        guarded(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        });
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        guarded(|| self.inner.on_success(provider, operation, attempts));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        guarded(|| self.inner.on_failure(provider, operation, attempts, error));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        guarded(|| self.inner.on_execution_start(tool_call, context));
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        });
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        });
    }

    fn on_arguments_rejected(&self, error: &ToolArgumentParseError, context: &ToolExecutionContext) {
        guarded(|| self.inner.on_arguments_rejected(error, context));
    }
}

pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatRuntimeHooks for SafeChatHooks<H>
where
    H: ChatRuntimeHooks,
{
    fn on_turn_start(&self, conversation_id: &SessionId) {
        guarded(|| self.inner.on_turn_start(conversation_id));
    }

    fn on_round_start(&self, conversation_id: &SessionId, round: u32, tools_enabled: bool) {
        guarded(|| self.inner.on_round_start(conversation_id, round, tools_enabled));
    }

    fn on_state_change(
        &self,
        conversation_id: &SessionId,
        round: u32,
        from: OrchestratorState,
        to: OrchestratorState,
    ) {
        guarded(|| self.inner.on_state_change(conversation_id, round, from, to));
    }

    fn on_tool_batch(&self, conversation_id: &SessionId, round: u32, results: &[ToolResult]) {
        guarded(|| self.inner.on_tool_batch(conversation_id, round, results));
    }

    fn on_recording_failure(&self, conversation_id: &SessionId, round: u32, error: &ChatError) {
        guarded(|| self.inner.on_recording_failure(conversation_id, round, error));
    }

    fn on_finalized(&self, conversation_id: &SessionId, saved: bool, title: Option<&str>) {
        guarded(|| self.inner.on_finalized(conversation_id, saved, title));
    }

    fn on_title_failure(&self, conversation_id: &SessionId, error: &ChatError) {
        guarded(|| self.inner.on_title_failure(conversation_id, error));
    }

    fn on_turn_complete(&self, summary: &TurnSummary, elapsed: Duration) {
        guarded(|| self.inner.on_turn_complete(summary, elapsed));
    }

    fn on_turn_failure(&self, conversation_id: &SessionId, error: &ChatError, elapsed: Duration) {
        guarded(|| self.inner.on_turn_failure(conversation_id, error, elapsed));
    }
}
