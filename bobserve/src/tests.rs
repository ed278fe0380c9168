use std::sync::{Arc, Mutex};
use std::time::Duration;

use bchat::{
    ChatError, ChatEvent, ChatPolicy, ChatRuntimeHooks, ConversationOrchestrator,
    OrchestratorState, OutputFrame, TurnRequest, TurnSummary,
};
use bcommon::SessionId;
use bprovider::{
    BoxedChunkStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, ProviderOperationHooks, Turn, UsageRecord, VecChunkStream,
};
use btooling::{
    ToolArgumentParseError, ToolArguments, ToolCall, ToolError, ToolExecutionContext, ToolResult,
    ToolRuntimeHooks,
};
use futures_util::StreamExt;
use serde_json::json;

use crate::{
    MetricsObservabilityHooks, SafeChatHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("call-1", "get_file_text", ToolArguments::new())
}

fn sample_tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new("conversation-1")
        .with_trace_id("trace-1")
        .with_round(2)
}

fn sample_result() -> ToolResult {
    ToolResult::from_call(&sample_tool_call(), Some("ok".to_string()))
}

fn sample_parse_error() -> ToolArgumentParseError {
    ToolArgumentParseError {
        index: 0,
        tool_call_id: "call-2".to_string(),
        function_name: Some("get_file_text".to_string()),
        raw_arguments: "{\"context_file_id\":".to_string(),
        message: "EOF while parsing".to_string(),
    }
}

fn sample_summary() -> TurnSummary {
    TurnSummary {
        conversation_id: SessionId::from("conversation-1"),
        rounds: 2,
        final_text: "Hello".to_string(),
        rendered: "<p>Hello</p>\n".to_string(),
        usage: vec![Some(UsageRecord::new(9, 2)), None],
        round_limit_reached: false,
        title: Some("Greetings".to_string()),
        message_saved: true,
    }
}

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let provider_error = ProviderError::timeout("provider timeout");

    hooks.on_attempt_start(ProviderId::OpenAi, "stream", 1);
    hooks.on_retry_scheduled(
        ProviderId::OpenAi,
        "stream",
        1,
        Duration::from_millis(10),
        &provider_error,
    );
    hooks.on_success(ProviderId::OpenAi, "stream", 2);
    hooks.on_failure(ProviderId::Mistral, "complete", 2, &provider_error);
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    let tool_error = ToolError::execution("tool failed");

    hooks.on_execution_start(&sample_tool_call(), &sample_tool_context());
    hooks.on_execution_success(
        &sample_tool_call(),
        &sample_tool_context(),
        &sample_result(),
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        &sample_tool_call(),
        &sample_tool_context(),
        &tool_error,
        Duration::from_millis(20),
    );
    hooks.on_arguments_rejected(&sample_parse_error(), &sample_tool_context());
}

fn exercise_chat_hooks(hooks: &dyn ChatRuntimeHooks) {
    let conversation = SessionId::from("conversation-1");
    let chat_error = ChatError::store("disk full");

    hooks.on_turn_start(&conversation);
    hooks.on_round_start(&conversation, 1, true);
    hooks.on_state_change(
        &conversation,
        1,
        OrchestratorState::Building,
        OrchestratorState::Streaming,
    );
    hooks.on_tool_batch(&conversation, 1, &[sample_result()]);
    hooks.on_recording_failure(&conversation, 1, &chat_error);
    hooks.on_finalized(&conversation, true, Some("Greetings"));
    hooks.on_title_failure(&conversation, &chat_error);
    hooks.on_turn_complete(&sample_summary(), Duration::from_millis(30));
    hooks.on_turn_failure(&conversation, &chat_error, Duration::from_millis(30));
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;

    exercise_provider_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_hooks(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;

    exercise_provider_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_hooks(&hooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }

    fn count(&self) -> usize {
        self.events.lock().expect("events lock").len()
    }
}

impl ProviderOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        self.push("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        self.push("retry_scheduled");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {
        self.push("success");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        self.push("failure");
    }
}

impl ToolRuntimeHooks for RecordingHooks {
    fn on_execution_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push("start");
    }

    fn on_execution_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        _elapsed: Duration,
    ) {
        self.push("success");
    }

    fn on_execution_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }

    fn on_arguments_rejected(
        &self,
        _error: &ToolArgumentParseError,
        _context: &ToolExecutionContext,
    ) {
        self.push("rejected");
    }
}

impl ChatRuntimeHooks for RecordingHooks {
    fn on_turn_start(&self, _conversation_id: &SessionId) {
        self.push("turn_start");
    }

    fn on_round_start(&self, _conversation_id: &SessionId, _round: u32, _tools_enabled: bool) {
        self.push("round_start");
    }

    fn on_state_change(
        &self,
        _conversation_id: &SessionId,
        _round: u32,
        _from: OrchestratorState,
        _to: OrchestratorState,
    ) {
        self.push("state_change");
    }

    fn on_tool_batch(&self, _conversation_id: &SessionId, _round: u32, _results: &[ToolResult]) {
        self.push("tool_batch");
    }

    fn on_recording_failure(&self, _conversation_id: &SessionId, _round: u32, _error: &ChatError) {
        self.push("recording_failure");
    }

    fn on_finalized(&self, _conversation_id: &SessionId, _saved: bool, _title: Option<&str>) {
        self.push("finalized");
    }

    fn on_title_failure(&self, _conversation_id: &SessionId, _error: &ChatError) {
        self.push("title_failure");
    }

    fn on_turn_complete(&self, _summary: &TurnSummary, _elapsed: Duration) {
        self.push("turn_complete");
    }

    fn on_turn_failure(&self, _conversation_id: &SessionId, _error: &ChatError, _elapsed: Duration) {
        self.push("turn_failure");
    }
}

struct PanicHooks;

impl ProviderOperationHooks for PanicHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {
        panic!("success panic");
    }
}

impl ToolRuntimeHooks for PanicHooks {
    fn on_execution_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_arguments_rejected(
        &self,
        _error: &ToolArgumentParseError,
        _context: &ToolExecutionContext,
    ) {
        panic!("rejected panic");
    }
}

impl ChatRuntimeHooks for PanicHooks {
    fn on_turn_start(&self, _conversation_id: &SessionId) {
        panic!("turn_start panic");
    }

    fn on_state_change(
        &self,
        _conversation_id: &SessionId,
        _round: u32,
        _from: OrchestratorState,
        _to: OrchestratorState,
    ) {
        panic!("state_change panic");
    }

    fn on_turn_complete(&self, _summary: &TurnSummary, _elapsed: Duration) {
        panic!("turn_complete panic");
    }
}

#[test]
fn safe_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();

    exercise_provider_hooks(&SafeProviderHooks::new(inner.clone()));
    assert_eq!(inner.count(), 4);

    exercise_tool_hooks(&SafeToolHooks::new(inner.clone()));
    assert_eq!(inner.count(), 8);

    exercise_chat_hooks(&SafeChatHooks::new(inner.clone()));
    assert_eq!(inner.count(), 17);
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(PanicHooks));
    exercise_tool_hooks(&SafeToolHooks::new(PanicHooks));
    exercise_chat_hooks(&SafeChatHooks::new(PanicHooks));
}

struct SingleReplyProvider;

impl ModelProvider for SingleReplyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn stream<'a>(
        &'a self,
        _request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let chunks = vec![json!({"choices": [{"delta": {"content": "Hi"}}]})];
            Ok(Box::pin(VecChunkStream::from_chunks(chunks)) as BoxedChunkStream<'a>)
        })
    }

    fn complete<'a>(
        &'a self,
        _request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move { Err(ProviderError::unavailable("not scripted")) })
    }
}

#[tokio::test]
async fn panicking_chat_hooks_do_not_interrupt_a_turn() {
    let orchestrator = ConversationOrchestrator::builder(Arc::new(SingleReplyProvider))
        .policy(ChatPolicy::default().with_title_generation(false))
        .hooks(Arc::new(SafeChatHooks::new(PanicHooks)))
        .build();

    let request = TurnRequest::new(
        "conversation-1",
        "gpt-4o-mini",
        vec![Turn::system("You are a helpful assistant!"), Turn::user("hi")],
    );
    let events = orchestrator.stream_turn(request).collect::<Vec<_>>().await;

    let frames = events
        .iter()
        .filter_map(|event| event.frame().cloned())
        .collect::<Vec<_>>();
    assert_eq!(
        frames,
        vec![OutputFrame::data("<p>Hi</p>\n"), OutputFrame::Close]
    );
    assert!(matches!(events.last(), Some(ChatEvent::TurnComplete(_))));
}
