use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bchat::prelude::*;
use bchat::{ReadinessHandle, UsageKind, readiness};
use bprovider::{
    BoxedChunkStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, RawChunk, Role, ToolChoice, ToolSchema, Turn, UsageRecord, VecChunkStream,
};
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;

type Round = Result<Vec<Result<RawChunk, ProviderError>>, ProviderError>;

struct ScriptedProvider {
    rounds: Mutex<VecDeque<Round>>,
    requests: Mutex<Vec<ModelRequest>>,
    title: Result<String, ProviderError>,
}

impl ScriptedProvider {
    fn new(rounds: Vec<Round>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            requests: Mutex::new(Vec::new()),
            title: Err(ProviderError::unavailable("no title scripted")),
        }
    }

    fn with_title(mut self, title: &str) -> Self {
        self.title = Ok(title.to_string());
        self
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let round = self
                .rounds
                .lock()
                .expect("rounds lock")
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::other("no round scripted")))?;
            Ok(Box::pin(VecChunkStream::new(round)) as BoxedChunkStream<'a>)
        })
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let text = self.title.clone()?;
            Ok(ModelResponse {
                model: "gpt-4o-mini".to_string(),
                raw: json!({"choices": [{"message": {"role": "assistant", "content": text}}]}),
                text,
                usage: Some(UsageRecord::new(20, 4)),
            })
        })
    }
}

fn text(content: &str) -> Result<RawChunk, ProviderError> {
    Ok(json!({"choices": [{"delta": {"content": content}}]}))
}

fn tool_delta(
    index: u32,
    id: Option<&str>,
    name: Option<&str>,
    arguments: &str,
) -> Result<RawChunk, ProviderError> {
    Ok(json!({
        "choices": [{"delta": {"tool_calls": [{
            "index": index,
            "id": id,
            "function": {"name": name, "arguments": arguments}
        }]}}]
    }))
}

fn usage(prompt: u64, completion: u64) -> Result<RawChunk, ProviderError> {
    Ok(json!({
        "choices": [],
        "usage": {
            "prompt_tokens": prompt,
            "completion_tokens": completion,
            "total_tokens": prompt + completion
        }
    }))
}

fn file_tool_registry(calls: Arc<Mutex<Vec<Value>>>) -> Arc<ToolExecutionRouter> {
    let mut registry = ToolRegistry::new();
    registry.register_sync_fn(
        ToolSchema::function(
            "get_file_text",
            "Get the full text of a given context file based on the context_file_id.",
            json!({
                "type": "object",
                "properties": {"context_file_id": {"type": "integer"}},
                "required": ["context_file_id"]
            }),
        ),
        move |arguments, _context| {
            calls
                .lock()
                .expect("calls lock")
                .push(Value::Object(arguments));
            Ok(Some("quarterly budget: 10k".to_string()))
        },
    );
    Arc::new(ToolExecutionRouter::new(Arc::new(registry)))
}

fn quiet_policy() -> ChatPolicy {
    ChatPolicy::default().with_title_generation(false)
}

fn request() -> TurnRequest {
    TurnRequest::new(
        "conversation-1",
        "gpt-4o-mini",
        vec![
            Turn::system("You are a helpful assistant!"),
            Turn::user("hi"),
        ],
    )
}

async fn collect(orchestrator: &ConversationOrchestrator, request: TurnRequest) -> Vec<ChatEvent> {
    orchestrator.stream_turn(request).collect().await
}

fn frames(events: &[ChatEvent]) -> Vec<OutputFrame> {
    events
        .iter()
        .filter_map(|event| event.frame().cloned())
        .collect()
}

#[tokio::test]
async fn each_text_delta_emits_the_full_rendered_buffer() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
        text("Hel"),
        text("lo"),
        usage(9, 2),
    ])]));
    let store = Arc::new(InMemoryConversationStore::new());
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .store(store.clone())
        .recorder(recorder.clone())
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;

    assert_eq!(
        frames(&events),
        vec![
            OutputFrame::data("<p>Hel</p>\n"),
            OutputFrame::data("<p>Hello</p>\n"),
            OutputFrame::Close,
        ]
    );

    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert_eq!(summary.final_text, "Hello");
    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.usage, vec![Some(UsageRecord::new(9, 2))]);

    let saved = store
        .messages(&SessionId::from("conversation-1"))
        .expect("messages");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].raw_text, "Hello");
    assert_eq!(saved[0].rendered, "<p>Hello</p>\n");

    let entries = recorder.entries().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, UsageKind::Round);
    assert_eq!(entries[0].response.as_array().map(Vec::len), Some(3));
    assert_eq!(entries[0].payload["stream_options"]["include_usage"], true);
    assert_eq!(entries[0].total_tokens(), Some(11));
    assert!(entries[0].payload.get("tools").is_none());
}

#[tokio::test]
async fn fragmented_tool_call_is_reassembled_and_reinjected_as_system_turn() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(vec![
            tool_delta(0, Some("call_a"), Some("get_file_text"), ""),
            tool_delta(0, None, None, "{\"context_file_id\""),
            tool_delta(0, None, None, ": 1}"),
        ]),
        Ok(vec![text("The budget is 10k.")]),
    ]));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(calls.clone()))
        .recorder(recorder.clone())
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;

    assert_eq!(
        calls.lock().expect("calls lock").as_slice(),
        &[json!({"context_file_id": 1})]
    );
    assert_eq!(
        frames(&events),
        vec![
            OutputFrame::data("<p>The budget is 10k.</p>\n"),
            OutputFrame::Close
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    assert_eq!(requests[0].tools.len(), 1);
    assert!(requests[1].tools.is_empty());
    assert_eq!(requests[1].tool_choice, None);

    let injected = requests[1].turns.last().expect("synthetic turn");
    assert_eq!(injected.role, Role::System);
    assert_eq!(
        injected.content,
        "Response for get_file_text with args {\"context_file_id\":1}: quarterly budget: 10k"
    );

    assert!(events.iter().any(|event| matches!(
        event,
        ChatEvent::ToolResults { round: 1, results } if results.len() == 1
    )));
    assert_eq!(recorder.entries().expect("entries").len(), 2);
}

#[tokio::test]
async fn malformed_arguments_fail_only_their_own_call() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(vec![
            tool_delta(1, Some("call_b"), Some("get_file_text"), "{\"context_file_id\": 2}"),
            tool_delta(0, Some("call_a"), Some("get_file_text"), "{oops"),
        ]),
        Ok(vec![text("done")]),
    ]));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(calls.clone()))
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;
    assert!(matches!(events.last(), Some(ChatEvent::TurnComplete(_))));
    assert_eq!(calls.lock().expect("calls lock").len(), 1);

    let requests = provider.requests();
    let injected = &requests[1].turns.last().expect("synthetic turn").content;
    let lines = injected.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("error invoking 'get_file_text': invalid arguments:"));
    assert_eq!(
        lines[1],
        "Response for get_file_text with args {\"context_file_id\":2}: quarterly budget: 10k"
    );
}

#[tokio::test]
async fn unknown_tools_are_reported_in_band() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(vec![tool_delta(0, Some("call_a"), Some("delete_everything"), "{}")]),
        Ok(vec![text("I cannot do that.")]),
    ]));
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(Arc::new(Mutex::new(Vec::new()))))
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;
    assert!(matches!(events.last(), Some(ChatEvent::TurnComplete(_))));

    let requests = provider.requests();
    assert_eq!(
        requests[1].turns.last().map(|turn| turn.content.as_str()),
        Some("tool 'delete_everything' not found")
    );
}

#[tokio::test]
async fn round_cap_finalizes_instead_of_executing() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
        text("Let me check."),
        tool_delta(0, Some("call_a"), Some("get_file_text"), "{\"context_file_id\": 1}"),
    ])]));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(calls.clone()))
        .store(store.clone())
        .policy(quiet_policy().with_max_rounds(1))
        .build();

    let events = collect(&orchestrator, request()).await;

    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert!(summary.round_limit_reached);
    assert_eq!(summary.final_text, "Let me check.");
    assert!(calls.lock().expect("calls lock").is_empty());
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(
        store
            .messages(&SessionId::from("conversation-1"))
            .expect("messages")[0]
            .raw_text,
        "Let me check."
    );
}

#[tokio::test]
async fn multi_round_policy_keeps_tools_attached_and_forces_first_round() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(vec![tool_delta(0, Some("call_a"), Some("get_file_text"), "{\"context_file_id\": 1}")]),
        Ok(vec![text("ok")]),
    ]));
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(Arc::new(Mutex::new(Vec::new()))))
        .policy(
            quiet_policy()
                .with_multi_round_tools(true)
                .with_force_tool_first_round(true),
        )
        .build();

    collect(&orchestrator, request()).await;

    let requests = provider.requests();
    assert_eq!(requests[0].tool_choice, Some(ToolChoice::Required));
    assert_eq!(requests[1].tool_choice, Some(ToolChoice::Auto));
    assert_eq!(requests[1].tools.len(), 1);
}

#[tokio::test]
async fn dispatch_failure_emits_one_error_frame_and_persists_nothing() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(
        ProviderError::authentication("invalid api key"),
    )]));
    let store = Arc::new(InMemoryConversationStore::new());
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider)
        .store(store.clone())
        .recorder(recorder.clone())
        .build();

    let events = collect(&orchestrator, request()).await;

    assert_eq!(frames(&events), vec![OutputFrame::error("invalid api key")]);
    let Some(ChatEvent::TurnFailed(error)) = events.last() else {
        panic!("turn should fail: {events:?}");
    };
    assert_eq!(error.kind, ChatErrorKind::Provider);
    assert_eq!(error.phase, Some(ChatErrorPhase::Building));
    assert!(
        store
            .messages(&SessionId::from("conversation-1"))
            .expect("messages")
            .is_empty()
    );
    assert!(recorder.entries().expect("entries").is_empty());
}

#[tokio::test]
async fn mid_stream_transport_error_records_attempt_but_saves_no_content() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
        text("Hel"),
        Err(ProviderError::transport("connection reset")),
        text("never seen"),
    ])]));
    let store = Arc::new(InMemoryConversationStore::new());
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider)
        .store(store.clone())
        .recorder(recorder.clone())
        .build();

    let events = collect(&orchestrator, request()).await;

    assert_eq!(
        frames(&events),
        vec![
            OutputFrame::data("<p>Hel</p>\n"),
            OutputFrame::error("connection reset")
        ]
    );
    assert!(
        store
            .messages(&SessionId::from("conversation-1"))
            .expect("messages")
            .is_empty()
    );

    let entries = recorder.entries().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].usage, None);
    assert_eq!(entries[0].response.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn malformed_chunks_are_skipped_but_kept_for_recording() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
        text("A"),
        Ok(json!({"choices": "not-a-list"})),
        text("B"),
    ])]));
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider)
        .recorder(recorder.clone())
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;

    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert_eq!(summary.final_text, "AB");
    assert_eq!(summary.usage, vec![None]);
    assert_eq!(
        recorder.entries().expect("entries")[0]
            .response
            .as_array()
            .map(Vec::len),
        Some(3)
    );
}

#[tokio::test]
async fn untitled_conversation_gets_a_recorded_title() {
    let provider = Arc::new(
        ScriptedProvider::new(vec![Ok(vec![text("Hello")])]).with_title("\"Friendly greeting\""),
    );
    let store = Arc::new(InMemoryConversationStore::new());
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .store(store.clone())
        .recorder(recorder.clone())
        .build();

    let events = collect(&orchestrator, request()).await;

    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert_eq!(summary.title.as_deref(), Some("Friendly greeting"));
    assert_eq!(
        store
            .title(&SessionId::from("conversation-1"))
            .await
            .expect("title"),
        Some("Friendly greeting".to_string())
    );

    let kinds = recorder
        .entries()
        .expect("entries")
        .into_iter()
        .map(|entry| entry.kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![UsageKind::Title, UsageKind::Round]);

    let title_request = &provider.requests()[1];
    assert!(!title_request.is_streaming());
    assert!(
        title_request.turns[0]
            .content
            .starts_with("Based on this message, what name would you give to this chat?")
    );
}

#[tokio::test]
async fn abort_policy_stops_when_the_client_goes_away() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![text("Hel"), text("lo")])]));
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = ConversationOrchestrator::builder(provider)
        .store(store.clone())
        .policy(quiet_policy().with_disconnect_policy(DisconnectPolicy::AbortRound))
        .build();

    let (sender, receiver) = mpsc::channel(8);
    drop(receiver);

    let error = orchestrator
        .run_turn(request(), &sender)
        .await
        .expect_err("turn should be cancelled");
    assert_eq!(error.kind, ChatErrorKind::Cancelled);
    assert!(
        store
            .messages(&SessionId::from("conversation-1"))
            .expect("messages")
            .is_empty()
    );
}

#[tokio::test]
async fn complete_policy_finishes_the_round_without_a_client() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![text("Hel"), text("lo")])]));
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = ConversationOrchestrator::builder(provider)
        .store(store.clone())
        .policy(quiet_policy())
        .build();

    let (sender, receiver) = mpsc::channel(8);
    drop(receiver);

    let summary = orchestrator
        .run_turn(request(), &sender)
        .await
        .expect("round completes");
    assert_eq!(summary.final_text, "Hello");
    assert!(summary.message_saved);
}

#[tokio::test]
async fn run_turn_delivers_frames_to_a_live_sink() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![text("Hi")])]));
    let orchestrator = ConversationOrchestrator::builder(provider)
        .policy(quiet_policy())
        .build();

    let (sender, mut receiver) = mpsc::channel(8);
    orchestrator
        .run_turn(request(), &sender)
        .await
        .expect("turn completes");
    drop(sender);

    let mut encoded = String::new();
    while let Some(frame) = receiver.recv().await {
        encoded.push_str(&frame.encode());
    }
    assert_eq!(
        encoded,
        "data: {\"text\":\"<p>Hi</p>\\n\"}\n\nevent: close\n\n"
    );
}

#[tokio::test]
async fn first_round_waits_for_document_readiness() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![text("ready")])]));
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .policy(quiet_policy())
        .build();

    let (signal, handle) = readiness("report.pdf");
    let (abandoned, slow) = readiness("slow.pdf");
    drop(abandoned);

    let marker = tokio::spawn(async move {
        futures_timer::Delay::new(Duration::from_millis(20)).await;
        signal.mark_ready();
    });

    let events = collect(
        &orchestrator,
        request().await_ready(handle).await_ready(slow),
    )
    .await;
    marker.await.expect("marker task");

    assert!(matches!(events.last(), Some(ChatEvent::TurnComplete(_))));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn interleaved_calls_run_and_report_in_index_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(vec![
            tool_delta(1, Some("call_b"), Some("get_file_text"), "{\"context_file_id\""),
            tool_delta(0, Some("call_a"), Some("get_file_text"), "{\"context_file_id\""),
            tool_delta(1, None, None, ": 2}"),
            tool_delta(0, None, None, ": 1}"),
        ]),
        Ok(vec![text("Both files read.")]),
    ]));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(file_tool_registry(calls.clone()))
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;
    assert!(matches!(events.last(), Some(ChatEvent::TurnComplete(_))));

    assert_eq!(
        calls.lock().expect("calls lock").as_slice(),
        &[json!({"context_file_id": 1}), json!({"context_file_id": 2})]
    );

    let ids = events
        .iter()
        .find_map(|event| match event {
            ChatEvent::ToolResults { results, .. } => Some(
                results
                    .iter()
                    .map(|result| result.tool_call_id.clone())
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        })
        .expect("tool results event");
    assert_eq!(ids, vec!["call_a".to_string(), "call_b".to_string()]);

    let requests = provider.requests();
    assert_eq!(
        requests[1].turns.last().expect("synthetic turn").content,
        "Response for get_file_text with args {\"context_file_id\":1}: quarterly budget: 10k\n\
         Response for get_file_text with args {\"context_file_id\":2}: quarterly budget: 10k"
    );
}

#[tokio::test]
async fn batch_without_output_finalizes_without_another_round() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![tool_delta(
        0,
        Some("call_a"),
        Some("mark_read"),
        "{}",
    )])]));
    let mut registry = ToolRegistry::new();
    registry.register_sync_fn(
        ToolSchema::function("mark_read", "Marks the conversation as read.", json!({"type": "object"})),
        |_, _| Ok(None),
    );
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .tool_router(Arc::new(ToolExecutionRouter::new(Arc::new(registry))))
        .store(store.clone())
        .policy(quiet_policy())
        .build();

    let events = collect(&orchestrator, request()).await;

    assert_eq!(provider.requests().len(), 1);
    assert_eq!(frames(&events), vec![OutputFrame::Close]);
    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert_eq!(summary.rounds, 1);
    assert!(summary.message_saved);
    assert_eq!(
        store
            .messages(&SessionId::from("conversation-1"))
            .expect("messages")
            .len(),
        1
    );
}

#[tokio::test]
async fn close_reaches_the_client_before_title_and_persistence() {
    let provider = Arc::new(
        ScriptedProvider::new(vec![Ok(vec![text("Hello"), usage(9, 2)])]).with_title("Greeting"),
    );
    let store = Arc::new(InMemoryConversationStore::new());
    let recorder = Arc::new(InMemoryUsageRecorder::new());
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .store(store.clone())
        .recorder(recorder.clone())
        .build();

    let mut events = orchestrator.stream_turn(request());
    let conversation = SessionId::from("conversation-1");

    loop {
        let event = events.next().await.expect("stream ends with a terminal event");
        if event.frame() == Some(&OutputFrame::Close) {
            break;
        }
    }
    assert_eq!(provider.requests().len(), 1);
    assert!(store.messages(&conversation).expect("messages").is_empty());
    assert!(recorder.entries().expect("entries").is_empty());

    let Some(ChatEvent::TurnComplete(summary)) = events.next().await else {
        panic!("turn should complete after close");
    };
    assert_eq!(summary.title.as_deref(), Some("Greeting"));
    assert_eq!(provider.requests().len(), 2);
    assert_eq!(store.messages(&conversation).expect("messages").len(), 1);
    assert_eq!(recorder.entries().expect("entries").len(), 2);
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn unbounded_timeouts_do_not_overflow() {
    let provider = Arc::new(
        ScriptedProvider::new(vec![Ok(vec![text("Hello")])]).with_title("Greeting"),
    );
    let orchestrator = ConversationOrchestrator::builder(provider.clone())
        .policy(
            ChatPolicy::default()
                .with_readiness_timeout(Duration::from_secs(u64::MAX))
                .with_title_timeout(Duration::from_secs(u64::MAX)),
        )
        .build();

    let events = collect(
        &orchestrator,
        request().await_ready(ReadinessHandle::ready("notes.txt")),
    )
    .await;

    let Some(ChatEvent::TurnComplete(summary)) = events.last() else {
        panic!("turn should complete: {events:?}");
    };
    assert_eq!(summary.title.as_deref(), Some("Greeting"));
    assert_eq!(provider.requests().len(), 2);
}
