//! The state machine that drives one client-facing turn across provider rounds.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bchat::{ChatEvent, ConversationOrchestrator, OutputFrame, TurnRequest};
//! use bprovider::{
//!     BoxedChunkStream, ModelProvider, ModelRequest, ModelResponse, ProviderError,
//!     ProviderFuture, ProviderId, Turn, VecChunkStream,
//! };
//! use futures_util::StreamExt;
//! use serde_json::json;
//!
//! struct Scripted;
//!
//! impl ModelProvider for Scripted {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::OpenAi
//!     }
//!
//!     fn stream<'a>(
//!         &'a self,
//!         _request: ModelRequest,
//!     ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
//!         Box::pin(async {
//!             let chunks = vec![json!({"choices": [{"delta": {"content": "Hi"}}]})];
//!             Ok(Box::pin(VecChunkStream::from_chunks(chunks)) as BoxedChunkStream<'a>)
//!         })
//!     }
//!
//!     fn complete<'a>(
//!         &'a self,
//!         _request: ModelRequest,
//!     ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
//!         Box::pin(async { Err(ProviderError::unavailable("titles disabled")) })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let orchestrator = ConversationOrchestrator::builder(Arc::new(Scripted)).build();
//! let request = TurnRequest::new("c1", "gpt-4o-mini", vec![Turn::user("hello")]);
//!
//! let frames = orchestrator
//!     .stream_turn(request)
//!     .filter_map(|event| async move { event.frame().cloned() })
//!     .collect::<Vec<_>>()
//!     .await;
//!
//! assert_eq!(frames, vec![OutputFrame::data("<p>Hi</p>\n"), OutputFrame::Close]);
//! # }
//! ```

use std::mem;
use std::sync::Arc;
use std::time::Instant;

use bcommon::{GenerationOptions, MetadataMap, SessionId, deadline_after};
use bprovider::{
    ModelProvider, ModelRequest, RawChunk, RequestBuilder, StreamDecoder, StreamEvent,
    ToolSchema, Turn, UsageRecord,
};
use btooling::{ToolExecutionContext, ToolExecutionRouter, ToolRouter, join_outputs};
use futures_util::StreamExt;
use serde_json::Value;

use crate::{
    ChatError, ChatErrorPhase, ChatEvent, ChatEventStream, ChatPolicy, ChatRuntimeHooks,
    ConversationStore, DisconnectPolicy, FinalizeOutcome, Finalizer, FrameSink,
    InMemoryConversationStore, InMemoryUsageRecorder, MarkdownRenderer, NoopChatRuntimeHooks,
    OrchestratorState, OutputFrame, ReadinessHandle, Renderer, SessionState, TitleGenerator,
    TurnRequest, TurnSummary, UsageEntry, UsageRecorder,
};

#[derive(Clone)]
pub struct ConversationOrchestrator {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRouter>,
    recorder: Arc<dyn UsageRecorder>,
    renderer: Arc<dyn Renderer>,
    finalizer: Finalizer,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatRuntimeHooks>,
}

pub struct ConversationOrchestratorBuilder {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRouter>,
    store: Arc<dyn ConversationStore>,
    recorder: Arc<dyn UsageRecorder>,
    renderer: Arc<dyn Renderer>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatRuntimeHooks>,
}

impl ConversationOrchestratorBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            tools: Arc::new(ToolExecutionRouter::default()),
            store: Arc::new(InMemoryConversationStore::new()),
            recorder: Arc::new(InMemoryUsageRecorder::new()),
            renderer: Arc::new(MarkdownRenderer),
            policy: ChatPolicy::default(),
            hooks: Arc::new(NoopChatRuntimeHooks),
        }
    }

    pub fn tool_router(mut self, tools: Arc<dyn ToolRouter>) -> Self {
        self.tools = tools;
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn recorder(mut self, recorder: Arc<dyn UsageRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> ConversationOrchestrator {
        let mut finalizer = Finalizer::new(self.store, Arc::clone(&self.renderer));
        if self.policy.generate_titles {
            finalizer = finalizer.with_title_generator(TitleGenerator::new(
                Arc::clone(&self.provider),
                Arc::clone(&self.recorder),
                self.policy.title_timeout,
            ));
        }

        ConversationOrchestrator {
            provider: self.provider,
            tools: self.tools,
            recorder: self.recorder,
            renderer: self.renderer,
            finalizer,
            policy: self.policy,
            hooks: self.hooks,
        }
    }
}

impl ConversationOrchestrator {
    pub fn builder(provider: Arc<dyn ModelProvider>) -> ConversationOrchestratorBuilder {
        ConversationOrchestratorBuilder::new(provider)
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    /// Drives the turn and yields frames in chunk-arrival order. Every stream ends with
    /// exactly one `TurnComplete` or `TurnFailed`; dropping it early abandons the round.
    ///
    /// `Close` is yielded as soon as the final round's text is complete. Saving, title
    /// generation and usage recording run after it, so keep polling until `TurnComplete`.
    pub fn stream_turn(&self, request: TurnRequest) -> ChatEventStream<'_> {
        Box::pin(async_stream::stream! {
            let started = Instant::now();
            let TurnRequest {
                conversation_id,
                model,
                mut turns,
                options,
                readiness,
                trace_id,
                metadata,
            } = request;

            self.hooks.on_turn_start(&conversation_id);
            self.await_readiness(&conversation_id, readiness).await;

            let schemas = self.tools.schemas();
            let mut usage_log = Vec::new();
            let mut round = 0_u32;

            loop {
                round += 1;
                let tools_enabled =
                    !schemas.is_empty() && self.policy.tools_enabled_for_round(round);
                let mut session = SessionState::new(round, tools_enabled);
                self.hooks.on_round_start(&conversation_id, round, tools_enabled);
                tracing::debug!(
                    phase = "building",
                    conversation_id = %conversation_id,
                    round,
                    tools_enabled,
                    "starting provider round"
                );

                let (request, payload) =
                    match self.build_request(&model, &turns, options, &schemas, &session, &metadata) {
                        Ok(built) => built,
                        Err(error) => {
                            self.fail(&conversation_id, &mut session, &error, started);
                            yield ChatEvent::Frame(OutputFrame::error(error.message.clone()));
                            yield ChatEvent::TurnFailed(error);
                            return;
                        }
                    };

                let chunks = match self.provider.stream(request).await {
                    Ok(chunks) => chunks,
                    Err(error) => {
                        let error = ChatError::from(error).with_phase(ChatErrorPhase::Building);
                        self.fail(&conversation_id, &mut session, &error, started);
                        yield ChatEvent::Frame(OutputFrame::error(error.message.clone()));
                        yield ChatEvent::TurnFailed(error);
                        return;
                    }
                };

                self.advance(&conversation_id, &mut session, OrchestratorState::Streaming);
                let mut decoder = StreamDecoder::new(chunks);
                let mut usage = None;
                let mut transport_error = None;

                while let Some(event) = decoder.next().await {
                    match event {
                        Ok(StreamEvent::TextDelta(text)) => {
                            session.buffer.push_str(&text);
                            yield ChatEvent::Frame(OutputFrame::data(
                                self.renderer.render(&session.buffer),
                            ));
                        }
                        Ok(StreamEvent::ToolCallDelta(delta)) => session.accumulator.push(&delta),
                        Ok(StreamEvent::StreamEnd(end_usage)) => usage = end_usage,
                        Err(error) => {
                            transport_error = Some(error);
                            break;
                        }
                    }
                }

                let raw_chunks = decoder.into_raw_chunks();

                if let Some(error) = transport_error {
                    self.record_round(&conversation_id, round, payload, raw_chunks, None)
                        .await;
                    let error = ChatError::from(error).with_phase(ChatErrorPhase::Streaming);
                    self.fail(&conversation_id, &mut session, &error, started);
                    yield ChatEvent::Frame(OutputFrame::error(error.message.clone()));
                    yield ChatEvent::TurnFailed(error);
                    return;
                }

                usage_log.push(usage.clone());
                self.advance(&conversation_id, &mut session, OrchestratorState::Aggregating);
                let calls = mem::take(&mut session.accumulator).finish();

                let round_limit_reached = !calls.is_empty() && round >= self.policy.max_rounds;
                if round_limit_reached {
                    tracing::warn!(
                        event = "round_limit_reached",
                        conversation_id = %conversation_id,
                        round,
                        max_rounds = self.policy.max_rounds,
                        pending_calls = calls.len(),
                        "tool calls ignored; finalizing with the current buffer"
                    );
                }

                if calls.is_empty() || round_limit_reached {
                    // Persistence and the title call run after the client is released.
                    yield ChatEvent::Frame(OutputFrame::Close);
                    self.advance(&conversation_id, &mut session, OrchestratorState::Finalizing);
                    let outcome = self
                        .finalize(&conversation_id, &model, &session.buffer, &turns)
                        .await;
                    self.record_round(&conversation_id, round, payload, raw_chunks, usage)
                        .await;

                    let summary = self.complete(
                        &conversation_id,
                        &mut session,
                        outcome,
                        usage_log,
                        round_limit_reached,
                        started,
                    );
                    yield ChatEvent::TurnComplete(summary);
                    return;
                }

                self.record_round(&conversation_id, round, payload, raw_chunks, usage)
                    .await;
                self.advance(&conversation_id, &mut session, OrchestratorState::Executing);

                let mut context = ToolExecutionContext::new(conversation_id.clone()).with_round(round);
                context.trace_id = trace_id.clone();
                context.metadata = metadata.clone();

                let results = self.tools.invoke_batch(calls, &context).await;

                self.hooks.on_tool_batch(&conversation_id, round, &results);
                let reinjected = join_outputs(&results);
                yield ChatEvent::ToolResults { round, results };

                match reinjected {
                    Some(text) => {
                        turns.push(Turn::system(text));
                        self.advance(&conversation_id, &mut session, OrchestratorState::Building);
                    }
                    None => {
                        // Nothing to report back, so another round would repeat this one.
                        yield ChatEvent::Frame(OutputFrame::Close);
                        self.advance(&conversation_id, &mut session, OrchestratorState::Finalizing);
                        let outcome = self
                            .finalize(&conversation_id, &model, &session.buffer, &turns)
                            .await;
                        let summary = self.complete(
                            &conversation_id,
                            &mut session,
                            outcome,
                            usage_log,
                            false,
                            started,
                        );
                        yield ChatEvent::TurnComplete(summary);
                        return;
                    }
                }
            }
        })
    }

    /// Pushes the turn's frames into `sink` and returns the summary. A closed sink is
    /// handled according to [`ChatPolicy::on_disconnect`].
    pub async fn run_turn(
        &self,
        request: TurnRequest,
        sink: &dyn FrameSink,
    ) -> Result<TurnSummary, ChatError> {
        let conversation_id = request.conversation_id.clone();
        let mut events = self.stream_turn(request);
        let mut connected = true;

        while let Some(event) = events.next().await {
            match event {
                ChatEvent::Frame(frame) => {
                    let closing = frame.is_terminal();
                    if !connected || sink.send(frame).await.is_ok() {
                        continue;
                    }
                    if closing {
                        // The round is already complete; only its bookkeeping remains.
                        connected = false;
                        continue;
                    }

                    match self.policy.on_disconnect {
                        DisconnectPolicy::AbortRound => {
                            tracing::info!(
                                event = "client_disconnected",
                                conversation_id = %conversation_id,
                                policy = "abort_round",
                                "dropping the in-flight round"
                            );
                            return Err(ChatError::cancelled("client disconnected")
                                .with_phase(ChatErrorPhase::Streaming));
                        }
                        DisconnectPolicy::CompleteRound => {
                            tracing::info!(
                                event = "client_disconnected",
                                conversation_id = %conversation_id,
                                policy = "complete_round",
                                "draining the round without a client"
                            );
                            connected = false;
                        }
                    }
                }
                ChatEvent::ToolResults { .. } => {}
                ChatEvent::TurnComplete(summary) => return Ok(summary),
                ChatEvent::TurnFailed(error) => return Err(error),
            }
        }

        Err(ChatError::cancelled("turn ended without a terminal event"))
    }

    async fn await_readiness(&self, conversation_id: &SessionId, handles: Vec<ReadinessHandle>) {
        let deadline = deadline_after(self.policy.readiness_timeout);

        for handle in handles {
            let label = handle.label().to_string();
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.policy.readiness_timeout,
            };
            if let Err(error) = handle.wait(remaining).await {
                tracing::warn!(
                    event = "readiness_failed",
                    conversation_id = %conversation_id,
                    label = %label,
                    error = %error,
                    "proceeding without background work"
                );
            }
        }
    }

    fn build_request(
        &self,
        model: &str,
        turns: &[Turn],
        options: GenerationOptions,
        schemas: &[ToolSchema],
        session: &SessionState,
        metadata: &MetadataMap,
    ) -> Result<(ModelRequest, Value), ChatError> {
        let mut builder = RequestBuilder::new(self.provider.id(), model)
            .turns(turns.iter().cloned())
            .options(options)
            .streaming(true);

        if session.tools_enabled {
            builder = builder
                .tools(schemas.to_vec())
                .force_tool_use(self.policy.force_tool_for_round(session.round));
        }

        for (key, value) in metadata {
            builder = builder.metadata(key.clone(), value.clone());
        }

        let request = builder
            .build()
            .map_err(|error| ChatError::from(error).with_phase(ChatErrorPhase::Building))?;
        let payload = request
            .payload()
            .map_err(|error| ChatError::from(error).with_phase(ChatErrorPhase::Building))?;

        Ok((request, payload))
    }

    async fn record_round(
        &self,
        conversation_id: &SessionId,
        round: u32,
        payload: Value,
        chunks: Vec<RawChunk>,
        usage: Option<UsageRecord>,
    ) {
        let entry = UsageEntry::for_round(conversation_id.clone(), round, payload, chunks, usage);

        if let Err(error) = self.recorder.record(entry).await {
            let error = error.with_phase(ChatErrorPhase::Recording);
            tracing::warn!(
                event = "usage_record_failed",
                conversation_id = %conversation_id,
                round,
                error = %error,
                "round usage was not recorded"
            );
            self.hooks.on_recording_failure(conversation_id, round, &error);
        }
    }

    async fn finalize(
        &self,
        conversation_id: &SessionId,
        model: &str,
        raw_text: &str,
        turns: &[Turn],
    ) -> FinalizeOutcome {
        let outcome = self
            .finalizer
            .finalize(conversation_id, model, raw_text, turns)
            .await;

        if let Some(error) = &outcome.title_error {
            self.hooks.on_title_failure(conversation_id, error);
        }
        self.hooks
            .on_finalized(conversation_id, outcome.saved, outcome.title.as_deref());
        outcome
    }

    fn complete(
        &self,
        conversation_id: &SessionId,
        session: &mut SessionState,
        outcome: FinalizeOutcome,
        usage: Vec<Option<UsageRecord>>,
        round_limit_reached: bool,
        started: Instant,
    ) -> TurnSummary {
        self.advance(conversation_id, session, OrchestratorState::Done);

        let summary = TurnSummary {
            conversation_id: conversation_id.clone(),
            rounds: session.round,
            final_text: mem::take(&mut session.buffer),
            rendered: outcome.rendered,
            usage,
            round_limit_reached,
            title: outcome.title,
            message_saved: outcome.saved,
        };

        tracing::info!(
            event = "turn_complete",
            conversation_id = %conversation_id,
            rounds = summary.rounds,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn finished"
        );
        self.hooks.on_turn_complete(&summary, started.elapsed());
        summary
    }

    fn fail(
        &self,
        conversation_id: &SessionId,
        session: &mut SessionState,
        error: &ChatError,
        started: Instant,
    ) {
        self.advance(conversation_id, session, OrchestratorState::Failed);
        tracing::error!(
            event = "turn_failed",
            conversation_id = %conversation_id,
            round = session.round,
            error = %error,
            "turn aborted"
        );
        self.hooks
            .on_turn_failure(conversation_id, error, started.elapsed());
    }

    fn advance(
        &self,
        conversation_id: &SessionId,
        session: &mut SessionState,
        next: OrchestratorState,
    ) {
        let previous = session.transition(next);
        tracing::trace!(
            conversation_id = %conversation_id,
            round = session.round,
            from = %previous,
            to = %next,
            "orchestrator state change"
        );
        self.hooks
            .on_state_change(conversation_id, session.round, previous, next);
    }
}

