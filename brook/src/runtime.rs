//! Runtime wiring: memory-backed persistence, observability hooks and the document tool
//! around one [`ConversationOrchestrator`].

use std::sync::Arc;

use bchat::{ChatPolicy, ConversationOrchestrator, ConversationOrchestratorBuilder, TurnRequest};
use bcommon::SessionId;
use bmemory::{
    InMemoryMemoryBackend, MemoryBackend, MemoryConversationStore, MemoryUsageRecorder,
    create_memory_backend,
};
use bobserve::{SafeChatHooks, SafeToolHooks, TracingObservabilityHooks};
use bprovider::ModelProvider;
use btooling::{ToolExecutionRouter, ToolRegistry, ToolRouter};

use crate::{
    BrookError, ConversationMessage, DocumentSource, EngineConfig, GetFileTextTool,
    assemble_turns,
};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub config: EngineConfig,
    pub memory: Arc<dyn MemoryBackend>,
    pub orchestrator: ConversationOrchestrator,
}

impl RuntimeBundle {
    /// A turn request for the configured model, with the history assembled behind the
    /// configured system prompt.
    pub fn turn_request(
        &self,
        conversation_id: impl Into<SessionId>,
        history: &[ConversationMessage],
    ) -> TurnRequest {
        TurnRequest::new(
            conversation_id,
            self.config.model.clone(),
            assemble_turns(&self.config.system_prompt, history),
        )
        .with_options(self.config.generation_options())
    }
}

pub fn in_memory_backend() -> Arc<dyn MemoryBackend> {
    Arc::new(InMemoryMemoryBackend::new())
}

/// A router exposing `get_file_text` over `documents`.
pub fn document_tools(documents: Arc<dyn DocumentSource>) -> Arc<dyn ToolRouter> {
    let mut registry = ToolRegistry::new();
    registry.register(GetFileTextTool::new(documents));

    Arc::new(
        ToolExecutionRouter::new(Arc::new(registry))
            .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks))),
    )
}

/// A builder with persistence routed into `memory` and tracing hooks attached.
pub fn memory_backed_builder(
    provider: Arc<dyn ModelProvider>,
    memory: Arc<dyn MemoryBackend>,
) -> ConversationOrchestratorBuilder {
    ConversationOrchestrator::builder(provider)
        .store(Arc::new(MemoryConversationStore::new(Arc::clone(&memory))))
        .recorder(Arc::new(MemoryUsageRecorder::new(memory)))
        .hooks(Arc::new(SafeChatHooks::new(TracingObservabilityHooks)))
}

pub fn orchestrator_with_memory(
    provider: Arc<dyn ModelProvider>,
    memory: Arc<dyn MemoryBackend>,
    policy: ChatPolicy,
) -> ConversationOrchestrator {
    memory_backed_builder(provider, memory).policy(policy).build()
}

pub fn build_runtime(
    provider: Arc<dyn ModelProvider>,
    config: EngineConfig,
) -> Result<RuntimeBundle, BrookError> {
    let memory = create_memory_backend(config.memory.clone())?;
    Ok(build_runtime_with(provider, config, memory, None))
}

pub fn build_runtime_with_documents(
    provider: Arc<dyn ModelProvider>,
    config: EngineConfig,
    documents: Arc<dyn DocumentSource>,
) -> Result<RuntimeBundle, BrookError> {
    let memory = create_memory_backend(config.memory.clone())?;
    Ok(build_runtime_with(
        provider,
        config,
        memory,
        Some(document_tools(documents)),
    ))
}

pub fn build_runtime_with(
    provider: Arc<dyn ModelProvider>,
    config: EngineConfig,
    memory: Arc<dyn MemoryBackend>,
    tools: Option<Arc<dyn ToolRouter>>,
) -> RuntimeBundle {
    let mut builder =
        memory_backed_builder(provider, Arc::clone(&memory)).policy(config.chat_policy());

    if let Some(tools) = tools {
        builder = builder.tool_router(tools);
    }

    tracing::debug!(
        model = config.model.as_str(),
        max_rounds = config.max_rounds,
        generate_titles = config.generate_titles,
        "runtime wired"
    );

    RuntimeBundle {
        orchestrator: builder.build(),
        memory,
        config,
    }
}
