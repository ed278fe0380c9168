//! Adapters that expose a memory backend as the chat layer's persistence seams.

use std::sync::Arc;

use bchat::{
    AssistantMessage, ChatError, ChatErrorPhase, ChatFuture, ConversationStore, UsageEntry,
    UsageRecorder,
};
use bcommon::SessionId;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

#[derive(Clone)]
pub struct MemoryConversationStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryConversationStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl ConversationStore for MemoryConversationStore {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .save_assistant_message(message)
                .await
                .map_err(|error| chat_error(error, ChatErrorPhase::Finalizing))
        })
    }

    fn title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Option<String>, ChatError>> {
        Box::pin(async move {
            self.backend
                .load_title(conversation_id)
                .await
                .map_err(|error| chat_error(error, ChatErrorPhase::TitleGeneration))
        })
    }

    fn set_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .save_title(conversation_id, title)
                .await
                .map_err(|error| chat_error(error, ChatErrorPhase::TitleGeneration))
        })
    }
}

#[derive(Clone)]
pub struct MemoryUsageRecorder {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryUsageRecorder {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }
}

impl UsageRecorder for MemoryUsageRecorder {
    fn record<'a>(&'a self, entry: UsageEntry) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .append_usage_entry(entry)
                .await
                .map_err(|error| chat_error(error, ChatErrorPhase::Recording))
        })
    }
}

fn chat_error(error: MemoryError, phase: ChatErrorPhase) -> ChatError {
    ChatError::from(error).with_phase(phase)
}
