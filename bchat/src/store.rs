//! Conversation persistence seam used by the finalizer, plus an in-memory implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use bcommon::SessionId;

use crate::ChatError;

pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal assistant output of a turn, in raw and rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessage {
    pub conversation_id: SessionId,
    pub raw_text: String,
    pub rendered: String,
}

pub trait ConversationStore: Send + Sync {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    fn title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Option<String>, ChatError>>;

    fn set_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    messages: Mutex<HashMap<SessionId, Vec<AssistantMessage>>>,
    titles: Mutex<HashMap<SessionId, String>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, conversation_id: &SessionId) -> Result<Vec<AssistantMessage>, ChatError> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| ChatError::store("conversation store lock poisoned"))?;
        Ok(messages.get(conversation_id).cloned().unwrap_or_default())
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut messages = self
                .messages
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            messages
                .entry(message.conversation_id.clone())
                .or_default()
                .push(message);
            Ok(())
        })
    }

    fn title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Option<String>, ChatError>> {
        Box::pin(async move {
            let titles = self
                .titles
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;
            Ok(titles.get(conversation_id).cloned())
        })
    }

    fn set_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut titles = self
                .titles
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;
            titles.insert(conversation_id.clone(), title);
            Ok(())
        })
    }
}
