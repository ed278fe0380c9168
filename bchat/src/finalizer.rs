//! Commits the terminal assistant output of a turn and titles untitled conversations.
//!
//! Nothing here fails the turn: by the time the finalizer runs, the client has already
//! seen the output, so every failure is logged and reported in [`FinalizeOutcome`].

use std::sync::Arc;

use bcommon::SessionId;
use bprovider::Turn;

use crate::{
    AssistantMessage, ChatError, ChatErrorPhase, ConversationStore, Renderer, TitleGenerator,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeOutcome {
    pub rendered: String,
    pub saved: bool,
    pub title: Option<String>,
    pub save_error: Option<ChatError>,
    pub title_error: Option<ChatError>,
}

#[derive(Clone)]
pub struct Finalizer {
    store: Arc<dyn ConversationStore>,
    renderer: Arc<dyn Renderer>,
    titles: Option<TitleGenerator>,
}

impl Finalizer {
    pub fn new(store: Arc<dyn ConversationStore>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            store,
            renderer,
            titles: None,
        }
    }

    pub fn with_title_generator(mut self, titles: TitleGenerator) -> Self {
        self.titles = Some(titles);
        self
    }

    /// `turns` is the full history of the turn, ending with the synthetic tool turns of
    /// earlier rounds; `raw_text` is the final round's buffer.
    pub async fn finalize(
        &self,
        conversation_id: &SessionId,
        model: &str,
        raw_text: &str,
        turns: &[Turn],
    ) -> FinalizeOutcome {
        let rendered = self.renderer.render(raw_text);
        let message = AssistantMessage {
            conversation_id: conversation_id.clone(),
            raw_text: raw_text.to_string(),
            rendered: rendered.clone(),
        };

        let save_error = match self.store.save_assistant_message(message).await {
            Ok(()) => None,
            Err(error) => {
                let error = error.with_phase(ChatErrorPhase::Finalizing);
                tracing::warn!(
                    event = "assistant_message_save_failed",
                    conversation_id = %conversation_id,
                    error = %error,
                    "assistant output was delivered but could not be saved"
                );
                Some(error)
            }
        };

        let (title, title_error) = match &self.titles {
            Some(titles) => {
                self.ensure_title(titles, conversation_id, model, raw_text, turns)
                    .await
            }
            None => (None, None),
        };

        FinalizeOutcome {
            rendered,
            saved: save_error.is_none(),
            title,
            save_error,
            title_error,
        }
    }

    async fn ensure_title(
        &self,
        titles: &TitleGenerator,
        conversation_id: &SessionId,
        model: &str,
        raw_text: &str,
        turns: &[Turn],
    ) -> (Option<String>, Option<ChatError>) {
        match self.store.title(conversation_id).await {
            Ok(Some(_)) => return (None, None),
            Ok(None) => {}
            Err(error) => {
                let error = error.with_phase(ChatErrorPhase::TitleGeneration);
                tracing::warn!(
                    event = "title_lookup_failed",
                    conversation_id = %conversation_id,
                    error = %error,
                    "could not read conversation title"
                );
                return (None, Some(error));
            }
        }

        let mut exchange = turns.to_vec();
        exchange.push(Turn::assistant(raw_text));

        let outcome = match titles.generate(conversation_id, model, &exchange).await {
            Ok(Some(title)) => self
                .store
                .set_title(conversation_id, title.clone())
                .await
                .map(|()| Some(title))
                .map_err(|error| error.with_phase(ChatErrorPhase::TitleGeneration)),
            Ok(None) => Err(ChatError::provider("title completion returned no usable text")
                .with_phase(ChatErrorPhase::TitleGeneration)),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(title) => (title, None),
            Err(error) => {
                tracing::warn!(
                    event = "title_generation_failed",
                    conversation_id = %conversation_id,
                    error = %error,
                    "conversation left untitled"
                );
                (None, Some(error))
            }
        }
    }
}
