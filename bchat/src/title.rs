//! One-shot conversation title generation.
//!
//! ```rust
//! use bchat::{sanitize_title, title_prompt};
//! use bprovider::Turn;
//!
//! let prompt = title_prompt(&[Turn::user("hi"), Turn::assistant("Hello!")]);
//! assert!(prompt.starts_with("Based on this message"));
//! assert_eq!(sanitize_title("  \"Greetings\"\nextra"), Some("Greetings".to_string()));
//! ```

use std::sync::Arc;
use std::time::Duration;

use bcommon::{GenerationOptions, SessionId, armable};
use bprovider::{ModelProvider, RequestBuilder, Role, Turn};
use futures_timer::Delay;
use futures_util::future::{Either, select};

use crate::{ChatError, ChatErrorPhase, UsageEntry, UsageRecorder};

pub const MAX_TITLE_CHARS: usize = 80;

/// Builds the single user message sent to ask the model for a title.
pub fn title_prompt(turns: &[Turn]) -> String {
    let exchange = turns
        .iter()
        .filter(|turn| turn.role != Role::System)
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on this message, what name would you give to this chat? {exchange} Just provide the title without quotes or anything, nothing else."
    )
}

/// First non-empty line, trimmed, without surrounding quotes, capped at
/// [`MAX_TITLE_CHARS`] characters.
pub fn sanitize_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let unquoted = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*'))
        .trim();

    if unquoted.is_empty() {
        return None;
    }

    Some(unquoted.chars().take(MAX_TITLE_CHARS).collect())
}

#[derive(Clone)]
pub struct TitleGenerator {
    provider: Arc<dyn ModelProvider>,
    recorder: Arc<dyn UsageRecorder>,
    timeout: Duration,
}

impl TitleGenerator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        recorder: Arc<dyn UsageRecorder>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            recorder,
            timeout,
        }
    }

    /// Issues one non-streaming completion. The call is recorded like a round even
    /// when the returned text is unusable.
    pub async fn generate(
        &self,
        conversation_id: &SessionId,
        model: &str,
        turns: &[Turn],
    ) -> Result<Option<String>, ChatError> {
        let request = RequestBuilder::new(self.provider.id(), model)
            .turn(Turn::user(title_prompt(turns)))
            .options(GenerationOptions::standard())
            .build()
            .map_err(|error| ChatError::from(error).with_phase(ChatErrorPhase::TitleGeneration))?;
        let payload = request
            .payload()
            .map_err(|error| ChatError::from(error).with_phase(ChatErrorPhase::TitleGeneration))?;

        let completion = self.provider.complete(request);
        let outcome = match armable(self.timeout) {
            Some(limit) => match select(completion, Delay::new(limit)).await {
                Either::Left((outcome, _)) => outcome,
                Either::Right(_) => {
                    return Err(ChatError::provider(format!(
                        "title generation timed out after {} ms",
                        limit.as_millis()
                    ))
                    .with_phase(ChatErrorPhase::TitleGeneration));
                }
            },
            None => completion.await,
        };
        let response = outcome
            .map_err(|error| ChatError::from(error).with_phase(ChatErrorPhase::TitleGeneration))?;

        let entry = UsageEntry::for_title(
            conversation_id.clone(),
            payload,
            response.raw.clone(),
            response.usage.clone(),
        );
        if let Err(error) = self.recorder.record(entry).await {
            tracing::warn!(
                event = "usage_record_failed",
                conversation_id = %conversation_id,
                error = %error,
                "failed to record title generation usage"
            );
        }

        Ok(sanitize_title(&response.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_skips_system_turns_and_labels_roles() {
        let prompt = title_prompt(&[
            Turn::system("You are a helpful assistant!"),
            Turn::user("Summarize the budget"),
            Turn::assistant("The budget is 10k."),
        ]);

        assert_eq!(
            prompt,
            "Based on this message, what name would you give to this chat? user: Summarize the budget\nassistant: The budget is 10k. Just provide the title without quotes or anything, nothing else."
        );
    }

    #[test]
    fn sanitize_rejects_blank_and_caps_length() {
        assert_eq!(sanitize_title("   \n  "), None);
        assert_eq!(sanitize_title("\"\""), None);
        assert_eq!(sanitize_title("'Budget Review'"), Some("Budget Review".to_string()));

        let long = "x".repeat(200);
        assert_eq!(
            sanitize_title(&long).map(|title| title.chars().count()),
            Some(MAX_TITLE_CHARS)
        );
    }
}
