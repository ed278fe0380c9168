//! Response-side serde helpers for the chat-completions API.

use serde::Deserialize;
use serde_json::Value;

use crate::{ModelResponse, ProviderError, UsageRecord};

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiCompletion {
    model: Option<String>,
    choices: Vec<ApiChoice>,
    usage: Option<UsageRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiChoice {
    message: Option<ApiMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiMessage {
    content: Option<String>,
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

/// In-band error objects some servers send as an SSE `data:` payload.
pub(crate) fn stream_error_message(chunk: &Value) -> Option<String> {
    let error = chunk.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

/// Reads the first choice's message text and usage out of a non-streamed response.
pub fn parse_completion(raw: Value, fallback_model: &str) -> Result<ModelResponse, ProviderError> {
    let completion = ApiCompletion::deserialize(&raw).map_err(|err| {
        ProviderError::transport(format!("unexpected completion response: {err}"))
    })?;

    let text = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();

    Ok(ModelResponse {
        model: completion
            .model
            .unwrap_or_else(|| fallback_model.to_string()),
        text,
        usage: completion.usage,
        raw,
    })
}
