//! Lenient serde view of a streamed chat-completions chunk.
//!
//! Every field is optional so that partially populated or unfamiliar chunks still
//! deserialize; only type mismatches fail.

use serde::Deserialize;

use crate::{RawChunk, ToolCallDelta, UsageRecord};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChatChunk {
    pub choices: Option<Vec<ChunkChoice>>,
    pub usage: Option<UsageRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChunkChoice {
    pub delta: Option<ChunkDelta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChunkDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireToolCallDelta {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub function: Option<WireFunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireFunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// What one chunk contributes to the round.
#[derive(Debug, Default, PartialEq)]
pub struct DecodedChunk {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub usage: Option<UsageRecord>,
}

impl DecodedChunk {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tool_calls.is_empty() && self.usage.is_none()
    }
}

/// Extracts the text fragment and tool-call deltas of the first choice plus any usage.
///
/// Only a structurally wrong chunk (for example `choices` being a string) is an error.
pub fn decode_chunk(raw: &RawChunk) -> Result<DecodedChunk, serde_json::Error> {
    let chunk = ChatChunk::deserialize(raw)?;
    let delta = chunk
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
        .unwrap_or_default();

    let text = delta.content.filter(|content| !content.is_empty());
    let tool_calls = delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(into_tool_call_delta)
        .collect();

    Ok(DecodedChunk {
        text,
        tool_calls,
        usage: chunk.usage,
    })
}

fn into_tool_call_delta(wire: WireToolCallDelta) -> Option<ToolCallDelta> {
    let function = wire.function.unwrap_or_default();
    let id = wire.id.filter(|id| !id.is_empty());
    let function_name = function.name.filter(|name| !name.is_empty());
    let arguments_fragment = function.arguments.unwrap_or_default();

    if id.is_none() && function_name.is_none() && arguments_fragment.is_empty() {
        return None;
    }

    let index = wire.index.unwrap_or_else(|| {
        tracing::warn!(
            event = "tool_call_index_missing",
            id = id.as_deref().unwrap_or(""),
            function_name = function_name.as_deref().unwrap_or(""),
            "tool call delta has no index; merging it into call 0"
        );
        0
    });

    Some(ToolCallDelta {
        index,
        id,
        function_name,
        arguments_fragment,
    })
}
