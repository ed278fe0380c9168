//! Reassembles tool calls that arrive fragmented across streamed chunks.
//!
//! ```rust
//! use bchat::ToolCallAccumulator;
//! use bprovider::ToolCallDelta;
//!
//! let mut accumulator = ToolCallAccumulator::new();
//! accumulator.push(&ToolCallDelta::new(0).with_id("call_a").with_function_name("get_file_text"));
//! accumulator.push(&ToolCallDelta::new(0).with_arguments("{\"context_file_id\""));
//! accumulator.push(&ToolCallDelta::new(0).with_arguments(": 1}"));
//!
//! let calls = accumulator.finish();
//! let call = calls[0].as_ref().expect("arguments parse");
//! assert_eq!(call.arguments["context_file_id"], 1);
//! ```

use std::collections::BTreeMap;

use bprovider::ToolCallDelta;
use btooling::{ToolArgumentParseError, ToolCall, parse_arguments};

/// In-progress state of one call. Nothing is validated until [`ToolCallAccumulator::finish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialToolCall {
    pub id: Option<String>,
    pub function_name: Option<String>,
    pub arguments: String,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity fields are first-write-wins; argument fragments always append.
    pub fn push(&mut self, delta: &ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_default();

        if entry.id.is_none() {
            entry.id = delta.id.clone();
        }

        if entry.function_name.is_none() {
            entry.function_name = delta.function_name.clone();
        }

        entry.arguments.push_str(&delta.arguments_fragment);
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn get(&self, index: u32) -> Option<&PartialToolCall> {
        self.calls.get(&index)
    }

    /// Parses every accumulated call in ascending index order. A failure is reported for
    /// that call alone.
    pub fn finish(self) -> Vec<Result<ToolCall, ToolArgumentParseError>> {
        self.calls
            .into_iter()
            .map(|(index, partial)| complete(index, partial))
            .collect()
    }
}

fn complete(index: u32, partial: PartialToolCall) -> Result<ToolCall, ToolArgumentParseError> {
    let tool_call_id = partial.id.unwrap_or_else(|| format!("call_{index}"));

    let Some(function_name) = partial.function_name else {
        return Err(ToolArgumentParseError {
            index,
            tool_call_id,
            function_name: None,
            raw_arguments: partial.arguments,
            message: "tool call has no function name".to_string(),
        });
    };

    match parse_arguments(&partial.arguments) {
        Ok(arguments) => Ok(ToolCall {
            id: tool_call_id,
            function_name,
            arguments,
        }),
        Err(error) => Err(ToolArgumentParseError {
            index,
            tool_call_id,
            function_name: Some(function_name),
            raw_arguments: partial.arguments,
            message: error.message,
        }),
    }
}
