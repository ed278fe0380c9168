//! Tool call, result and execution context types.

use bcommon::{MetadataMap, SessionId, TraceId};
use serde_json::{Map, Value};

use crate::ToolArgumentParseError;

pub type ToolArguments = Map<String, Value>;

/// A fully reconstructed call whose arguments parsed as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub function_name: String,
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        function_name: impl Into<String>,
        arguments: ToolArguments,
    ) -> Self {
        Self {
            id: id.into(),
            function_name: function_name.into(),
            arguments,
        }
    }

    /// Arguments rendered as compact JSON, as they appear in result text.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Outcome of one call. `output == None` means the tool had nothing to report back and the
/// result is left out of the reinjected turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub function_name: String,
    pub arguments: ToolArguments,
    pub output: Option<String>,
}

impl ToolResult {
    pub fn from_call(call: &ToolCall, output: Option<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            function_name: call.function_name.clone(),
            arguments: call.arguments.clone(),
            output,
        }
    }

    pub fn from_parse_error(error: &ToolArgumentParseError) -> Self {
        Self {
            tool_call_id: error.tool_call_id.clone(),
            function_name: error.display_name().to_string(),
            arguments: ToolArguments::new(),
            output: Some(format!(
                "error invoking '{}': invalid arguments: {}",
                error.display_name(),
                error.message
            )),
        }
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }
}

/// Joins the non-null outputs of a batch with `"\n"`. `None` when nothing is reportable.
pub fn join_outputs(results: &[ToolResult]) -> Option<String> {
    let outputs = results
        .iter()
        .filter_map(|result| result.output.as_deref())
        .collect::<Vec<_>>();

    if outputs.is_empty() {
        None
    } else {
        Some(outputs.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub round: u32,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: None,
            round: 1,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
