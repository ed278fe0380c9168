//! JSON argument parsing helpers for function and trait-based tools.
//!
//! ```rust
//! use btooling::{parse_arguments, required_i64};
//!
//! let args = parse_arguments(r#"{"context_file_id": 7}"#).expect("object should parse");
//! assert_eq!(required_i64(&args, "context_file_id").expect("id present"), 7);
//! assert!(parse_arguments("").expect("empty parses").is_empty());
//! ```

use serde_json::Value;

use crate::{ToolArguments, ToolError};

/// Parses an accumulated argument buffer. A blank buffer is an empty object, since models
/// omit arguments entirely for zero-parameter functions.
pub fn parse_arguments(raw: &str) -> Result<ToolArguments, ToolError> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::new());
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ToolError::invalid_arguments(format!(
            "expected JSON object arguments, got {}",
            json_type_name(&other)
        ))),
    }
}

pub fn required_string(args: &ToolArguments, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

/// Accepts integers and integer-valued strings; models send both.
pub fn required_i64(args: &ToolArguments, key: &str) -> Result<i64, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required integer: '{key}'")))?;

    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or_else(|| ToolError::invalid_arguments(format!("'{key}' must be an integer")))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolErrorKind;

    #[test]
    fn non_object_arguments_are_rejected() {
        let error = parse_arguments("[1, 2]").expect_err("array should fail");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
        assert!(error.message.contains("array"));
    }

    #[test]
    fn truncated_json_is_rejected() {
        let error = parse_arguments("{\"context_file_id\": ").expect_err("truncated should fail");
        assert!(error.message.starts_with("invalid JSON arguments"));
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let args = parse_arguments(r#"{"a": "12", "b": "x", "c": 3}"#).expect("args parse");
        assert_eq!(required_i64(&args, "a").expect("a"), 12);
        assert!(required_i64(&args, "b").is_err());
        assert_eq!(required_i64(&args, "c").expect("c"), 3);
        assert!(required_i64(&args, "missing").is_err());
        assert!(required_string(&args, "a").is_ok());
    }
}
