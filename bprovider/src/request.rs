//! Provider request assembly and the exact wire payload derived from it.
//!
//! ```rust
//! use bprovider::{ProviderId, RequestBuilder, Turn};
//!
//! let request = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
//!     .turn(Turn::system("You are a helpful assistant!"))
//!     .turn(Turn::user("hi"))
//!     .streaming(true)
//!     .build()
//!     .expect("request should build");
//!
//! let payload = request.payload().expect("payload should serialize");
//! assert_eq!(payload["stream_options"]["include_usage"], true);
//! assert!(payload.get("tools").is_none());
//! ```

use bcommon::{GenerationOptions, MetadataMap};
use serde::Serialize;
use serde_json::Value;

use crate::{ProviderError, ProviderId, ToolChoice, ToolSchema, Turn};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub provider: ProviderId,
    pub model: String,
    pub turns: Vec<Turn>,
    pub options: GenerationOptions,
    pub tools: Vec<ToolSchema>,
    pub tool_choice: Option<ToolChoice>,
    pub include_usage: bool,
    pub metadata: MetadataMap,
}

impl ModelRequest {
    pub fn builder(provider: ProviderId, model: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(provider, model)
    }

    pub fn is_streaming(&self) -> bool {
        self.options.stream
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.turns.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one turn is required",
            ));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if let Some(top_p) = self.options.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            return Err(ProviderError::invalid_request(
                "top_p must be in the inclusive range 0.0..=1.0",
            ));
        }

        if self.tool_choice.is_some() && self.tools.is_empty() {
            return Err(ProviderError::invalid_request(
                "tool_choice requires at least one tool",
            ));
        }

        Ok(())
    }

    /// The JSON body sent to the chat-completions endpoint. This is also what gets
    /// recorded as "payload sent" for the round.
    pub fn payload(&self) -> Result<Value, ProviderError> {
        let body = WirePayload {
            model: &self.model,
            messages: &self.turns,
            stream: self.options.stream,
            temperature: self.options.temperature,
            top_p: self.options.top_p,
            max_tokens: self.options.max_tokens,
            tools: (!self.tools.is_empty()).then_some(self.tools.as_slice()),
            tool_choice: self.tool_choice,
            stream_options: (self.options.stream && self.include_usage)
                .then_some(StreamOptions { include_usage: true }),
        };

        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Serialize)]
struct WirePayload<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

/// Assembles one provider call from turns, decoding parameters and an optional tool set.
///
/// Tool choice is derived at build time: no tools means no `tool_choice`, forced tool use
/// means the provider's forced spelling, anything else is `auto`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBuilder {
    provider: ProviderId,
    model: String,
    turns: Vec<Turn>,
    options: GenerationOptions,
    tools: Vec<ToolSchema>,
    force_tool_use: bool,
    metadata: MetadataMap,
}

impl RequestBuilder {
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            turns: Vec::new(),
            options: GenerationOptions::default(),
            tools: Vec::new(),
            force_tool_use: false,
            metadata: MetadataMap::new(),
        }
    }

    pub fn turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn turns(mut self, turns: impl IntoIterator<Item = Turn>) -> Self {
        self.turns.extend(turns);
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.options.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }

    pub fn force_tool_use(mut self, force: bool) -> Self {
        self.force_tool_use = force;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.options.stream = stream;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ModelRequest, ProviderError> {
        let tool_choice = if self.tools.is_empty() {
            None
        } else if self.force_tool_use {
            Some(self.provider.forced_tool_choice())
        } else {
            Some(ToolChoice::Auto)
        };

        let request = ModelRequest {
            provider: self.provider,
            model: self.model,
            include_usage: self.options.stream && self.provider.streams_usage_on_request(),
            turns: self.turns,
            options: self.options,
            tools: self.tools,
            tool_choice,
            metadata: self.metadata,
        };

        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ProviderErrorKind;

    fn file_tool() -> ToolSchema {
        ToolSchema::function(
            "get_file_text",
            "Get the full text of a given context file based on the context_file_id.",
            json!({
                "type": "object",
                "properties": {"context_file_id": {"type": "integer"}},
                "required": ["context_file_id"]
            }),
        )
    }

    #[test]
    fn payload_carries_turns_params_and_tools() {
        let request = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
            .turn(Turn::system("You are a helpful assistant!"))
            .turn(Turn::user("What is in file 1?"))
            .options(GenerationOptions::standard())
            .tools(vec![file_tool()])
            .streaming(true)
            .build()
            .expect("request should build");

        let payload = request.payload().expect("payload should serialize");
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["temperature"], 1.0);
        assert_eq!(payload["top_p"], 1.0);
        assert_eq!(payload["messages"][0], json!({"role": "system", "content": "You are a helpful assistant!"}));
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["tools"][0]["function"]["name"], "get_file_text");
        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["stream_options"], json!({"include_usage": true}));
    }

    #[test]
    fn forced_tool_choice_depends_on_provider() {
        let mistral = RequestBuilder::new(ProviderId::Mistral, "mistral-small")
            .turn(Turn::user("hi"))
            .tools(vec![file_tool()])
            .force_tool_use(true)
            .build()
            .expect("request should build");
        assert_eq!(mistral.tool_choice, Some(ToolChoice::Any));

        let openai = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
            .turn(Turn::user("hi"))
            .tools(vec![file_tool()])
            .force_tool_use(true)
            .build()
            .expect("request should build");
        assert_eq!(openai.payload().expect("payload")["tool_choice"], "required");
    }

    #[test]
    fn non_openai_streaming_omits_stream_options() {
        let request = RequestBuilder::new(ProviderId::Mistral, "mistral-small")
            .turn(Turn::user("hi"))
            .streaming(true)
            .build()
            .expect("request should build");

        let payload = request.payload().expect("payload");
        assert!(payload.get("stream_options").is_none());
        assert!(payload.get("tool_choice").is_none());
    }

    #[test]
    fn non_streaming_openai_omits_stream_options() {
        let request = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
            .turn(Turn::user("hi"))
            .build()
            .expect("request should build");

        assert!(!request.include_usage);
        assert!(request.payload().expect("payload").get("stream_options").is_none());
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let empty_model = RequestBuilder::new(ProviderId::OpenAi, " ")
            .turn(Turn::user("hi"))
            .build()
            .expect_err("empty model");
        assert_eq!(empty_model.kind, ProviderErrorKind::InvalidRequest);

        let no_turns = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
            .build()
            .expect_err("no turns");
        assert!(no_turns.message.contains("turn"));

        let bad_top_p = RequestBuilder::new(ProviderId::OpenAi, "gpt-4o-mini")
            .turn(Turn::user("hi"))
            .top_p(1.5)
            .build()
            .expect_err("bad top_p");
        assert!(bad_top_p.message.contains("top_p"));
    }
}
