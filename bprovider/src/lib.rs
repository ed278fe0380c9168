//! Provider-facing building blocks for brook: conversation turns, request assembly, the
//! streamed chunk decoder, and the provider seam with its HTTP adapter.
//!
//! ```rust
//! use bprovider::{ProviderId, RequestBuilder, ToolSchema, Turn};
//! use serde_json::json;
//!
//! let request = RequestBuilder::new(ProviderId::Mistral, "mistral-small-latest")
//!     .turn(Turn::user("Which file mentions the budget?"))
//!     .tools(vec![ToolSchema::function("get_file_text", "Read a file", json!({"type": "object"}))])
//!     .force_tool_use(true)
//!     .streaming(true)
//!     .build()
//!     .expect("request should build");
//!
//! let payload = request.payload().expect("payload should serialize");
//! assert_eq!(payload["tool_choice"], "any");
//! ```

pub mod adapters;
mod chunk;
mod credentials;
mod decoder;
mod error;
mod model;
pub mod prelude;
mod provider;
mod request;
mod resilience;
mod stream;

pub use chunk::{DecodedChunk, decode_chunk};
pub use credentials::{SecretString, SecureCredentialManager};
pub use decoder::StreamDecoder;
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    FunctionSchema, ModelResponse, ProviderId, Role, ToolCallDelta, ToolChoice, ToolSchema, Turn,
    UsageRecord,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use request::{ModelRequest, RequestBuilder};
pub use resilience::{
    NoopOperationHooks, OPERATION_COMPLETE, OPERATION_STREAM, ProviderOperationHooks,
    RetryPolicy, execute_with_retry,
};
pub use stream::{BoxedChunkStream, ChunkStream, RawChunk, StreamEvent, VecChunkStream};
