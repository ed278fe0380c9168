//! Common `bprovider` imports for downstream crates.

pub use crate::{
    BoxedChunkStream, ModelProvider, ModelRequest, ModelResponse, NoopOperationHooks,
    ProviderError, ProviderErrorKind, ProviderId, ProviderOperationHooks, RequestBuilder,
    RetryPolicy, Role, StreamDecoder, StreamEvent, ToolCallDelta, ToolChoice, ToolSchema, Turn,
    UsageRecord,
};
pub use bcommon::{BoxFuture, GenerationOptions, MetadataMap};
