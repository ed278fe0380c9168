//! Capability layer for registering tools and routing model tool calls to them.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bprovider::ToolSchema;
//! use btooling::{ToolCall, ToolExecutionContext, ToolExecutionRouter, ToolRegistry, ToolRouter};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut registry = ToolRegistry::new();
//! registry.register_sync_fn(
//!     ToolSchema::function("ping", "Replies pong", json!({"type": "object"})),
//!     |_args, _ctx| Ok(Some("pong".to_string())),
//! );
//!
//! let router = ToolExecutionRouter::new(Arc::new(registry));
//! let context = ToolExecutionContext::new("conversation-1");
//! let result = router
//!     .invoke(ToolCall::new("call_1", "ping", Default::default()), &context)
//!     .await;
//!
//! assert_eq!(result.output.as_deref(), Some("Response for ping with args {}: pong"));
//! # }
//! ```

mod args;
mod error;
mod hooks;
mod registry;
mod router;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        FunctionTool, Tool, ToolArgumentParseError, ToolArguments, ToolCall, ToolError,
        ToolErrorKind, ToolExecutionContext, ToolExecutionRouter, ToolFuture, ToolRegistry,
        ToolResult, ToolRouter,
    };
}

pub use args::{parse_arguments, required_i64, required_string};
pub use error::{ToolArgumentParseError, ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use router::{
    ToolExecutionRouter, ToolRouter, error_output, not_found_output, response_output,
};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolArguments, ToolCall, ToolExecutionContext, ToolResult, join_outputs};
