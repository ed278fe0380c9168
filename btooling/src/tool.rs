//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use bprovider::ToolSchema;
//! use btooling::{FunctionTool, Tool};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolSchema::function("echo", "Echoes input", json!({"type": "object"})),
//!     |args, _ctx| async move { Ok(Some(serde_json::Value::Object(args).to_string())) },
//! );
//!
//! assert_eq!(tool.schema().name(), "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use bcommon::BoxFuture;
use bprovider::ToolSchema;

use crate::{ToolArguments, ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    /// `Ok(None)` means there is nothing to feed back to the model.
    fn invoke<'a>(
        &'a self,
        arguments: &'a ToolArguments,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Option<String>, ToolError>>;
}

type ToolHandler = dyn Fn(ToolArguments, ToolExecutionContext) -> ToolFuture<'static, Result<Option<String>, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    schema: ToolSchema,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<String>, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |arguments, context| Box::pin(handler(arguments, context)));

        Self { schema, handler }
    }
}

impl Tool for FunctionTool {
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    fn invoke<'a>(
        &'a self,
        arguments: &'a ToolArguments,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Option<String>, ToolError>> {
        (self.handler)(arguments.clone(), context.clone())
    }
}
