//! Tool registry for lookup by function name.

use std::future::Future;
use std::sync::Arc;

use bcommon::Registry;
use bprovider::ToolSchema;

use crate::{FunctionTool, Tool, ToolArguments, ToolError, ToolExecutionContext};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers under the schema's function name, replacing any tool already there.
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn register_fn<F, Fut>(&mut self, schema: ToolSchema, handler: F)
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<String>, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(schema, handler));
    }

    pub fn register_sync_fn<F>(&mut self, schema: ToolSchema, handler: F)
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Result<Option<String>, ToolError>
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(schema, move |arguments, context| {
            let output = handler(arguments, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Schemas ordered by name so the request payload is stable between rounds.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
