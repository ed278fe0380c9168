//! Maps tool calls onto registered tools and turns every outcome into result text.
//!
//! Routing never fails: unknown tools, tool errors and timeouts all become in-band output
//! so the model can see what went wrong on the next round.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bcommon::armable;
use bprovider::ToolSchema;
use futures_timer::Delay;
use futures_util::future::{Either, select};

use crate::{
    NoopToolRuntimeHooks, ToolArgumentParseError, ToolCall, ToolError, ToolExecutionContext,
    ToolFuture, ToolRegistry, ToolResult, ToolRuntimeHooks,
};

pub trait ToolRouter: Send + Sync {
    fn schemas(&self) -> Vec<ToolSchema>;

    fn invoke<'a>(
        &'a self,
        call: ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult>;

    /// Result reported for a call whose arguments never parsed.
    fn reject(
        &self,
        error: &ToolArgumentParseError,
        _context: &ToolExecutionContext,
    ) -> ToolResult {
        ToolResult::from_parse_error(error)
    }

    /// Runs one round's calls one at a time, in the order given. A call whose arguments
    /// never parsed is answered through [`ToolRouter::reject`] in its own slot.
    fn invoke_batch<'a>(
        &'a self,
        calls: Vec<Result<ToolCall, ToolArgumentParseError>>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Vec<ToolResult>> {
        Box::pin(async move {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let result = match call {
                    Ok(call) => self.invoke(call, context).await,
                    Err(rejected) => {
                        tracing::warn!(
                            event = "tool_arguments_rejected",
                            conversation_id = %context.session_id,
                            round = context.round,
                            tool_name = rejected.display_name(),
                            error = %rejected.message,
                            "tool call arguments did not parse"
                        );
                        self.reject(&rejected, context)
                    }
                };
                results.push(result);
            }
            results
        })
    }
}

pub fn not_found_output(name: &str) -> String {
    format!("tool '{name}' not found")
}

pub fn error_output(name: &str, message: &str) -> String {
    format!("error invoking '{name}': {message}")
}

pub fn response_output(call: &ToolCall, output: &str) -> String {
    format!(
        "Response for {} with args {}: {}",
        call.function_name,
        call.arguments_json(),
        output
    )
}

#[derive(Clone)]
pub struct ToolExecutionRouter {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl Default for ToolExecutionRouter {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl ToolExecutionRouter {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Bounds each individual invocation; an expired call reports a timeout error as output.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn run(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<Option<String>, ToolError> {
        let tool = self.registry.get(&call.function_name).ok_or_else(|| {
            ToolError::not_found(not_found_output(&call.function_name))
                .with_tool_name(call.function_name.clone())
                .with_tool_call_id(call.id.clone())
        })?;

        let invocation = tool.invoke(&call.arguments, context);
        let Some(limit) = self.timeout.and_then(armable) else {
            return invocation.await;
        };

        match select(invocation, Delay::new(limit)).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(_) => Err(ToolError::timeout(format!(
                "timed out after {} ms",
                limit.as_millis()
            ))),
        }
    }
}

impl ToolRouter for ToolExecutionRouter {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.registry.schemas()
    }

    fn invoke<'a>(
        &'a self,
        call: ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            self.hooks.on_execution_start(&call, context);
            let started = Instant::now();

            match self.run(&call, context).await {
                Ok(output) => {
                    let output = output.map(|text| response_output(&call, &text));
                    let result = ToolResult::from_call(&call, output);
                    self.hooks
                        .on_execution_success(&call, context, &result, started.elapsed());
                    result
                }
                Err(error) => {
                    self.hooks
                        .on_execution_failure(&call, context, &error, started.elapsed());
                    let output = match error.kind {
                        crate::ToolErrorKind::NotFound => not_found_output(&call.function_name),
                        _ => error_output(&call.function_name, &error.message),
                    };
                    ToolResult::from_call(&call, Some(output))
                }
            }
        })
    }

    fn reject(&self, error: &ToolArgumentParseError, context: &ToolExecutionContext) -> ToolResult {
        self.hooks.on_arguments_rejected(error, context);
        ToolResult::from_parse_error(error)
    }
}
