//! Tool dispatch with per-call failure containment.

use crate::message::{Message, ToolCall};
use crate::tool::{FailureKind, ToolFailure, ToolOutcome, ToolRegistry};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes the tool calls of one assistant message.
///
/// Dispatch is infallible at the batch level: every call produces exactly
/// one tool message, failures included, so the model always sees a result
/// for each call id. Calls run concurrently but results keep the original
/// call order.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("tools", &self.registry.names())
            .finish()
    }
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Execute a batch of calls, returning one tool message per call in the
    /// original order.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<Message> {
        join_all(calls.iter().map(|call| self.execute_one(call))).await
    }

    async fn execute_one(&self, call: &ToolCall) -> Message {
        let outcome = match self.registry.get(&call.name) {
            None => {
                warn!(tool = %call.name, id = %call.id, "unknown tool requested");
                ToolOutcome::failure(
                    FailureKind::UnknownTool,
                    format!("unknown tool '{}'", call.name),
                )
            }
            Some(tool) => match tool.call_json(call.arguments.clone()).await {
                Ok(data) => {
                    debug!(tool = %call.name, id = %call.id, "tool call succeeded");
                    ToolOutcome::ok(data)
                }
                Err(ToolFailure::InvalidArguments(msg)) => {
                    warn!(tool = %call.name, id = %call.id, error = %msg, "invalid tool arguments");
                    ToolOutcome::failure(FailureKind::InvalidArguments, msg)
                }
                Err(ToolFailure::Execution(msg)) => {
                    warn!(tool = %call.name, id = %call.id, error = %msg, "tool execution failed");
                    ToolOutcome::failure(FailureKind::Execution, msg)
                }
            },
        };

        Message::tool(&call.id, outcome.to_content())
    }
}
