//! Routing: decide whether a turn continues with tool execution or ends.

use crate::message::{Message, MessageRole};

/// Where the loop goes after a reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The last assistant message requests tools; execute them.
    Dispatch,
    /// The conversation has reached a final answer.
    Terminate,
}

/// Pure function of the conversation log: `Dispatch` iff the last message is
/// an assistant message carrying tool calls, `Terminate` otherwise.
#[must_use]
pub fn decide(messages: &[Message]) -> RouteDecision {
    match messages.last() {
        Some(last) if last.role == MessageRole::Assistant && last.has_tool_calls() => {
            RouteDecision::Dispatch
        }
        _ => RouteDecision::Terminate,
    }
}
