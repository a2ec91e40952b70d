//! Conversation message model.
//!
//! A conversation is an append-only log of [`Message`] values. The log is
//! what gets sent to the model, what tool results are appended to, and what
//! session checkpoints persist.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Fixed instructions prepended by the reasoning adapter.
    System,
    /// End-user input.
    User,
    /// Model output, optionally carrying tool call requests.
    Assistant,
    /// Result of a single tool call, linked by `tool_call_id`.
    Tool,
}

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool result message.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    /// Decoded JSON arguments.
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    /// Non-empty only on assistant messages that request tool execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set only on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// System instruction message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// User input message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Plain assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Assistant reply requesting tool execution.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool result linked to the originating call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this message requests tool execution.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_message_omits_empty_fields() {
        let msg = Message::user("hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn tool_message_carries_call_id() {
        let msg = Message::tool("call_1", "{\"success\":true}");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["tool_call_id"], "call_1");
        assert_eq!(value["role"], "tool");
    }

    #[test]
    fn round_trip_with_tool_calls() {
        let msg = Message::assistant_with_tools(
            "",
            vec![ToolCall::new(
                "call_1",
                "check_phone_number",
                json!({"phone_number": "89991234567"}),
            )],
        );
        let text = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn round_trip_without_tool_calls() {
        let msg = Message::assistant("done");
        let text = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
        assert!(!back.has_tool_calls());
    }
}
