//! Tool abstraction.
//!
//! Tools are typed: arguments are deserialized from the model's JSON into a
//! struct deriving [`JsonSchema`], so the schema sent to the model is also
//! the validation rule set. [`ToolDyn`] erases the types for storage in a
//! [`ToolRegistry`].

mod registry;

pub use registry::ToolRegistry;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A typed tool callable by the agent.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Registered name, matched against [`crate::message::ToolCall::name`].
    const NAME: &'static str;

    /// Argument type; its JSON Schema is advertised to the model.
    type Args: DeserializeOwned + JsonSchema + Send;

    /// Output type, serialized into the tool result payload.
    type Output: Serialize + Send;

    /// Human-readable description sent to the model.
    fn description(&self) -> &str;

    /// Execute the tool with validated arguments.
    async fn call(&self, args: Self::Args) -> std::result::Result<Self::Output, ToolFailure>;
}

/// Object-safe view of a [`Tool`].
#[async_trait]
pub trait ToolDyn: Send + Sync {
    /// Registered tool name.
    fn name(&self) -> &str;

    /// Definition advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Decode arguments, execute, and serialize the output.
    async fn call_json(&self, args: Value) -> std::result::Result<Value, ToolFailure>;
}

#[async_trait]
impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        let schema = schema_for!(T::Args);
        ToolDefinition {
            name: T::NAME.to_string(),
            description: self.description().to_string(),
            parameters: serde_json::to_value(schema).unwrap_or(Value::Null),
        }
    }

    async fn call_json(&self, args: Value) -> std::result::Result<Value, ToolFailure> {
        let args: T::Args = serde_json::from_value(args)
            .map_err(|e| ToolFailure::InvalidArguments(e.to_string()))?;
        let output = self.call(args).await?;
        serde_json::to_value(output).map_err(|e| ToolFailure::Execution(e.to_string()))
    }
}

/// Tool definition sent to the model alongside the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Value,
}

/// Per-call failure. Contained by the dispatcher; never aborts a batch.
#[derive(Debug, Error)]
pub enum ToolFailure {
    /// Arguments did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool itself failed.
    #[error("{0}")]
    Execution(String),
}

impl ToolFailure {
    /// Create an execution failure from a message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

/// Classification of a failed tool call, surfaced back to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No tool with the requested name is registered.
    UnknownTool,
    /// Arguments failed schema validation.
    InvalidArguments,
    /// The handler ran and failed.
    Execution,
}

/// Tagged result of one tool call, serialized as the tool message content.
///
/// The model sees either `{"success":true,"data":...}` or
/// `{"success":false,"error":"...","kind":"..."}` and can react to the
/// failure in its next reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ToolOutcome {
    /// Successful outcome wrapping the tool's payload.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            kind: None,
        }
    }

    /// Failed outcome with a kind and message.
    pub fn failure(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            kind: Some(kind),
        }
    }

    /// Serialize for embedding in a tool message.
    #[must_use]
    pub fn to_content(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"{e}"}}"#))
    }
}
