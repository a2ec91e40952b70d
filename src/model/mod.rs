//! Model boundary.
//!
//! [`ChatModel`] is the external capability the agent depends on;
//! [`ReasoningAdapter`] wraps it with the fixed system prompt and tool
//! definitions so the run loop only ever hands over conversation history.

mod mock;
mod openai;

pub use mock::MockModel;
pub use openai::{OPENAI_API_BASE_URL, OpenAiModel};

use crate::error::{AgentError, AgentResult};
use crate::message::{Message, MessageRole};
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use tracing::debug;

/// A chat completion model with tool calling support.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the given conversation.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> AgentResult<Message>;
}

/// Owns the system prompt and tool definitions for a model.
///
/// Guarantees the returned message is an assistant message; anything else is
/// a [`AgentError::ResponseFormat`] and fatal for the run.
pub struct ReasoningAdapter<M> {
    model: M,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl<M: ChatModel> ReasoningAdapter<M> {
    pub fn new(model: M, system_prompt: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            tools,
        }
    }

    /// One reasoning step: system prompt + history in, assistant message out.
    pub async fn complete(&self, history: &[Message]) -> AgentResult<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend_from_slice(history);

        debug!(history_len = history.len(), "requesting completion");
        let reply = self.model.complete(&messages, &self.tools).await?;

        if reply.role != MessageRole::Assistant {
            return Err(AgentError::response_format(format!(
                "expected assistant message, got {:?}",
                reply.role
            )));
        }
        Ok(reply)
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for ReasoningAdapter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningAdapter")
            .field("model", &self.model)
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}
