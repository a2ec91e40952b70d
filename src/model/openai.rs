//! OpenAI-compatible Chat Completions implementation of [`ChatModel`].

use super::ChatModel;
use crate::config::LlmConfig;
use crate::error::{AgentError, AgentResult};
use crate::message::{Message, MessageRole, ToolCall};
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions model over any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiModel {
    http: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenAiModel {
    /// Create a model with default base URL and sampling settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into().into(),
            base_url: OPENAI_API_BASE_URL.into(),
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }

    /// Create a model from configuration. The API key is never read from
    /// the config file, only passed in from the environment.
    #[must_use]
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into().into(),
            base_url: config.base_url.as_str().into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Override the base URL (Azure, proxies, local servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().into();
        self
    }

    /// Override the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn build_request_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> Value {
        let api_messages: Vec<Value> = messages.iter().map(wire_message).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        if !tools.is_empty() {
            let tool_defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::json!(tool_defs);
        }

        body
    }

    /// Decode `choices[0].message` into an assistant [`Message`].
    fn parse_response(json: &Value) -> AgentResult<Message> {
        let Some(message_json) = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
        else {
            return Err(AgentError::response_format(
                "response has no choices[0].message",
            ));
        };

        let content = message_json["content"].as_str().unwrap_or("").to_string();

        let mut tool_calls = Vec::new();
        if let Some(raw_calls) = message_json["tool_calls"].as_array() {
            for raw in raw_calls {
                let id = raw["id"]
                    .as_str()
                    .ok_or_else(|| AgentError::response_format("tool call without id"))?;
                let name = raw["function"]["name"]
                    .as_str()
                    .ok_or_else(|| AgentError::response_format("tool call without name"))?;
                let arguments = match &raw["function"]["arguments"] {
                    // Arguments arrive string-encoded; decode to a Value.
                    Value::String(s) => serde_json::from_str(s).map_err(|e| {
                        AgentError::response_format(format!("undecodable tool arguments: {e}"))
                    })?,
                    other => other.clone(),
                };
                tool_calls.push(ToolCall::new(id, name, arguments));
            }
        }

        Ok(Message::assistant_with_tools(content, tool_calls))
    }
}

/// Encode one message into the chat-completions wire shape.
fn wire_message(msg: &Message) -> Value {
    let role = match msg.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };

    let mut obj = serde_json::json!({ "role": role, "content": msg.content });

    if msg.has_tool_calls() {
        let calls: Vec<Value> = msg
            .tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        obj["tool_calls"] = serde_json::json!(calls);
    }

    if let Some(tool_call_id) = &msg.tool_call_id {
        obj["tool_call_id"] = serde_json::json!(tool_call_id);
    }

    obj
}

#[async_trait]
impl ChatModel for OpenAiModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model))]
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> AgentResult<Message> {
        let body = self.build_request_body(messages, tools);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(messages = messages.len(), tools = tools.len(), "sending completion request");

        let response = self
            .http
            .post(&url)
            .headers(self.auth_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::model(format!(
                "chat completions error ({status}): {error_text}"
            )));
        }

        let json: Value = response.json().await?;
        Self::parse_response(&json)
    }
}
