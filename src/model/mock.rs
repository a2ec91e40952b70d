//! Scripted model for tests.

use super::ChatModel;
use crate::error::{AgentError, AgentResult};
use crate::message::Message;
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`ChatModel`] that replays a fixed script of replies.
///
/// Each `complete` call pops the next scripted step. Running past the end of
/// the script yields a model error, which surfaces scripting mistakes in
/// tests instead of hanging them.
#[derive(Debug, Default)]
pub struct MockModel {
    script: Mutex<VecDeque<AgentResult<Message>>>,
    calls: AtomicUsize,
}

impl MockModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence of assistant replies.
    #[must_use]
    pub fn with_replies(replies: impl IntoIterator<Item = Message>) -> Self {
        let model = Self::new();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    /// Queue a scripted reply.
    pub fn push_reply(&self, reply: Message) {
        self.script.lock().expect("script lock").push_back(Ok(reply));
    }

    /// Queue a scripted failure.
    pub fn push_failure(&self, error: AgentError) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Err(error));
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> AgentResult<Message> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::model("mock script exhausted")))
    }
}
