//! The agent run loop.
//!
//! One run handles one user message: reasoning steps alternate with tool
//! dispatch until the model answers without requesting tools, the step
//! limit is hit, or a fatal error ends the run.

use super::dispatcher::ToolDispatcher;
use super::routing::{self, RouteDecision};
use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::model::{ChatModel, ReasoningAdapter};
use crate::session::SessionManager;
use crate::tool::ToolRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Default bound on reasoning steps per run.
pub const DEFAULT_RECURSION_LIMIT: usize = 10;

/// Drives the reasoning/dispatch loop over a session.
///
/// Checkpointing is per completed turn: the session is saved after each
/// assistant+dispatch cycle and after the final answer. A run that dies
/// mid-turn leaves the stored log at the last completed turn.
pub struct Orchestrator<M> {
    adapter: ReasoningAdapter<M>,
    dispatcher: ToolDispatcher,
    sessions: SessionManager,
    recursion_limit: usize,
}

impl<M: std::fmt::Debug> std::fmt::Debug for Orchestrator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("recursion_limit", &self.recursion_limit)
            .finish_non_exhaustive()
    }
}

impl<M: ChatModel> Orchestrator<M> {
    pub fn new(
        model: M,
        registry: Arc<ToolRegistry>,
        sessions: SessionManager,
        system_prompt: impl Into<String>,
    ) -> Self {
        let tools = registry.definitions();
        Self {
            adapter: ReasoningAdapter::new(model, system_prompt, tools),
            dispatcher: ToolDispatcher::new(registry),
            sessions,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Override the default reasoning step bound.
    #[must_use]
    pub const fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    #[must_use]
    pub const fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Access the session manager backing this orchestrator.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run one user message to a final answer.
    pub async fn run(&self, session_key: &str, user_text: &str) -> Result<String> {
        self.run_with_limit(
            session_key,
            user_text,
            self.recursion_limit,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like [`run`](Self::run), but cancellable from the outside.
    pub async fn run_cancellable(
        &self,
        session_key: &str,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.run_with_limit(session_key, user_text, self.recursion_limit, cancel)
            .await
    }

    /// Full-control entry point with an explicit step limit.
    #[instrument(skip_all, fields(session = %session_key, limit = limit))]
    pub async fn run_with_limit(
        &self,
        session_key: &str,
        user_text: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let _guard = self.sessions.run_guard(session_key).await;

        let mut session = self.sessions.get_or_create(session_key).await?;
        session.reset_steps();
        session.push(Message::user(user_text));

        info!(history = session.messages().len(), "run started");

        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled.into());
            }

            if session.step_count() as usize >= limit {
                warn!(limit, "recursion limit reached");
                // The log is whole up to here; keep it for the next run.
                self.sessions.save(&mut session).await?;
                return Err(AgentError::RecursionExceeded(limit).into());
            }

            let reply = self.adapter.complete(session.messages()).await?;
            let calls = reply.tool_calls.clone();
            let answer = reply.content.clone();
            session.push(reply);
            session.bump_step();

            match routing::decide(session.messages()) {
                RouteDecision::Terminate => {
                    self.sessions.save(&mut session).await?;
                    info!(steps = session.step_count(), "run finished");
                    return Ok(answer);
                }
                RouteDecision::Dispatch => {
                    let results = self.dispatcher.dispatch(&calls).await;
                    for result in results {
                        session.push(result);
                    }
                    // Turn complete; checkpoint before the next step.
                    self.sessions.save(&mut session).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::message::{MessageRole, ToolCall};
    use crate::model::MockModel;
    use crate::session::{MemoryStorage, SessionManager};
    use crate::tool::{Tool, ToolFailure, ToolOutcome};
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct LookupArgs {
        name: String,
    }

    struct Lookup;

    #[async_trait]
    impl Tool for Lookup {
        const NAME: &'static str = "lookup";
        type Args = LookupArgs;
        type Output = Vec<String>;

        fn description(&self) -> &str {
            "Look up a product"
        }

        async fn call(&self, args: Self::Args) -> std::result::Result<Vec<String>, ToolFailure> {
            Ok(vec![format!("{} 500mg", args.name)])
        }
    }

    fn orchestrator(model: MockModel) -> Orchestrator<MockModel> {
        let mut registry = ToolRegistry::new();
        registry.register(Lookup);
        let sessions = SessionManager::new(Arc::new(MemoryStorage::new()));
        Orchestrator::new(model, Arc::new(registry), sessions, "you are a pharmacist")
    }

    #[tokio::test]
    async fn direct_answer_without_tools() {
        let model = MockModel::with_replies([Message::assistant("hello")]);
        let orch = orchestrator(model);

        let answer = orch.run("cli", "hi").await.unwrap();
        assert_eq!(answer, "hello");

        let session = orch.sessions().get_or_create("cli").await.unwrap();
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.step_count(), 1);
    }

    #[tokio::test]
    async fn full_loop_with_one_tool_round() {
        let model = MockModel::new();
        model.push_reply(Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "lookup", json!({"name": "aspirin"}))],
        ));
        model.push_reply(Message::assistant("We carry aspirin 500mg."));
        let orch = orchestrator(model);

        let answer = orch.run("cli", "do you have aspirin?").await.unwrap();
        assert_eq!(answer, "We carry aspirin 500mg.");

        let session = orch.sessions().get_or_create("cli").await.unwrap();
        let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant,
            ]
        );
        assert_eq!(session.step_count(), 2);

        let outcome: ToolOutcome =
            serde_json::from_str(&session.messages()[2].content).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data, json!(["aspirin 500mg"]));
    }

    #[tokio::test]
    async fn recursion_limit_fails_exactly_at_bound() {
        // The model asks for tools forever.
        let model = MockModel::new();
        for i in 0..3 {
            model.push_reply(Message::assistant_with_tools(
                "",
                vec![ToolCall::new(
                    format!("call_{i}"),
                    "lookup",
                    json!({"name": "x"}),
                )],
            ));
        }
        let orch = orchestrator(model);

        let err = orch
            .run_with_limit("cli", "loop", 3, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BotError::Agent(AgentError::RecursionExceeded(3))
        ));
        assert_eq!(err.kind(), "recursion_exceeded");

        // State survives the failure: user + 3 * (assistant + tool).
        let session = orch.sessions().get_or_create("cli").await.unwrap();
        assert_eq!(session.messages().len(), 7);
        assert_eq!(session.step_count(), 3);
    }

    #[tokio::test]
    async fn step_count_resets_between_runs() {
        let model = MockModel::new();
        model.push_reply(Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "lookup", json!({"name": "a"}))],
        ));
        model.push_reply(Message::assistant("first answer"));
        model.push_reply(Message::assistant("second answer"));
        let orch = orchestrator(model);

        orch.run_with_limit("cli", "one", 2, &CancellationToken::new())
            .await
            .unwrap();
        // The second run gets the full budget again.
        let answer = orch
            .run_with_limit("cli", "two", 2, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(answer, "second answer");

        let session = orch.sessions().get_or_create("cli").await.unwrap();
        assert_eq!(session.step_count(), 1);
        assert_eq!(session.messages().len(), 6);
    }

    #[tokio::test]
    async fn adapter_failure_rolls_back_to_last_completed_turn() {
        let model = MockModel::new();
        model.push_reply(Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "lookup", json!({"name": "a"}))],
        ));
        model.push_failure(AgentError::response_format("garbage from provider"));
        let orch = orchestrator(model);

        let err = orch.run("cli", "hi").await.unwrap_err();
        assert_eq!(err.kind(), "response_format");

        // Stored log ends at the completed first turn.
        let session = orch.sessions().get_or_create("cli").await.unwrap();
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2].role, MessageRole::Tool);
    }

    #[tokio::test]
    async fn history_grows_append_only_across_runs() {
        let model = MockModel::with_replies([
            Message::assistant("one"),
            Message::assistant("two"),
        ]);
        let orch = orchestrator(model);

        orch.run("cli", "first").await.unwrap();
        let after_first = orch
            .sessions()
            .get_or_create("cli")
            .await
            .unwrap()
            .messages()
            .to_vec();

        orch.run("cli", "second").await.unwrap();
        let after_second = orch
            .sessions()
            .get_or_create("cli")
            .await
            .unwrap()
            .messages()
            .to_vec();

        assert_eq!(after_second.len(), 4);
        assert_eq!(&after_second[..after_first.len()], &after_first[..]);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_run() {
        let model = MockModel::with_replies([Message::assistant("never seen")]);
        let orch = orchestrator(model);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orch
            .run_cancellable("cli", "hi", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }

    #[tokio::test]
    async fn unknown_tool_mid_batch_keeps_run_alive() {
        let model = MockModel::new();
        model.push_reply(Message::assistant_with_tools(
            "",
            vec![
                ToolCall::new("call_1", "lookup", json!({"name": "a"})),
                ToolCall::new("call_2", "not_a_tool", json!({})),
            ],
        ));
        model.push_reply(Message::assistant("handled it"));
        let orch = orchestrator(model);

        let answer = orch.run("cli", "hi").await.unwrap();
        assert_eq!(answer, "handled it");

        let session = orch.sessions().get_or_create("cli").await.unwrap();
        // user, assistant, 2 tool results, assistant
        assert_eq!(session.messages().len(), 5);
        let failed: ToolOutcome = serde_json::from_str(&session.messages()[3].content).unwrap();
        assert!(!failed.success);
    }
}
