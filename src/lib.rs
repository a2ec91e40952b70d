//! Salamat Bot - a pharmacy assistant built on a tool-calling agent loop.
//!
//! The agent alternates model reasoning steps with tool execution until the
//! model produces a final answer, bounded by a recursion limit. Conversation
//! state is checkpointed per session key, so a dialog survives process
//! restarts.
//!
//! # Architecture
//!
//! - **Agent** ([`agent`]) - routing, tool dispatch, and the run loop
//! - **Model** ([`model`]) - chat completion boundary and the OpenAI client
//! - **Tools** ([`tool`], [`tools`]) - typed tool trait and the pharmacy set
//! - **Session** ([`session`]) - conversation checkpoint storage
//! - **Catalog** ([`db`], [`index`]) - product/pharmacy store and fuzzy index

pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod message;
pub mod model;
pub mod session;
pub mod tool;
pub mod tools;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{
        AgentError, AgentResult, BotError, ConfigError, ConfigResult, DbError, DbResult, Result,
        StorageError, StorageResult,
    };

    pub use crate::agent::{Orchestrator, RouteDecision, ToolDispatcher, decide};

    pub use crate::message::{Message, MessageRole, ToolCall};

    pub use crate::model::{ChatModel, MockModel, OpenAiModel, ReasoningAdapter};

    pub use crate::tool::{
        FailureKind, Tool, ToolDefinition, ToolDyn, ToolFailure, ToolOutcome, ToolRegistry,
    };

    pub use crate::session::{
        FileStorage, MemoryStorage, Session, SessionData, SessionManager, SessionStorage,
    };

    pub use crate::db::{Database, FeedImporter, FeedItem};

    pub use crate::index::{KeywordIndex, ProductIndex};

    pub use crate::config::{
        AGENT_PROMPT, BotConfig, config_path, init_config, load_config, save_config,
    };
}
