//! Centralized error types.
//!
//! Each subsystem has its own error enum; [`BotError`] consolidates them at
//! the top level. [`BotError::kind`] exposes a stable machine-readable kind
//! string for callers that classify failures without matching variants.

use thiserror::Error;

/// Top-level error for the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Agent loop errors.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// Session checkpoint errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Catalog database errors.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything that doesn't fit above.
    #[error("{0}")]
    Internal(String),
}

impl BotError {
    /// Create a config error from a message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::Invalid(msg.into()))
    }

    /// Create an internal error from a message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error kind string.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Agent(e) => e.kind(),
            Self::Storage(_) => "checkpoint",
            Self::Db(_) => "database",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

/// Errors from the agent run loop and the model boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport or provider failure when calling the model.
    #[error("model error: {0}")]
    Model(String),

    /// The model response could not be decoded into an assistant message.
    /// Fatal for the run; there is no automatic retry.
    #[error("malformed model response: {0}")]
    ResponseFormat(String),

    /// The run hit its reasoning step limit without producing a final answer.
    #[error("recursion limit of {0} reached without a final answer")]
    RecursionExceeded(usize),

    /// The run was cancelled by the caller.
    #[error("run cancelled")]
    Cancelled,

    /// The run exceeded the caller-side deadline.
    #[error("run timed out after {0}s")]
    Timeout(u64),
}

impl AgentError {
    /// Create a model transport error from a message.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a response format error from a message.
    pub fn response_format(msg: impl Into<String>) -> Self {
        Self::ResponseFormat(msg.into())
    }

    /// Stable error kind string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::ResponseFormat(_) => "response_format",
            Self::RecursionExceeded(_) => "recursion_exceeded",
            Self::Cancelled => "cancelled",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Model(err.to_string())
    }
}

/// Errors from session checkpoint storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session not found: {0}")]
    NotFound(String),
}

/// Errors from the catalog database and the feed import.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed feed: {0}")]
    Feed(String),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// Convenience result alias for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Result alias for agent operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result alias for database operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result alias for config operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
