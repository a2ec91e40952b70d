//! Conversation session persistence.

mod manager;
mod storage;

pub use manager::{Session, SessionManager};
pub use storage::{FileStorage, MemoryStorage, SessionData, SessionStorage};
