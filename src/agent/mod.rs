//! Agent run loop: routing, tool dispatch, and the orchestrator.

mod dispatcher;
mod orchestrator;
mod routing;

pub use dispatcher::ToolDispatcher;
pub use orchestrator::Orchestrator;
pub use routing::{RouteDecision, decide};
