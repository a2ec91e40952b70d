//! Domain tools exposed to the pharmacy assistant.

mod catalog;
mod order;
mod pharmacies;
mod phone;
mod price;

pub use catalog::CatalogSearchTool;
pub use order::{CreateOrderTool, DELIVERY_THRESHOLD};
pub use pharmacies::PharmacyLookupTool;
pub use phone::PhoneTool;
pub use price::PriceLookupTool;

use crate::db::Database;
use crate::index::ProductIndex;
use crate::tool::ToolRegistry;
use std::sync::Arc;

/// Build a registry with the full pharmacy tool set.
#[must_use]
pub fn registry(db: Database, index: Arc<dyn ProductIndex>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(PhoneTool);
    registry.register(CatalogSearchTool::new(db.clone(), index));
    registry.register(PharmacyLookupTool::new(db.clone()));
    registry.register(PriceLookupTool::new(db));
    registry.register(CreateOrderTool);
    registry
}
