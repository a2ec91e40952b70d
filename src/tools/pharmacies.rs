//! Pharmacy lookup by product.

use crate::db::Database;
use crate::tool::{Tool, ToolFailure};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PharmacyLookupArgs {
    /// Exact or partial product name.
    pub product_name: String,
}

/// Lists the addresses of pharmacies that carry a product.
#[derive(Debug, Clone)]
pub struct PharmacyLookupTool {
    db: Database,
}

impl PharmacyLookupTool {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for PharmacyLookupTool {
    const NAME: &'static str = "find_all_pharmacies_by_product";
    type Args = PharmacyLookupArgs;
    type Output = Vec<String>;

    fn description(&self) -> &str {
        "List the addresses of all pharmacies that have the given product \
         in stock."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolFailure> {
        self.db
            .pharmacies_by_product(&args.product_name)
            .await
            .map_err(|e| ToolFailure::execution(e.to_string()))
    }
}
