//! Price lookup for a product in a specific pharmacy.

use crate::db::Database;
use crate::tool::{Tool, ToolFailure};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PriceLookupArgs {
    /// Exact or partial product name.
    pub product_name: String,
    /// Pharmacy address exactly as returned by the pharmacy lookup.
    pub address: String,
}

/// Returns the price of a product at one pharmacy, or `null` when either
/// side (or the link between them) is unknown.
#[derive(Debug, Clone)]
pub struct PriceLookupTool {
    db: Database,
}

impl PriceLookupTool {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for PriceLookupTool {
    const NAME: &'static str = "get_current_price_for_product";
    type Args = PriceLookupArgs;
    type Output = Option<i64>;

    fn description(&self) -> &str {
        "Get the current price of a product at the pharmacy with the given \
         address. Returns null if the pharmacy does not carry it."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolFailure> {
        self.db
            .price(&args.product_name, &args.address)
            .await
            .map_err(|e| ToolFailure::execution(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn known_link_has_price() {
        let tool = PriceLookupTool::new(test_support::seeded().await);
        let out = tool
            .call(PriceLookupArgs {
                product_name: "аспирин".into(),
                address: "ул. Абая 10".into(),
            })
            .await
            .unwrap();
        assert_eq!(out, Some(1200));
    }

    #[tokio::test]
    async fn missing_link_is_null() {
        let tool = PriceLookupTool::new(test_support::seeded().await);
        let out = tool
            .call(PriceLookupArgs {
                product_name: "парацетамол".into(),
                address: "пр. Достык 5".into(),
            })
            .await
            .unwrap();
        assert_eq!(out, None);
    }
}
