//! Catalog search with fuzzy fallback.

use crate::db::Database;
use crate::index::ProductIndex;
use crate::tool::{Tool, ToolFailure};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CatalogSearchArgs {
    /// Product name or part of it, as the client said it.
    pub product_name: String,
}

/// Finds products by name: literal catalog match first, index fallback when
/// the catalog has nothing.
pub struct CatalogSearchTool {
    db: Database,
    index: Arc<dyn ProductIndex>,
}

impl CatalogSearchTool {
    #[must_use]
    pub fn new(db: Database, index: Arc<dyn ProductIndex>) -> Self {
        Self { db, index }
    }
}

impl std::fmt::Debug for CatalogSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSearchTool").finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for CatalogSearchTool {
    const NAME: &'static str = "find_product_in_vector_store";
    type Args = CatalogSearchArgs;
    type Output = Vec<String>;

    fn description(&self) -> &str {
        "Search the catalog for products by name. Returns matching product \
         names, including close matches when there is no exact one."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolFailure> {
        let matches = self
            .db
            .products_by_name(&args.product_name)
            .await
            .map_err(|e| ToolFailure::execution(e.to_string()))?;

        if !matches.is_empty() {
            return Ok(matches);
        }

        debug!(query = %args.product_name, "no literal match, falling back to index");
        Ok(self.index.search(&args.product_name).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::index::KeywordIndex;

    async fn tool() -> CatalogSearchTool {
        let db = test_support::seeded().await;
        let index = KeywordIndex::default();
        index.rebuild(&db.all_products().await.unwrap()).await;
        CatalogSearchTool::new(db, Arc::new(index))
    }

    #[tokio::test]
    async fn literal_match_wins() {
        let tool = tool().await;
        let out = tool
            .call(CatalogSearchArgs {
                product_name: "аспирин".into(),
            })
            .await
            .unwrap();
        assert_eq!(out, vec!["Аспирин 500мг"]);
    }

    #[tokio::test]
    async fn falls_back_to_index_on_fuzzy_query() {
        let tool = tool().await;
        // No substring match, but the index sees a shared token.
        let out = tool
            .call(CatalogSearchArgs {
                product_name: "таблетки аспирин от головы".into(),
            })
            .await
            .unwrap();
        assert_eq!(out, vec!["Аспирин 500мг"]);
    }

    #[tokio::test]
    async fn nothing_anywhere_is_empty() {
        let tool = tool().await;
        let out = tool
            .call(CatalogSearchArgs {
                product_name: "шампунь".into(),
            })
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
