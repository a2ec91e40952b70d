//! Bulk catalog import from the supplier feed.
//!
//! The feed is a JSON document of the shape
//! `{"Products": [{"name", "address", "price", "quantity"?}]}`. Import is
//! idempotent: products, pharmacies, and price links already present are
//! left alone, and items with unparseable prices are skipped with an error
//! log.

use super::Database;
use crate::error::{DbError, DbResult};
use serde::Deserialize;
use tracing::{error, info, instrument};

/// One feed row: a product offered at a pharmacy for a price.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    pub name: String,
    pub address: String,
    /// Price as it arrives from the supplier, a decimal string.
    pub price: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl FeedItem {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            price: price.into(),
            quantity: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "Products", default)]
    products: Vec<FeedItem>,
}

/// Fetches the supplier feed and applies it to the catalog.
#[derive(Debug, Clone)]
pub struct FeedImporter {
    http: reqwest::Client,
    url: String,
}

impl FeedImporter {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Download and decode the feed.
    pub async fn fetch(&self) -> DbResult<Vec<FeedItem>> {
        let response = self.http.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(DbError::Feed(format!(
                "feed returned status {}",
                response.status()
            )));
        }
        let feed: Feed = response
            .json()
            .await
            .map_err(|e| DbError::Feed(e.to_string()))?;
        Ok(feed.products)
    }

    /// Fetch the feed and apply it, returning the number of new price links.
    #[instrument(skip(self, db), fields(url = %self.url))]
    pub async fn run(&self, db: &Database) -> DbResult<usize> {
        let items = self.fetch().await?;
        info!(items = items.len(), "feed fetched");
        db.apply_feed(&items).await
    }
}

impl Database {
    /// Apply a batch of feed items, inserting only unseen products,
    /// pharmacies, and links. Returns the number of links added.
    pub async fn apply_feed(&self, items: &[FeedItem]) -> DbResult<usize> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let mut added = 0usize;

        for item in items {
            let Ok(price) = item.price.trim().parse::<i64>() else {
                error!(
                    product = %item.name,
                    price = %item.price,
                    "skipping feed item with unparseable price"
                );
                continue;
            };

            tx.execute(
                "INSERT OR IGNORE INTO products (name) VALUES (?1)",
                [&item.name],
            )?;
            let product_id: i64 = tx.query_row(
                "SELECT id FROM products WHERE name = ?1",
                [&item.name],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT OR IGNORE INTO pharmacies (address) VALUES (?1)",
                [&item.address],
            )?;
            let pharmacy_id: i64 = tx.query_row(
                "SELECT id FROM pharmacies WHERE address = ?1",
                [&item.address],
                |row| row.get(0),
            )?;

            // Existing links keep their price; INSERT OR IGNORE reports 0
            // changed rows for them.
            let changed = tx.execute(
                "INSERT OR IGNORE INTO pharmacy_products (product_id, pharmacy_id, price)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![product_id, pharmacy_id, price],
            )?;
            added += changed;
        }

        tx.commit()?;
        info!(added, total = items.len(), "feed applied");
        Ok(added)
    }
}
