//! Catalog store: products, pharmacies, and prices in SQLite.

pub mod import;

pub use import::{FeedImporter, FeedItem};

use crate::error::DbResult;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS pharmacies (
    id INTEGER PRIMARY KEY,
    address TEXT NOT NULL UNIQUE,
    phone TEXT
);
CREATE TABLE IF NOT EXISTS pharmacy_products (
    id INTEGER PRIMARY KEY,
    product_id INTEGER NOT NULL REFERENCES products(id),
    pharmacy_id INTEGER NOT NULL REFERENCES pharmacies(id),
    price INTEGER NOT NULL,
    UNIQUE(product_id, pharmacy_id)
);
";

/// Async facade over the SQLite catalog.
///
/// Cheap to clone; all clones share one connection behind an async mutex.
/// Substring matches fold case in Rust because SQLite's LIKE only folds
/// ASCII and the catalog is mostly Cyrillic.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the catalog at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory catalog. Used by tests and `status` checks.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Product names matching a case-insensitive substring, sorted.
    pub async fn products_by_name(&self, fragment: &str) -> DbResult<Vec<String>> {
        let needle = fragment.to_lowercase();
        let names: Vec<String> = self
            .all_products()
            .await?
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();
        debug!(fragment, matches = names.len(), "product lookup");
        Ok(names)
    }

    /// All product names, sorted. Feeds the product index rebuild.
    pub async fn all_products(&self) -> DbResult<Vec<String>> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare("SELECT name FROM products ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Addresses of pharmacies carrying a product (substring match).
    pub async fn pharmacies_by_product(&self, product: &str) -> DbResult<Vec<String>> {
        let needle = product.to_lowercase();
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT p.name, ph.address
             FROM pharmacy_products pp
             JOIN products p ON p.id = pp.product_id
             JOIN pharmacies ph ON ph.id = pp.pharmacy_id
             ORDER BY ph.address",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut addresses = Vec::new();
        for row in rows {
            let (name, address) = row?;
            if name.to_lowercase().contains(&needle) && !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    /// Price of a product in a specific pharmacy. `None` when the product,
    /// the pharmacy, or the link between them is missing.
    pub async fn price(&self, product: &str, address: &str) -> DbResult<Option<i64>> {
        let needle = product.to_lowercase();
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT p.name, pp.price
             FROM pharmacy_products pp
             JOIN products p ON p.id = pp.product_id
             JOIN pharmacies ph ON ph.id = pp.pharmacy_id
             WHERE ph.address = ?1",
        )?;
        let rows = stmt.query_map(params![address], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (name, price) = row?;
            if name.to_lowercase().contains(&needle) {
                return Ok(Some(price));
            }
        }
        Ok(None)
    }

    /// Phone number of a pharmacy, when known.
    pub async fn pharmacy_phone(&self, address: &str) -> DbResult<Option<String>> {
        let conn = self.lock().await;
        let phone = conn
            .query_row(
                "SELECT phone FROM pharmacies WHERE address = ?1",
                params![address],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(phone.flatten())
    }

    /// Row counts for products, pharmacies, and price links.
    pub async fn stats(&self) -> DbResult<(u64, u64, u64)> {
        let conn = self.lock().await;
        let count = |table: &str| -> DbResult<u64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get::<_, i64>(0)
            })? as u64)
        };
        Ok((
            count("products")?,
            count("pharmacies")?,
            count("pharmacy_products")?,
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::import::FeedItem;

    /// In-memory catalog with a small fixed inventory.
    pub async fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let items = vec![
            FeedItem::new("Аспирин 500мг", "ул. Абая 10", "1200"),
            FeedItem::new("Аспирин 500мг", "пр. Достык 5", "1250"),
            FeedItem::new("Парацетамол 200мг", "ул. Абая 10", "800"),
        ];
        db.apply_feed(&items).await.unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn substring_product_lookup_is_case_insensitive() {
        let db = test_support::seeded().await;
        let names = db.products_by_name("аспирин").await.unwrap();
        assert_eq!(names, vec!["Аспирин 500мг"]);

        let none = db.products_by_name("ибупрофен").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn pharmacies_for_product() {
        let db = test_support::seeded().await;
        let addresses = db.pharmacies_by_product("аспирин").await.unwrap();
        assert_eq!(addresses, vec!["пр. Достык 5", "ул. Абая 10"]);

        let one = db.pharmacies_by_product("парацетамол").await.unwrap();
        assert_eq!(one, vec!["ул. Абая 10"]);
    }

    #[tokio::test]
    async fn price_lookup() {
        let db = test_support::seeded().await;
        assert_eq!(db.price("аспирин", "ул. Абая 10").await.unwrap(), Some(1200));
        assert_eq!(db.price("аспирин", "пр. Достык 5").await.unwrap(), Some(1250));

        // Pharmacy exists, product not linked there.
        assert_eq!(db.price("парацетамол", "пр. Достык 5").await.unwrap(), None);
        // Unknown pharmacy.
        assert_eq!(db.price("аспирин", "nowhere").await.unwrap(), None);
    }

    #[tokio::test]
    async fn stats_reflect_inventory() {
        let db = test_support::seeded().await;
        assert_eq!(db.stats().await.unwrap(), (2, 2, 3));
    }
}
