//! Product index: the fallback search used when a literal catalog lookup
//! finds nothing.
//!
//! [`ProductIndex`] is the seam where a hosted vector store would plug in.
//! The shipped [`KeywordIndex`] is a deterministic in-memory token-overlap
//! scorer, good enough for fuzzy product queries and for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Searchable index over product names.
#[async_trait]
pub trait ProductIndex: Send + Sync {
    /// Best-matching product names for a free-form query.
    async fn search(&self, query: &str) -> Vec<String>;

    /// Replace the indexed names wholesale.
    async fn rebuild(&self, names: &[String]);
}

/// In-memory keyword index scoring by shared lowercase tokens.
#[derive(Debug)]
pub struct KeywordIndex {
    entries: RwLock<Vec<String>>,
    max_results: usize,
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::new(5)
    }
}

impl KeywordIndex {
    #[must_use]
    pub fn new(max_results: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_results,
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn score(query_tokens: &[String], name: &str) -> usize {
        let name_lower = name.to_lowercase();
        let name_tokens = Self::tokens(name);
        query_tokens
            .iter()
            .map(|qt| {
                if name_tokens.iter().any(|nt| nt == qt) {
                    // Exact token match outweighs a substring hit.
                    2
                } else if name_lower.contains(qt.as_str()) {
                    1
                } else {
                    0
                }
            })
            .sum()
    }
}

#[async_trait]
impl ProductIndex for KeywordIndex {
    async fn search(&self, query: &str) -> Vec<String> {
        let query_tokens = Self::tokens(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let entries = self.entries.read().await;
        let mut scored: Vec<(usize, &String)> = entries
            .iter()
            .map(|name| (Self::score(&query_tokens, name), name))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(self.max_results)
            .map(|(_, name)| name.clone())
            .collect()
    }

    async fn rebuild(&self, names: &[String]) {
        let mut entries = self.entries.write().await;
        entries.clear();
        entries.extend_from_slice(names);
        debug!(entries = entries.len(), "product index rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn index() -> KeywordIndex {
        let idx = KeywordIndex::default();
        idx.rebuild(&[
            "Аспирин 500мг".to_string(),
            "Аспирин Кардио 100мг".to_string(),
            "Парацетамол 200мг".to_string(),
            "Ибупрофен 400мг".to_string(),
        ])
        .await;
        idx
    }

    #[tokio::test]
    async fn exact_token_ranks_first() {
        let idx = index().await;
        let hits = idx.search("аспирин кардио").await;
        assert_eq!(hits[0], "Аспирин Кардио 100мг");
        assert!(hits.contains(&"Аспирин 500мг".to_string()));
    }

    #[tokio::test]
    async fn no_overlap_is_empty() {
        let idx = index().await;
        assert!(idx.search("шампунь").await.is_empty());
        assert!(idx.search("").await.is_empty());
    }

    #[tokio::test]
    async fn rebuild_replaces_entries() {
        let idx = index().await;
        idx.rebuild(&["Цитрамон".to_string()]).await;
        assert!(idx.search("аспирин").await.is_empty());
        assert_eq!(idx.search("цитрамон").await, vec!["Цитрамон"]);
    }

    #[tokio::test]
    async fn result_count_is_bounded() {
        let idx = KeywordIndex::new(2);
        idx.rebuild(&[
            "Аспирин 100мг".to_string(),
            "Аспирин 200мг".to_string(),
            "Аспирин 500мг".to_string(),
        ])
        .await;
        assert_eq!(idx.search("аспирин").await.len(), 2);
    }
}
