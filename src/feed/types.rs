// src/feed/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Normalized unit of scraped news content. `id` is derived from link+title,
/// so re-fetching the same entry always produces the same identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Assigned by the categorizer after fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Assigned by the relevance heuristic after fetch, 0.0..=1.0.
    #[serde(default)]
    pub relevance: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
}

impl Article {
    pub fn new(title: &str, link: &str, source: &str) -> Self {
        Self {
            id: article_id(link, title),
            title: title.to_string(),
            link: link.to_string(),
            description: String::new(),
            source: source.to_string(),
            author: None,
            published_at: None,
            category: None,
            relevance: 0.0,
            key_points: Vec::new(),
        }
    }

    /// Sort key for newest-first ordering. Undated articles map to the empty
    /// string, which sorts below every RFC 3339 timestamp, so they end up
    /// last when sorting descending.
    pub fn published_key(&self) -> String {
        self.published_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    }
}

/// Stable content-derived identifier: SHA-256 over `link:title`, truncated to
/// 32 hex chars.
pub fn article_id(link: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(b":");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_and_link_title_sensitive() {
        let a = article_id("https://example.com/a", "Title");
        let b = article_id("https://example.com/a", "Title");
        let c = article_id("https://example.com/b", "Title");
        let d = article_id("https://example.com/a", "Other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn undated_articles_sort_with_empty_key() {
        let a = Article::new("Some headline here", "https://example.com/a", "Feed");
        assert_eq!(a.published_key(), "");
    }
}
