// src/store/articles.rs
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::types::Article;

/// Active-set cap applied after every merge; whatever sorts as oldest
/// (undated articles included) is dropped beyond it.
pub const MAX_STORED_ARTICLES: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlesDoc {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_articles: usize,
}

/// Merge incoming articles into the existing set. First-seen wins: an id
/// already present keeps its stored copy (category and score included) and
/// the incoming duplicate is discarded. The result is sorted newest first
/// (undated articles compare via an empty key and land at the tail), then
/// capped at `MAX_STORED_ARTICLES`.
pub fn merge_articles(existing: Vec<Article>, incoming: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();
    let mut merged = existing;
    for article in incoming {
        if seen.insert(article.id.clone()) {
            merged.push(article);
        }
    }
    merged.sort_by(|a, b| b.published_key().cmp(&a.published_key()));
    merged.truncate(MAX_STORED_ARTICLES);
    merged
}

/// Retention pass: drop articles published before `now - max_age`. Undated
/// articles are kept. Returns the survivors and the removed count.
pub fn retain_recent(
    articles: Vec<Article>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> (Vec<Article>, usize) {
    let cutoff = now - max_age;
    let before = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|a| match a.published_at {
            Some(ts) => ts > cutoff,
            None => true,
        })
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
