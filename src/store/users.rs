// src/store/users.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFERRED_CATEGORY: &str = "technology";
pub const DEFAULT_MAX_ARTICLES: usize = 5;

/// Per-user record, created lazily with defaults on first access and never
/// deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreference {
    pub preferred_category: String,
    pub max_articles: usize,
    #[serde(default)]
    pub articles_read: u64,
    #[serde(default)]
    pub articles_saved: u64,
    #[serde(default)]
    pub saved_articles: Vec<String>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl Default for UserPreference {
    fn default() -> Self {
        Self {
            preferred_category: DEFAULT_PREFERRED_CATEGORY.to_string(),
            max_articles: DEFAULT_MAX_ARTICLES,
            articles_read: 0,
            articles_saved: 0,
            saved_articles: Vec::new(),
            last_active: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersDoc {
    #[serde(default)]
    pub users: BTreeMap<String, UserPreference>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_users: usize,
}
