// src/store/mod.rs
pub mod articles;
pub mod summaries;
pub mod users;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::feed::types::Article;

pub use articles::{merge_articles, retain_recent, ArticlesDoc, MAX_STORED_ARTICLES};
pub use summaries::{SummariesDoc, SummaryRecord};
pub use users::{UserPreference, UsersDoc};

const ARTICLES_FILE: &str = "articles.json";
const SUMMARIES_FILE: &str = "summaries.json";
const USERS_FILE: &str = "users.json";

/// Whole-file JSON persistence for the three collections. Each document is
/// read and rewritten as a unit. Writes go through a temp file + rename so a
/// concurrent reader never sees a truncated document; on overlapping writes
/// the last writer wins (acceptable at this write cadence).
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let _ = fs::create_dir_all(&data_dir); // best-effort
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Missing or unreadable documents yield the default; reads never fail
    /// the caller.
    fn read_doc<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = ?e, file = %path.display(), "corrupt store document, using default");
                    T::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => {
                tracing::warn!(error = ?e, file = %path.display(), "unreadable store document, using default");
                T::default()
            }
        }
    }

    /// Write failures propagate; silent data loss is worse than a visible
    /// error.
    fn write_doc<T: Serialize>(&self, name: &str, doc: &T) -> Result<()> {
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(doc).context("serializing store document")?;
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }

    // ---- articles ----

    pub fn load_articles(&self) -> ArticlesDoc {
        self.read_doc(ARTICLES_FILE)
    }

    pub fn save_articles(&self, articles: Vec<Article>) -> Result<()> {
        let doc = ArticlesDoc {
            total_articles: articles.len(),
            articles,
            last_updated: Some(Utc::now()),
        };
        self.write_doc(ARTICLES_FILE, &doc)
    }

    // ---- summaries ----

    pub fn load_summaries(&self) -> SummariesDoc {
        self.read_doc(SUMMARIES_FILE)
    }

    pub fn save_summaries(&self, summaries: BTreeMap<String, SummaryRecord>) -> Result<()> {
        let doc = SummariesDoc {
            total_summaries: summaries.len(),
            summaries,
            last_updated: Some(Utc::now()),
        };
        self.write_doc(SUMMARIES_FILE, &doc)
    }

    // ---- users ----

    pub fn load_users(&self) -> UsersDoc {
        self.read_doc(USERS_FILE)
    }

    /// Lazy default: unknown users get a fresh preference record.
    pub fn load_user(&self, user_id: i64) -> UserPreference {
        self.load_users()
            .users
            .get(&user_id.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Read-modify-write of the whole users document.
    pub fn save_user(&self, user_id: i64, prefs: UserPreference) -> Result<()> {
        let mut users = self.load_users().users;
        users.insert(user_id.to_string(), prefs);
        let doc = UsersDoc {
            total_users: users.len(),
            users,
            last_updated: Some(Utc::now()),
        };
        self.write_doc(USERS_FILE, &doc)
    }
}
