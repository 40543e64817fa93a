// src/store/summaries.rs
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    pub article_id: String,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummariesDoc {
    #[serde(default)]
    pub summaries: BTreeMap<String, SummaryRecord>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_summaries: usize,
}

/// Drop summaries whose article is gone from the active set.
pub fn retain_known(
    summaries: BTreeMap<String, SummaryRecord>,
    known_ids: &HashSet<String>,
) -> BTreeMap<String, SummaryRecord> {
    summaries
        .into_iter()
        .filter(|(id, _)| known_ids.contains(id))
        .collect()
}
