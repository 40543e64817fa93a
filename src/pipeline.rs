//! The fetch → process → persist pipeline and the retention job. Both run
//! from the scheduler, but are plain async methods so tests drive them
//! directly.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::analyze::llm::SharedLlm;
use crate::analyze::{categorize, summarize};
use crate::config::AppConfig;
use crate::feed::fetcher::FeedFetcher;
use crate::feed::parser;
use crate::feed::types::Article;
use crate::store::{articles, summaries, Store};

/// Articles published longer ago than this are dropped by the cleanup job.
pub const RETENTION_DAYS: i64 = 30;
/// Summaries are generated in small batches to stay friendly to the backend.
const SUMMARY_BATCH: usize = 5;
/// Articles scoring below this are not worth storing.
const RELEVANCE_FLOOR: f32 = 0.2;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed news refresh runs.");
        describe_counter!("feed_entries_total", "Entries parsed from feeds.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse errors.");
        describe_counter!(
            "articles_filtered_total",
            "Entries dropped by the validity/relevance filters."
        );
        describe_counter!("articles_new_total", "Articles newly added to the store.");
        describe_counter!("cleanup_removed_total", "Articles removed by retention.");
        describe_counter!("scheduler_task_runs_total", "Scheduled task executions.");
        describe_counter!("scheduler_task_failures_total", "Scheduled task failures.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub fetched: usize,
    pub kept: usize,
    pub new: usize,
    pub total: usize,
}

pub struct Pipeline {
    cfg: AppConfig,
    store: Store,
    fetcher: FeedFetcher,
    llm: SharedLlm,
}

impl Pipeline {
    pub fn new(cfg: AppConfig, store: Store, fetcher: FeedFetcher, llm: SharedLlm) -> Self {
        Self {
            cfg,
            store,
            fetcher,
            llm,
        }
    }

    /// Fetch all feeds, process the batch, and fold it into the store.
    pub async fn refresh_once(&self) -> Result<RefreshReport> {
        let fetched = self.fetcher.fetch_all(&self.cfg.feeds).await;
        self.refresh_with(fetched).await
    }

    /// Same as [`Self::refresh_once`], starting from an already-fetched batch.
    pub async fn refresh_with(&self, fetched: Vec<Article>) -> Result<RefreshReport> {
        ensure_metrics_described();

        let fetched_count = fetched.len();
        if fetched.is_empty() {
            tracing::warn!("no articles fetched from any feed");
            return Ok(RefreshReport::default());
        }

        let processed = self.process_batch(fetched).await;
        let kept = processed.len();

        let existing = self.store.load_articles().articles;
        let existing_ids: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();
        let new = processed
            .iter()
            .filter(|a| !existing_ids.contains(&a.id))
            .count();

        self.generate_missing_summaries(&processed).await?;

        // First-seen wins: the merge never overwrites stored copies.
        let merged = articles::merge_articles(existing, processed);
        let total = merged.len();
        self.store.save_articles(merged)?;

        counter!("pipeline_runs_total").increment(1);
        counter!("articles_new_total").increment(new as u64);
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(fetched = fetched_count, kept, new, total, "news refresh complete");

        Ok(RefreshReport {
            fetched: fetched_count,
            kept,
            new,
            total,
        })
    }

    /// Validity filter, categorization, relevance scoring, key points.
    async fn process_batch(&self, batch: Vec<Article>) -> Vec<Article> {
        let now = Utc::now();
        let mut out = Vec::with_capacity(batch.len());
        let mut filtered = 0usize;

        for mut article in batch {
            if !parser::is_valid_article(&article) {
                filtered += 1;
                continue;
            }
            let category = categorize::categorize(self.llm.as_ref(), &article).await;
            article.category = Some(category);
            article.relevance = relevance_score(&article, now);
            if article.relevance < RELEVANCE_FLOOR {
                filtered += 1;
                continue;
            }
            if article.key_points.is_empty() {
                article.key_points =
                    summarize::extract_key_points(self.llm.as_ref(), &article).await;
            }
            out.push(article);
        }

        counter!("articles_filtered_total").increment(filtered as u64);
        // Most relevant first; the store sort later is by publish time.
        out.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }

    /// Generate summary records for processed articles that don't have one.
    async fn generate_missing_summaries(&self, batch: &[Article]) -> Result<()> {
        let mut doc = self.store.load_summaries();
        let missing: Vec<&Article> = batch
            .iter()
            .filter(|a| !doc.summaries.contains_key(&a.id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        tracing::info!(count = missing.len(), "generating article summaries");
        let mut added = 0usize;
        for chunk in missing.chunks(SUMMARY_BATCH) {
            for article in chunk {
                if let Some(record) = summarize::summarize_article(
                    self.llm.as_ref(),
                    article,
                    self.cfg.summary_max_length,
                    &self.cfg.llm.model,
                )
                .await
                {
                    doc.summaries.insert(record.article_id.clone(), record);
                    added += 1;
                }
            }
        }

        if added > 0 {
            self.store.save_summaries(doc.summaries)?;
        }
        Ok(())
    }

    /// Retention job: drop articles past the window, then their summaries.
    pub async fn cleanup_once(&self) -> Result<()> {
        ensure_metrics_described();

        let now = Utc::now();
        let doc = self.store.load_articles();
        let (kept, removed) =
            articles::retain_recent(doc.articles, now, Duration::days(RETENTION_DAYS));

        let known: HashSet<String> = kept.iter().map(|a| a.id.clone()).collect();
        let remaining = summaries::retain_known(self.store.load_summaries().summaries, &known);

        self.store.save_articles(kept)?;
        self.store.save_summaries(remaining)?;

        counter!("cleanup_removed_total").increment(removed as u64);
        tracing::info!(removed, "cleanup complete");
        Ok(())
    }
}

/// Simple reader-impact prior: fresh, substantial articles from known-good
/// sources float up. Range 0.0..=1.0.
pub fn relevance_score(article: &Article, now: DateTime<Utc>) -> f32 {
    let mut score = 0.0f32;

    if let Some(ts) = article.published_at {
        let days = (now - ts).num_days();
        score += match days {
            d if d <= 1 => 0.3,
            d if d <= 3 => 0.2,
            d if d <= 7 => 0.1,
            _ => 0.0,
        };
    }

    let content_len = article.title.chars().count() + article.description.chars().count();
    if content_len > 200 {
        score += 0.2;
    } else if content_len > 100 {
        score += 0.1;
    }

    const REPUTABLE: &[&str] = &["techcrunch", "ars technica", "the verge", "bbc", "reuters", "wired"];
    let source = article.source.to_lowercase();
    if REPUTABLE.iter().any(|r| source.contains(r)) {
        score += 0.2;
    }

    score.min(1.0)
}
