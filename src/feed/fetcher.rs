// src/feed/fetcher.rs
use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use metrics::counter;
use tokio::task::JoinSet;

use crate::config::FeedSource;
use crate::feed::parser;
use crate::feed::types::Article;

/// Fetches feed sources over HTTP. Clone is cheap (the reqwest client is
/// reference-counted), which lets `fetch_all` fan out onto spawned tasks.
#[derive(Clone)]
pub struct FeedFetcher {
    http: reqwest::Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-digest-bot/0.1 (feed fetcher)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self { http }
    }

    /// Fetch and parse one source. Non-200 responses and malformed feeds are
    /// errors here; `fetch_all` decides to skip them.
    pub async fn fetch_source(&self, source: &FeedSource) -> Result<Vec<Article>> {
        let resp = self
            .http
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("fetching feed {}", source.name))?;
        if !resp.status().is_success() {
            bail!("feed {} returned HTTP {}", source.name, resp.status());
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading feed body for {}", source.name))?;
        parser::parse_feed(source, &body)
    }

    /// Fan out over all enabled sources concurrently and fan in on
    /// completion. A failing source is logged and skipped, so one bad feed
    /// never aborts the batch; total latency tracks the slowest source, not
    /// the sum. Output order across sources is unspecified.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<Article> {
        let mut set = JoinSet::new();
        for source in sources.iter().filter(|s| s.enabled) {
            let this = self.clone();
            let source = source.clone();
            set.spawn(async move {
                let result = this.fetch_source(&source).await;
                (source, result)
            });
        }

        let mut all = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((source, Ok(mut articles))) => {
                    tracing::debug!(source = %source.name, count = articles.len(), "feed fetched");
                    all.append(&mut articles);
                }
                Ok((source, Err(e))) => {
                    tracing::warn!(error = ?e, source = %source.name, "feed error, skipping source");
                    counter!("feed_fetch_errors_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "feed fetch task failed");
                    counter!("feed_fetch_errors_total").increment(1);
                }
            }
        }

        // The same article can arrive via two feeds; keep the first copy.
        let mut seen: HashSet<String> = HashSet::with_capacity(all.len());
        all.retain(|a| seen.insert(a.id.clone()));
        all
    }
}
