// tests/cleanup_retention.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use news_digest_bot::analyze::llm::DisabledLlm;
use news_digest_bot::config::AppConfig;
use news_digest_bot::feed::fetcher::FeedFetcher;
use news_digest_bot::feed::types::Article;
use news_digest_bot::pipeline::Pipeline;
use news_digest_bot::store::{Store, SummaryRecord};

fn summary_for(article: &Article) -> SummaryRecord {
    SummaryRecord {
        article_id: article.id.clone(),
        summary: format!("Summary of {}", article.title),
        generated_at: Utc::now(),
        model: "test".to_string(),
        word_count: 4,
    }
}

#[tokio::test]
async fn cleanup_drops_old_articles_and_orphaned_summaries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::new(dir.path());

    let mut old = Article::new("A headline from six weeks ago", "https://e.com/old", "Feed");
    old.published_at = Some(Utc::now() - Duration::days(45));
    let mut fresh = Article::new("A headline from last week", "https://e.com/fresh", "Feed");
    fresh.published_at = Some(Utc::now() - Duration::days(10));
    let undated = Article::new("An undated headline survives", "https://e.com/undated", "Feed");

    let mut summaries = BTreeMap::new();
    summaries.insert(old.id.clone(), summary_for(&old));
    summaries.insert(fresh.id.clone(), summary_for(&fresh));

    store
        .save_articles(vec![old.clone(), fresh.clone(), undated.clone()])
        .expect("seed articles");
    store.save_summaries(summaries).expect("seed summaries");

    let cfg = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let pipeline = Pipeline::new(
        cfg,
        store.clone(),
        FeedFetcher::new(StdDuration::from_secs(5)),
        Arc::new(DisabledLlm),
    );

    pipeline.cleanup_once().await.expect("cleanup");

    let doc = store.load_articles();
    let ids: Vec<&str> = doc.articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(doc.articles.len(), 2);
    assert!(ids.contains(&fresh.id.as_str()));
    assert!(ids.contains(&undated.id.as_str()));
    assert!(!ids.contains(&old.id.as_str()));

    // only the surviving article's summary remains
    let summaries = store.load_summaries().summaries;
    assert_eq!(summaries.len(), 1);
    assert!(summaries.contains_key(&fresh.id));
}
