// tests/store_merge.rs
use std::collections::HashSet;

use chrono::{Duration, Utc};
use news_digest_bot::feed::types::Article;
use news_digest_bot::store::{merge_articles, MAX_STORED_ARTICLES};

fn article(n: u32, hours_ago: Option<i64>) -> Article {
    let mut a = Article::new(
        &format!("Merge test headline {n}"),
        &format!("https://example.com/{n}"),
        "Feed",
    );
    a.published_at = hours_ago.map(|h| Utc::now() - Duration::hours(h));
    a
}

#[test]
fn merge_is_the_union_of_identifiers() {
    let a = vec![article(1, Some(1)), article(2, Some(2))];
    let b = vec![article(2, Some(2)), article(3, Some(3))];

    let merged = merge_articles(a, b);
    let ids: HashSet<&str> = merged.iter().map(|x| x.id.as_str()).collect();
    assert_eq!(merged.len(), 3);
    assert_eq!(ids.len(), 3);
}

#[test]
fn duplicate_identifier_keeps_the_existing_copy() {
    let mut stored = article(1, Some(5));
    stored.category = Some("science".to_string());
    stored.relevance = 0.9;

    let mut refetched = article(1, Some(5));
    refetched.category = Some("business".to_string());
    refetched.relevance = 0.1;

    let merged = merge_articles(vec![stored], vec![refetched]);
    assert_eq!(merged.len(), 1);
    // first-seen wins: category and score never updated by a later fetch
    assert_eq!(merged[0].category.as_deref(), Some("science"));
    assert!((merged[0].relevance - 0.9).abs() < f32::EPSILON);
}

#[test]
fn result_is_sorted_newest_first_with_undated_last() {
    let merged = merge_articles(
        vec![article(1, None), article(2, Some(48))],
        vec![article(3, Some(1))],
    );
    assert_eq!(merged[0].id, article(3, None).id);
    assert_eq!(merged[1].id, article(2, None).id);
    assert_eq!(merged[2].id, article(1, None).id);
}

#[test]
fn merge_never_exceeds_the_cap_and_drops_oldest_first() {
    let existing: Vec<Article> = (0..900).map(|n| article(n, Some(n as i64))).collect();
    let incoming: Vec<Article> = (900..1100)
        .map(|n| {
            // fifty undated articles in the incoming batch
            let dated = if n % 4 == 0 { None } else { Some(n as i64) };
            article(n, dated)
        })
        .collect();

    let merged = merge_articles(existing, incoming);
    assert_eq!(merged.len(), MAX_STORED_ARTICLES);
    // undated articles sort as oldest, so none survive a 100-article overflow
    assert!(merged.iter().all(|a| a.published_at.is_some()));
}

#[test]
fn merging_empty_batches_is_identity() {
    let a = vec![article(1, Some(1))];
    assert_eq!(merge_articles(a.clone(), Vec::new()).len(), 1);
    assert_eq!(merge_articles(Vec::new(), a).len(), 1);
    assert!(merge_articles(Vec::new(), Vec::new()).is_empty());
}
