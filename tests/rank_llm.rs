// tests/rank_llm.rs
use std::collections::HashSet;

use chrono::{Duration, Utc};
use news_digest_bot::analyze::llm::ScriptedLlm;
use news_digest_bot::analyze::rank::{rank_at, NEUTRAL_SCORE};
use news_digest_bot::feed::types::Article;

fn batch() -> Vec<Article> {
    (0..4)
        .map(|n| {
            let mut a = Article::new(
                &format!("Ranking test headline {n}"),
                &format!("https://example.com/rank/{n}"),
                "Feed",
            );
            a.description = format!("Story body {n}");
            a.published_at = Some(Utc::now() - Duration::hours(n as i64));
            a
        })
        .collect()
}

#[tokio::test]
async fn model_order_is_applied_and_scores_clamped() {
    let llm = ScriptedLlm::new();
    llm.push_ok(
        r#"{"ranked": [
            {"title": "Ranking test headline 2", "score": 99, "reason": "big"},
            {"title": "Ranking test headline 0", "score": 7, "reason": "solid"},
            {"title": "Ranking test headline 1", "score": 0, "reason": "meh"},
            {"title": "Ranking test headline 3", "score": 4, "reason": "minor"}
        ]}"#,
    );

    let ranked = rank_at(&llm, batch(), None, Utc::now()).await;
    assert_eq!(ranked[0].article.title, "Ranking test headline 2");
    assert_eq!(ranked[0].score, 10); // clamped from 99
    assert_eq!(ranked[2].score, 1); // clamped from 0
    assert_eq!(ranked.len(), 4);
}

#[tokio::test]
async fn omitted_and_mistitled_articles_are_backfilled() {
    let llm = ScriptedLlm::new();
    // model drops headline 3 entirely and invents a title
    llm.push_ok(
        r#"{"ranked": [
            {"title": "Ranking test headline 1", "score": 9, "reason": "top"},
            {"title": "A title nobody published", "score": 8, "reason": "ghost"},
            {"title": "Ranking test headline 0", "score": 6, "reason": "ok"}
        ]}"#,
    );

    let input = batch();
    let input_ids: HashSet<String> = input.iter().map(|a| a.id.clone()).collect();
    let ranked = rank_at(&llm, input, None, Utc::now()).await;

    // no article is ever silently dropped
    let output_ids: HashSet<String> = ranked.iter().map(|r| r.article.id.clone()).collect();
    assert_eq!(input_ids, output_ids);

    // the two backfilled articles carry the neutral score, in input order
    assert_eq!(ranked[2].article.title, "Ranking test headline 2");
    assert_eq!(ranked[2].score, NEUTRAL_SCORE);
    assert_eq!(ranked[3].article.title, "Ranking test headline 3");
    assert_eq!(ranked[3].score, NEUTRAL_SCORE);
}

#[tokio::test]
async fn fenced_json_is_accepted() {
    let llm = ScriptedLlm::new();
    llm.push_ok(
        "```json\n{\"ranked\": [{\"title\": \"Ranking test headline 0\", \"score\": 8, \"reason\": \"x\"}]}\n```",
    );
    let ranked = rank_at(&llm, batch(), None, Utc::now()).await;
    assert_eq!(ranked[0].article.title, "Ranking test headline 0");
    assert_eq!(ranked[0].score, 8);
    assert_eq!(ranked.len(), 4);
}

#[tokio::test]
async fn fallback_is_deterministic_for_identical_batches() {
    let now = Utc::now();

    let llm = ScriptedLlm::new();
    llm.push_err("model down");
    let first = rank_at(&llm, batch(), None, now).await;

    let llm = ScriptedLlm::new();
    llm.push_err("model down");
    let second = rank_at(&llm, batch(), None, now).await;

    let a: Vec<(&str, u8)> = first.iter().map(|r| (r.article.title.as_str(), r.score)).collect();
    let b: Vec<(&str, u8)> = second.iter().map(|r| (r.article.title.as_str(), r.score)).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn prose_reply_falls_back_to_heuristic_with_full_set() {
    let llm = ScriptedLlm::new();
    llm.push_ok("Sorry, I cannot produce JSON today.");
    let ranked = rank_at(&llm, batch(), None, Utc::now()).await;
    assert_eq!(ranked.len(), 4);
    // freshest article wins on the recency component
    assert_eq!(ranked[0].article.title, "Ranking test headline 0");
}

#[tokio::test]
async fn top_n_truncates_after_ranking() {
    let llm = ScriptedLlm::new();
    // model only mentions one article; top_n=2 must still see backfill first
    llm.push_ok(r#"{"ranked": [{"title": "Ranking test headline 3", "score": 9, "reason": "x"}]}"#);
    let ranked = rank_at(&llm, batch(), Some(2), Utc::now()).await;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].article.title, "Ranking test headline 3");
    // second slot is the first backfilled input, not a dropped set
    assert_eq!(ranked[1].article.title, "Ranking test headline 0");
    assert_eq!(ranked[1].score, NEUTRAL_SCORE);
}

#[tokio::test]
async fn empty_input_never_calls_the_model() {
    let llm = ScriptedLlm::new();
    let ranked = rank_at(&llm, Vec::new(), None, Utc::now()).await;
    assert!(ranked.is_empty());
    assert!(llm.prompts().is_empty());
}
