//! Batch ranking: one prompt enumerating the whole candidate set, a strict
//! JSON contract, and a fully deterministic heuristic when the model is
//! unavailable or misbehaves. The model is advisory only; the output set is
//! always exactly the input set.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::analyze::llm::LlmClient;
use crate::feed::types::Article;

/// Score given to articles the model omitted or mistitled.
pub const NEUTRAL_SCORE: u8 = 5;
const NEUTRAL_REASON: &str = "Not ranked by the model; included for completeness.";

/// An article annotated with a judge score for one digest response. Not
/// persisted anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedArticle {
    pub article: Article,
    /// 1 (minor) to 10 (major reader impact).
    pub score: u8,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct RankingPayload {
    ranked: Vec<RankingEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RankingEntry {
    pub title: String,
    pub score: i64,
    #[serde(default)]
    pub reason: String,
}

/// What we managed to make of the model's reply. Downstream logic branches
/// on this tag, not on error handling.
#[derive(Debug)]
pub enum ModelRanking {
    Parsed(Vec<RankingEntry>),
    Unparseable(String),
}

/// Deterministic prompt: every article field serialized in a fixed order, so
/// identical inputs produce identical prompts.
pub fn ranking_prompt(articles: &[Article]) -> String {
    let mut prompt = String::from(
        "You are a news editor judging the reader impact of today's articles.\n\
         Rate each article from 1 (minor) to 10 (major) and give a one-line reason.\n\
         Articles:\n\n",
    );
    for (i, a) in articles.iter().enumerate() {
        prompt.push_str(&format!("{}. Title: {}\n", i + 1, a.title));
        prompt.push_str(&format!("   Summary: {}\n", a.description));
        prompt.push_str(&format!("   Source: {}\n", a.source));
        prompt.push_str(&format!(
            "   Published: {}\n\n",
            a.published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        ));
    }
    prompt.push_str(
        "Respond with ONLY a JSON object of the form\n\
         {\"ranked\": [{\"title\": \"...\", \"score\": 7, \"reason\": \"...\"}]}\n\
         listing every article exactly once, most impactful first.",
    );
    prompt
}

/// Parse the model's reply. Tolerates code-fence wrapping; when direct parse
/// fails, extracts the first balanced `{...}` object and retries.
pub fn parse_ranking(raw: &str) -> ModelRanking {
    let text = strip_code_fences(raw);
    if let Ok(payload) = serde_json::from_str::<RankingPayload>(text) {
        return ModelRanking::Parsed(payload.ranked);
    }
    if let Some(obj) = first_balanced_object(text) {
        if let Ok(payload) = serde_json::from_str::<RankingPayload>(obj) {
            return ModelRanking::Parsed(payload.ranked);
        }
    }
    ModelRanking::Unparseable(raw.to_string())
}

fn strip_code_fences(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(|c| c == '\r' || c == '\n');
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// First balanced top-level JSON object in `s`, string-literal aware.
fn first_balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rank `articles` by expected reader impact. `top_n` truncates the final
/// ordering only; the model always sees the full candidate set.
pub async fn rank(
    llm: &dyn LlmClient,
    articles: Vec<Article>,
    top_n: Option<usize>,
) -> Vec<RankedArticle> {
    rank_at(llm, articles, top_n, Utc::now()).await
}

/// Same as [`rank`] with an explicit reference time for the heuristic path.
pub async fn rank_at(
    llm: &dyn LlmClient,
    articles: Vec<Article>,
    top_n: Option<usize>,
    now: DateTime<Utc>,
) -> Vec<RankedArticle> {
    if articles.is_empty() {
        return Vec::new();
    }

    let prompt = ranking_prompt(&articles);
    let mut ranked = match llm.complete(&prompt).await {
        Ok(raw) => match parse_ranking(&raw) {
            ModelRanking::Parsed(entries) => apply_model_ranking(articles, entries),
            ModelRanking::Unparseable(raw) => {
                tracing::warn!(reply_len = raw.len(), "unparseable ranking reply, using heuristic");
                heuristic_rank(articles, now)
            }
        },
        Err(e) => {
            tracing::warn!(error = ?e, "llm ranking failed, using heuristic");
            heuristic_rank(articles, now)
        }
    };

    if let Some(n) = top_n {
        ranked.truncate(n);
    }
    ranked
}

/// Match model entries to inputs by exact title, consuming each input at
/// most once. Inputs the model missed (or mistitled) are appended afterward
/// in their original order with a neutral score.
fn apply_model_ranking(articles: Vec<Article>, entries: Vec<RankingEntry>) -> Vec<RankedArticle> {
    let mut remaining: Vec<Option<Article>> = articles.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(remaining.len());

    for entry in entries {
        let idx = remaining
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|a| a.title == entry.title));
        if let Some(idx) = idx {
            if let Some(article) = remaining[idx].take() {
                let reason = if entry.reason.trim().is_empty() {
                    NEUTRAL_REASON.to_string()
                } else {
                    entry.reason
                };
                out.push(RankedArticle {
                    article,
                    score: entry.score.clamp(1, 10) as u8,
                    reason,
                });
            }
        }
    }

    for slot in remaining {
        if let Some(article) = slot {
            out.push(RankedArticle {
                article,
                score: NEUTRAL_SCORE,
                reason: NEUTRAL_REASON.to_string(),
            });
        }
    }
    out
}

/// Deterministic fallback ordering: a recency component (10 minus age in
/// hours over 12, floored at zero) plus a content-richness component
/// (description length capped at 300 chars, divided by 100). No randomness
/// anywhere on this path; identical inputs give identical output.
pub fn heuristic_rank(articles: Vec<Article>, now: DateTime<Utc>) -> Vec<RankedArticle> {
    let mut scored: Vec<(f64, Article)> = articles
        .into_iter()
        .map(|a| (heuristic_score(&a, now), a))
        .collect();
    // Stable sort: equal scores keep input order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .map(|(score, article)| RankedArticle {
            article,
            score: (score.round() as i64).clamp(1, 10) as u8,
            reason: format!("Heuristic: recency and content depth ({score:.1})"),
        })
        .collect()
}

pub fn heuristic_score(article: &Article, now: DateTime<Utc>) -> f64 {
    let recency = match article.published_at {
        Some(ts) => {
            let age_hours = (now - ts).num_seconds().max(0) as f64 / 3600.0;
            (10.0 - age_hours / 12.0).max(0.0)
        }
        None => 0.0,
    };
    let richness = article.description.chars().count().min(300) as f64 / 100.0;
    recency + richness
}
