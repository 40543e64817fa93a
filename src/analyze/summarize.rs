//! Digest prose plus the per-article summary/key-point helpers used by the
//! pipeline. Prompts serialize their inputs in a fixed order so identical
//! batches produce identical prompts, and every LLM call has a deterministic
//! fallback.

use chrono::Utc;

use crate::analyze::llm::LlmClient;
use crate::feed::types::Article;
use crate::store::summaries::SummaryRecord;

/// Word cap hint given to the model for the digest prose.
const DIGEST_WORD_CAP: usize = 350;
/// The templated fallback covers at most this many articles.
const FALLBACK_ARTICLES: usize = 10;
const FALLBACK_SUMMARY_CHARS: usize = 150;

pub fn digest_prompt(articles: &[Article]) -> String {
    let mut prompt = String::from(
        "You are a news assistant writing a daily digest.\nHere are the articles:\n\n",
    );
    for a in articles {
        prompt.push_str(&format!("Title: {}\n", a.title));
        prompt.push_str(&format!("Summary: {}\n", a.description));
        prompt.push_str(&format!("Source: {}\n", a.source));
        prompt.push_str(&format!("Link: {}\n", a.link));
        prompt.push_str(&format!(
            "Published: {}\n",
            a.published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        prompt.push_str(&"-".repeat(50));
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nWrite a neutral-tone overview of today's news, followed by a bulleted list of the \
         top 5 articles. For each bullet give a one-line reason it matters and its link. \
         Keep the whole digest under {DIGEST_WORD_CAP} words.\n"
    ));
    prompt
}

/// Prose digest of the batch; the templated roundup takes over whenever the
/// model is out.
pub async fn summarize(llm: &dyn LlmClient, articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles to summarize.".to_string();
    }
    match llm.complete(&digest_prompt(articles)).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => fallback_digest(articles),
        Err(e) => {
            tracing::warn!(error = ?e, "digest generation failed, using templated roundup");
            fallback_digest(articles)
        }
    }
}

/// Deterministic roundup of the first articles: same inputs, same output.
pub fn fallback_digest(articles: &[Article]) -> String {
    let mut out = String::from("Here are the articles for today:\n\n");
    for a in articles.iter().take(FALLBACK_ARTICLES) {
        out.push_str(&format!("**{}**\n", a.title));
        out.push_str(&format!(
            "Summary: {}\n",
            truncate_chars(&a.description, FALLBACK_SUMMARY_CHARS)
        ));
        out.push_str(&format!("Source: {}\n", a.source));
        out.push_str(&format!("Link: {}\n\n", a.link));
    }
    if articles.len() > FALLBACK_ARTICLES {
        out.push_str(&format!(
            "... and {} more articles.\n",
            articles.len() - FALLBACK_ARTICLES
        ));
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max).collect();
    t.push_str("...");
    t
}

fn article_block(a: &Article) -> String {
    format!("Title: {}\n\nDescription: {}", a.title, a.description)
}

/// One-article summary for the stored summary collection. `None` on model
/// failure; the article simply stays unsummarized until a later run.
pub async fn summarize_article(
    llm: &dyn LlmClient,
    article: &Article,
    max_chars: usize,
    model: &str,
) -> Option<SummaryRecord> {
    if article.title.is_empty() && article.description.is_empty() {
        return None;
    }
    let prompt = format!(
        "Provide a concise summary of the following news article. Focus on the main points \
         and key information. Keep the summary under {max_chars} characters.\n\n\
         Article:\n{}\n\nSummary:",
        article_block(article)
    );
    match llm.complete(&prompt).await {
        Ok(text) => {
            let summary = text.trim().to_string();
            if summary.is_empty() {
                return None;
            }
            Some(SummaryRecord {
                article_id: article.id.clone(),
                word_count: summary.split_whitespace().count(),
                summary,
                generated_at: Utc::now(),
                model: model.to_string(),
            })
        }
        Err(e) => {
            tracing::debug!(error = ?e, article = %article.id, "article summary failed");
            None
        }
    }
}

/// 3-5 key points parsed from bullet lines. Empty on failure.
pub async fn extract_key_points(llm: &dyn LlmClient, article: &Article) -> Vec<String> {
    let prompt = format!(
        "Extract 3-5 key points from the following news article. Present each point on a \
         new line, starting with a bullet point.\n\nArticle:\n{}\n\nKey Points:",
        article_block(article)
    );
    match llm.complete(&prompt).await {
        Ok(text) => text
            .lines()
            .map(|l| l.trim().trim_start_matches(|c| c == '-' || c == '*' || c == '•').trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}
