//! Two-tier topic assignment: cheap keyword scoring decides the common case,
//! the LLM only sees articles where keyword confidence is low.

use crate::analyze::llm::LlmClient;
use crate::feed::types::Article;

pub const DEFAULT_CATEGORY: &str = "other";

/// Keyword hits required before the keyword winner is trusted without
/// consulting the LLM.
pub const CONFIDENT_MATCHES: usize = 2;

/// Fixed keyword table. Ties between categories resolve in table order.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["ai", "artificial intelligence", "machine learning", "tech", "software", "hardware", "startup", "innovation"],
    ),
    (
        "business",
        &["business", "finance", "economy", "market", "investment", "company", "corporate", "startup"],
    ),
    (
        "science",
        &["science", "research", "study", "discovery", "scientific", "experiment", "laboratory"],
    ),
    (
        "politics",
        &["politics", "government", "election", "policy", "political", "congress", "senate", "president"],
    ),
    (
        "entertainment",
        &["movie", "film", "music", "celebrity", "entertainment", "hollywood", "streaming"],
    ),
    (
        "sports",
        &["sports", "football", "basketball", "baseball", "soccer", "athlete", "game", "championship"],
    ),
    (
        "health",
        &["health", "medical", "medicine", "disease", "treatment", "hospital", "doctor", "patient"],
    ),
    (
        "environment",
        &["environment", "climate", "weather", "pollution", "sustainability", "green", "renewable"],
    ),
];

/// Count keyword hits per category over the lowercased content and return
/// the best `(category, hits)`. `None` when nothing matched at all.
pub fn keyword_category(content: &str) -> Option<(&'static str, usize)> {
    let content = content.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for &(category, keywords) in CATEGORY_KEYWORDS {
        let hits = keywords.iter().filter(|k| content.contains(*k)).count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((category, hits));
        }
    }
    best
}

fn categorization_prompt(title: &str, description: &str) -> String {
    let mut prompt = String::from("Categorize the following news article into one of these categories:\n");
    for (category, _) in CATEGORY_KEYWORDS {
        prompt.push_str(&format!("- {category}\n"));
    }
    prompt.push_str("- other\n\n");
    prompt.push_str(&format!("Title: {title}\n\nDescription: {description}\n\n"));
    prompt.push_str("Respond with the category name only.");
    prompt
}

/// Assign a topic label. Keyword winners with at least `CONFIDENT_MATCHES`
/// hits short-circuit; otherwise the LLM gets a shot, its trimmed lowercase
/// reply taken verbatim. Any LLM failure falls back to the keyword winner,
/// or to `DEFAULT_CATEGORY` when there was none.
pub async fn categorize(llm: &dyn LlmClient, article: &Article) -> String {
    let content = format!("{} {}", article.title, article.description);
    let keyword = keyword_category(&content);

    if let Some((category, hits)) = keyword {
        if hits >= CONFIDENT_MATCHES {
            return category.to_string();
        }
    }

    match llm
        .complete(&categorization_prompt(&article.title, &article.description))
        .await
    {
        Ok(reply) => {
            let category = reply.trim().to_lowercase();
            if !category.is_empty() {
                return category;
            }
            fallback_category(keyword)
        }
        Err(e) => {
            tracing::debug!(error = ?e, article = %article.id, "llm categorization failed");
            fallback_category(keyword)
        }
    }
}

fn fallback_category(keyword: Option<(&'static str, usize)>) -> String {
    keyword
        .map(|(c, _)| c.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}
