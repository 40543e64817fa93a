// src/bot/presenter.rs
//! Turns digests into transport-sized message chunks and renders articles
//! for chat delivery.

use crate::feed::types::Article;
use crate::store::summaries::SummaryRecord;

/// Hard per-message character limit (Telegram's cap, a safe floor for most
/// chat platforms).
pub const MAX_MESSAGE_CHARS: usize = 4096;
const SUMMARY_PREVIEW_CHARS: usize = 300;
const PARAGRAPH_SEP: &str = "\n\n";

/// Split `text` into chunks of at most `limit` characters. Paragraphs are
/// packed greedily; a paragraph that alone exceeds the limit is hard-split
/// at the character limit as a last resort. Order is preserved and nothing
/// is dropped: concatenating the chunks, reinserting the separator where a
/// split fell on a paragraph boundary, reproduces the input.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    assert!(limit > 0, "chunk limit must be positive");
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for paragraph in text.split(PARAGRAPH_SEP) {
        let para_len = paragraph.chars().count();

        match current.as_mut() {
            None => {
                if para_len <= limit {
                    current = Some(paragraph.to_string());
                } else {
                    current = Some(hard_split(paragraph, limit, &mut chunks));
                }
            }
            Some(buf) => {
                let buf_len = buf.chars().count();
                if buf_len + PARAGRAPH_SEP.len() + para_len <= limit {
                    buf.push_str(PARAGRAPH_SEP);
                    buf.push_str(paragraph);
                } else {
                    chunks.push(current.take().unwrap_or_default());
                    if para_len <= limit {
                        current = Some(paragraph.to_string());
                    } else {
                        current = Some(hard_split(paragraph, limit, &mut chunks));
                    }
                }
            }
        }
    }

    if let Some(buf) = current {
        chunks.push(buf);
    }
    chunks
}

/// Emit limit-sized slices of an oversized paragraph, returning the final
/// partial slice so following paragraphs can pack onto it.
fn hard_split(paragraph: &str, limit: usize, chunks: &mut Vec<String>) -> String {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut start = 0;
    let mut tail = String::new();
    while start < chars.len() {
        let end = (start + limit).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        if end == chars.len() {
            tail = piece;
        } else {
            chunks.push(piece);
        }
        start = end;
    }
    tail
}

/// Category emoji used in rendered messages.
pub fn category_emoji(category: &str) -> &'static str {
    match category {
        "technology" => "🤖",
        "business" => "💼",
        "science" => "🔬",
        "politics" => "🏛️",
        "entertainment" => "🎬",
        "sports" => "⚽",
        "health" => "🏥",
        "environment" => "🌍",
        _ => "📰",
    }
}

pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// One numbered digest entry, with the stored summary when available.
pub fn format_article(article: &Article, index: usize, summary: Option<&SummaryRecord>) -> String {
    let category = article.category.as_deref().unwrap_or("uncategorized");
    let mut out = format!("*{}. {}*\n\n", index, article.title);
    out.push_str(&format!("📰 Source: {}\n", article.source));
    out.push_str(&format!(
        "{} Category: {}\n",
        category_emoji(category),
        title_case(category)
    ));
    if let Some(ts) = article.published_at {
        out.push_str(&format!("📅 Published: {}\n", ts.format("%Y-%m-%d %H:%M")));
    }
    if let Some(record) = summary {
        out.push_str(&format!(
            "\n📝 Summary: {}\n",
            truncate(&record.summary, SUMMARY_PREVIEW_CHARS)
        ));
    }
    if !article.key_points.is_empty() {
        out.push_str("\n🔑 Key points:\n");
        for point in article.key_points.iter().take(3) {
            out.push_str(&format!("• {point}\n"));
        }
    }
    out.push_str(&format!("\n🔗 [Read full article]({})", article.link));
    out
}
