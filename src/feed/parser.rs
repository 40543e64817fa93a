// src/feed/parser.rs
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::config::FeedSource;
use crate::feed::normalize_text;
use crate::feed::types::{article_id, Article};

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<String>,
    author: Option<AtomAuthor>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    // Feeds commonly use the obsolete "GMT"/"UT" zone names, which strict
    // RFC 2822 parsing rejects.
    let ts = ts.trim();
    let normalized = ts
        .strip_suffix("GMT")
        .or_else(|| ts.strip_suffix("UTC"))
        .or_else(|| ts.strip_suffix("UT"))
        .map(|head| format!("{} +0000", head.trim_end()));
    let candidate = normalized.as_deref().unwrap_or(ts);
    OffsetDateTime::parse(candidate, &Rfc2822)
        .ok()
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
}

/// Parse one feed document into articles. Tries RSS 2.0 first, then Atom.
/// Entries without a title or link are dropped; other missing fields degrade
/// to empty/None.
pub fn parse_feed(source: &FeedSource, body: &str) -> Result<Vec<Article>> {
    let t0 = std::time::Instant::now();
    let xml = scrub_html_entities_for_xml(body);

    let articles = if let Ok(rss) = from_str::<Rss>(&xml) {
        rss_articles(source, rss)
    } else {
        let atom: AtomFeed =
            from_str(&xml).with_context(|| format!("parsing feed {} as rss or atom", source.name))?;
        atom_articles(source, atom)
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(articles.len() as u64);
    Ok(articles)
}

fn rss_articles(source: &FeedSource, rss: Rss) -> Vec<Article> {
    let mut out = Vec::with_capacity(rss.channel.items.len());
    for item in rss.channel.items {
        let title = item.title.as_deref().unwrap_or_default().trim().to_string();
        let link = item.link.as_deref().unwrap_or_default().trim().to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        out.push(Article {
            id: article_id(&link, &title),
            title,
            link,
            description: normalize_text(item.description.as_deref().unwrap_or_default()),
            source: source.name.clone(),
            author: item.author.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            published_at: item.pub_date.as_deref().and_then(parse_rfc2822),
            category: None,
            relevance: 0.0,
            key_points: Vec::new(),
        });
    }
    out
}

fn atom_articles(source: &FeedSource, atom: AtomFeed) -> Vec<Article> {
    let mut out = Vec::with_capacity(atom.entries.len());
    for entry in atom.entries {
        let title = entry.title.as_deref().unwrap_or_default().trim().to_string();
        let link = entry
            .links
            .iter()
            .find_map(|l| l.href.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        let published = entry
            .published
            .as_deref()
            .and_then(parse_rfc3339)
            .or_else(|| entry.updated.as_deref().and_then(parse_rfc3339));
        out.push(Article {
            id: article_id(&link, &title),
            title,
            link,
            description: normalize_text(entry.summary.as_deref().unwrap_or_default()),
            source: source.name.clone(),
            author: entry
                .author
                .and_then(|a| a.name)
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            published_at: published,
            category: None,
            relevance: 0.0,
            key_points: Vec::new(),
        });
    }
    out
}

static RE_SUSPICIOUS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(click here|read more|subscribe now)\b",
        r"\$\d+",
        r"(?i)\b(free|discount|sale|offer)\b",
        // a run of 5+ uppercase letters reads as shouting/promo copy
        r"[A-Z]{5,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("suspicious pattern"))
    .collect()
});

/// Drop obviously junk entries: too-short titles and clickbait/promo copy.
pub fn is_valid_article(article: &Article) -> bool {
    if article.title.trim().chars().count() < 10 {
        return false;
    }
    let content = format!("{} {}", article.title, article.description);
    !RE_SUSPICIOUS.iter().any(|re| re.is_match(&content))
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
