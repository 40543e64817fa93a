// src/config.rs
//! Runtime configuration: environment variables layered over defaults, with
//! the feed list loaded from TOML ($FEEDS_CONFIG_PATH → `config/feeds.toml`
//! → built-in defaults).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_FEEDS_PATH: &str = "FEEDS_CONFIG_PATH";
const DEFAULT_FEEDS_PATH: &str = "config/feeds.toml";

/// A configured RSS/Atom endpoint. Static at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feeds: Vec<FeedSource>,
    pub llm: LlmConfig,
    pub data_dir: PathBuf,
    pub refresh_interval_mins: i64,
    pub cleanup_interval_mins: i64,
    pub fetch_timeout_secs: u64,
    pub cooldown_secs: u64,
    pub max_articles_per_user: usize,
    pub summary_max_length: usize,
    pub admin_user_ids: Vec<i64>,
    pub bot_username: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            llm: LlmConfig::default(),
            data_dir: PathBuf::from("data"),
            refresh_interval_mins: 30,
            cleanup_interval_mins: 24 * 60,
            fetch_timeout_secs: 30,
            cooldown_secs: 60,
            max_articles_per_user: 10,
            summary_max_length: 500,
            admin_user_ids: Vec::new(),
            bot_username: None,
        }
    }
}

pub fn default_feeds() -> Vec<FeedSource> {
    [
        ("TechCrunch", "https://techcrunch.com/feed/", "technology"),
        ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index", "technology"),
        ("The Verge", "https://www.theverge.com/rss/index.xml", "technology"),
        ("BBC Technology", "https://feeds.bbci.co.uk/news/technology/rss.xml", "technology"),
        ("Wired", "https://www.wired.com/feed/rss", "technology"),
        ("MIT Technology Review", "https://www.technologyreview.com/feed/", "technology"),
        ("VentureBeat", "https://venturebeat.com/feed/", "technology"),
    ]
    .into_iter()
    .map(|(name, url, category)| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
        category: category.to_string(),
        enabled: true,
    })
    .collect()
}

/// Load feeds from an explicit TOML path.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSource>> {
    #[derive(Deserialize)]
    struct FeedsFile {
        feeds: Vec<FeedSource>,
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading feeds from {}", path.display()))?;
    let parsed: FeedsFile =
        toml::from_str(&content).with_context(|| format!("parsing feeds from {}", path.display()))?;
    Ok(parsed.feeds)
}

/// Load feeds using env var + fallbacks:
/// 1) $FEEDS_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) built-in defaults
pub fn load_feeds_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        bail!("{ENV_FEEDS_PATH} points to a non-existent path");
    }
    let default = PathBuf::from(DEFAULT_FEEDS_PATH);
    if default.exists() {
        return load_feeds_from(&default);
    }
    Ok(default_feeds())
}

impl AppConfig {
    /// Environment overrides on top of defaults; call after `dotenvy`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.feeds = load_feeds_default()?;

        if let Ok(v) = std::env::var("DATA_DIR") {
            cfg.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("REFRESH_INTERVAL_MINUTES") {
            cfg.refresh_interval_mins = v.parse().context("REFRESH_INTERVAL_MINUTES")?;
        }
        if let Ok(v) = std::env::var("CLEANUP_INTERVAL_MINUTES") {
            cfg.cleanup_interval_mins = v.parse().context("CLEANUP_INTERVAL_MINUTES")?;
        }
        if let Ok(v) = std::env::var("FETCH_TIMEOUT_SECS") {
            cfg.fetch_timeout_secs = v.parse().context("FETCH_TIMEOUT_SECS")?;
        }
        if let Ok(v) = std::env::var("COMMAND_COOLDOWN_SECS") {
            cfg.cooldown_secs = v.parse().context("COMMAND_COOLDOWN_SECS")?;
        }
        if let Ok(v) = std::env::var("MAX_ARTICLES_PER_USER") {
            cfg.max_articles_per_user = v.parse().context("MAX_ARTICLES_PER_USER")?;
        }
        if let Ok(v) = std::env::var("SUMMARY_MAX_LENGTH") {
            cfg.summary_max_length = v.parse().context("SUMMARY_MAX_LENGTH")?;
        }
        if let Ok(v) = std::env::var("ADMIN_USER_IDS") {
            cfg.admin_user_ids = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<i64>().context("ADMIN_USER_IDS"))
                .collect::<Result<Vec<_>>>()?;
        }
        if let Ok(v) = std::env::var("BOT_USERNAME") {
            cfg.bot_username = Some(v);
        }

        if let Ok(v) = std::env::var("LLM_API_KEY") {
            cfg.llm.enabled = !v.is_empty();
            cfg.llm.api_key = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            cfg.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_ENDPOINT") {
            cfg.llm.endpoint = v;
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            cfg.llm.max_tokens = v.parse().context("LLM_MAX_TOKENS")?;
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            cfg.llm.temperature = v.parse().context("LLM_TEMPERATURE")?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn feeds_toml_parses_with_enabled_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.toml");
        fs::write(
            &path,
            r#"
[[feeds]]
name = "Example"
url = "https://example.com/rss"
category = "technology"

[[feeds]]
name = "Disabled"
url = "https://example.com/other"
category = "science"
enabled = false
"#,
        )
        .unwrap();
        let feeds = load_feeds_from(&path).unwrap();
        assert_eq!(feeds.len(), 2);
        assert!(feeds[0].enabled);
        assert!(!feeds[1].enabled);
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.toml");
        fs::write(
            &path,
            r#"
[[feeds]]
name = "FromEnv"
url = "https://example.com/rss"
category = "technology"
"#,
        )
        .unwrap();

        std::env::set_var(ENV_FEEDS_PATH, path.display().to_string());
        let feeds = load_feeds_default().unwrap();
        std::env::remove_var(ENV_FEEDS_PATH);

        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "FromEnv");
    }
}
