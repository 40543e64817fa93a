// src/bot/commands.rs
//! Transport-agnostic command handling. A platform client turns its updates
//! into `Incoming` values and delivers the returned replies; nothing here
//! knows about any particular chat API. All mutable state (cooldowns, store
//! handles) lives in the service value, not in globals.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;

use crate::analyze::llm::SharedLlm;
use crate::analyze::{categorize, rank, summarize};
use crate::bot::cooldown::CooldownGate;
use crate::bot::presenter::{self, MAX_MESSAGE_CHARS};
use crate::config::AppConfig;
use crate::feed::types::Article;
use crate::store::Store;

/// Ranking pool for `/summary`: the newest slice of the store.
const SUMMARY_POOL: usize = 25;
/// How many ranked articles feed the digest writer.
const SUMMARY_TOP: usize = 10;

const APOLOGY: &str = "❌ Sorry, something went wrong. Please try again later.";

const HELP_TEXT: &str = "📚 Available commands:\n\n\
/start - welcome message\n\
/news - latest news digest (cooldown applies)\n\
/summary - prose summary of recent news (cooldown applies)\n\
/categories - browse news by category\n\
/settings - your preferences\n\
/stats - your usage statistics\n\
/help - this message\n\n\
Admin commands:\n\
/admin_stats - bot statistics\n\
/broadcast <message> - message all users";

/// Direct chats always get an answer; in groups the bot only reacts when
/// mentioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Direct,
    Group,
}

#[derive(Debug, Clone)]
pub struct Incoming {
    pub user_id: i64,
    pub chat: ChatKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Open the article link.
    Url(String),
    /// Callback payload routed back through [`BotService::handle_action`].
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            text: s.into(),
            buttons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    News,
    Summary,
    Categories,
    Settings,
    Stats,
    AdminStats,
    Broadcast(String),
    Text(String),
}

/// Parse a message into a command. `/command@botname` forms are accepted and
/// unknown slash commands fall through to the free-text responder.
pub fn parse_command(text: &str) -> Command {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };
        let name = name.split('@').next().unwrap_or(name).to_lowercase();
        return match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "news" | "get_news" | "get_today_news" => Command::News,
            "summary" | "get_summary" | "latest_summary" => Command::Summary,
            "categories" => Command::Categories,
            "settings" => Command::Settings,
            "stats" => Command::Stats,
            "admin_stats" => Command::AdminStats,
            "broadcast" => Command::Broadcast(args.to_string()),
            _ => Command::Text(trimmed.to_string()),
        };
    }
    Command::Text(trimmed.to_string())
}

pub struct BotService {
    cfg: AppConfig,
    store: Store,
    llm: SharedLlm,
    cooldowns: CooldownGate,
    mention: Option<String>,
}

impl BotService {
    pub fn new(cfg: AppConfig, store: Store, llm: SharedLlm) -> Self {
        let cooldowns = CooldownGate::new(Duration::from_secs(cfg.cooldown_secs));
        let mention = cfg
            .bot_username
            .clone()
            .map(|u| format!("@{}", u.trim_start_matches('@')));
        Self {
            cfg,
            store,
            llm,
            cooldowns,
            mention,
        }
    }

    /// Entry point for plain messages. Returns zero or more replies in
    /// delivery order.
    pub async fn handle(&self, incoming: Incoming) -> Vec<Reply> {
        let text = match self.addressed_text(&incoming) {
            Some(t) => t,
            None => return Vec::new(), // unaddressed group chatter
        };

        match parse_command(&text) {
            Command::Start => vec![self.start_reply()],
            Command::Help => vec![Reply::text(HELP_TEXT)],
            Command::News => self.news(incoming.user_id).await,
            Command::Summary => self.summary(incoming.user_id).await,
            Command::Categories => vec![self.categories_reply()],
            Command::Settings => vec![self.settings_reply(incoming.user_id)],
            Command::Stats => vec![self.stats_reply(incoming.user_id)],
            Command::AdminStats => vec![self.admin_stats_reply(incoming.user_id)],
            Command::Broadcast(msg) => vec![self.broadcast_reply(incoming.user_id, &msg)],
            Command::Text(t) => vec![self.free_text_reply(&t)],
        }
    }

    /// Entry point for inline-button callbacks ("save_<id>",
    /// "category_<name>").
    pub async fn handle_action(&self, user_id: i64, data: &str) -> Vec<Reply> {
        if let Some(article_id) = data.strip_prefix("save_") {
            return vec![self.save_article(user_id, article_id)];
        }
        if let Some(category) = data.strip_prefix("category_") {
            return self.select_category(user_id, category).await;
        }
        vec![Reply::text("Unknown action.")]
    }

    fn addressed_text(&self, incoming: &Incoming) -> Option<String> {
        match incoming.chat {
            ChatKind::Direct => Some(incoming.text.clone()),
            ChatKind::Group => {
                let mention = self.mention.as_deref()?;
                if incoming.text.contains(mention) {
                    Some(incoming.text.replace(mention, "").trim().to_string())
                } else {
                    None
                }
            }
        }
    }

    fn is_admin(&self, user_id: i64) -> bool {
        self.cfg.admin_user_ids.contains(&user_id)
    }

    // ---- command handlers ----

    fn start_reply(&self) -> Reply {
        Reply::text(
            "🤖 Welcome to the news digest bot!\n\n\
             I collect news from top sources and serve AI-assisted digests:\n\n\
             📰 /news - latest articles for your preferred category\n\
             📝 /summary - a prose roundup of recent news\n\
             🏷️ /categories - browse by topic\n\
             ⚙️ /settings - your preferences\n\n\
             Send /help for the full command list.",
        )
    }

    async fn news(&self, user_id: i64) -> Vec<Reply> {
        if let Err(remaining) = self.cooldowns.check(user_id, "news") {
            return vec![Reply::text(format!(
                "⏳ Please wait {remaining}s before requesting news again."
            ))];
        }
        self.digest(user_id, None).await
    }

    /// Shared digest body for `/news` and the category buttons.
    async fn digest(&self, user_id: i64, category_override: Option<&str>) -> Vec<Reply> {
        let doc = self.store.load_articles();
        if doc.articles.is_empty() {
            return vec![Reply::text(
                "📰 No articles available at the moment. Check back later!",
            )];
        }

        let mut prefs = self.store.load_user(user_id);
        let category = category_override
            .map(str::to_string)
            .unwrap_or_else(|| prefs.preferred_category.clone());

        let mut selected: Vec<Article> = doc
            .articles
            .iter()
            .filter(|a| a.category.as_deref() == Some(category.as_str()))
            .cloned()
            .collect();
        if selected.is_empty() {
            // nothing in the preferred category: fall back to everything
            selected = doc.articles;
        }
        selected.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        selected.truncate(prefs.max_articles.min(self.cfg.max_articles_per_user));

        let summaries = self.store.load_summaries().summaries;

        let mut replies = Vec::with_capacity(selected.len() + 1);
        replies.push(Reply::text(format!(
            "📰 *Latest News Digest*\n\nHere are the top {} articles:",
            selected.len()
        )));
        for (i, article) in selected.iter().enumerate() {
            replies.push(Reply {
                text: presenter::format_article(article, i + 1, summaries.get(&article.id)),
                buttons: vec![
                    Button {
                        label: "📖 Read".to_string(),
                        action: ButtonAction::Url(article.link.clone()),
                    },
                    Button {
                        label: "💾 Save".to_string(),
                        action: ButtonAction::Callback(format!("save_{}", article.id)),
                    },
                ],
            });
        }

        prefs.articles_read += selected.len() as u64;
        prefs.last_active = Some(Utc::now());
        if let Err(e) = self.store.save_user(user_id, prefs) {
            tracing::error!(error = ?e, user = user_id, "failed to persist user stats");
        }

        replies
    }

    async fn summary(&self, user_id: i64) -> Vec<Reply> {
        if let Err(remaining) = self.cooldowns.check(user_id, "summary") {
            return vec![Reply::text(format!(
                "⏳ Please wait {remaining}s before requesting a summary again."
            ))];
        }

        let doc = self.store.load_articles();
        if doc.articles.is_empty() {
            return vec![Reply::text("📰 Nothing to summarize yet. Check back later!")];
        }

        // Rank the newest slice, then hand the strongest batch to the digest
        // writer. Both calls fall back deterministically on model failure.
        let candidates: Vec<Article> = doc.articles.into_iter().take(SUMMARY_POOL).collect();
        let ranked = rank::rank(self.llm.as_ref(), candidates, Some(SUMMARY_TOP)).await;
        let batch: Vec<Article> = ranked.into_iter().map(|r| r.article).collect();
        let digest = summarize::summarize(self.llm.as_ref(), &batch).await;

        presenter::chunk_message(&digest, MAX_MESSAGE_CHARS)
            .into_iter()
            .map(Reply::text)
            .collect()
    }

    fn categories_reply(&self) -> Reply {
        let mut buttons: Vec<Button> = categorize::CATEGORY_KEYWORDS
            .iter()
            .map(|(category, _)| Button {
                label: format!(
                    "{} {}",
                    presenter::category_emoji(category),
                    presenter::title_case(category)
                ),
                action: ButtonAction::Callback(format!("category_{category}")),
            })
            .collect();
        buttons.push(Button {
            label: "📰 Other".to_string(),
            action: ButtonAction::Callback("category_other".to_string()),
        });
        Reply {
            text: "🏷️ Select a news category:".to_string(),
            buttons,
        }
    }

    fn settings_reply(&self, user_id: i64) -> Reply {
        let prefs = self.store.load_user(user_id);
        Reply::text(format!(
            "⚙️ Your settings\n\n\
             Preferred category: {}\n\
             Max articles per digest: {}\n\n\
             Use /categories to change your preferred category.",
            presenter::title_case(&prefs.preferred_category),
            prefs.max_articles,
        ))
    }

    fn stats_reply(&self, user_id: i64) -> Reply {
        let prefs = self.store.load_user(user_id);
        let last_active = prefs
            .last_active
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Never".to_string());
        Reply::text(format!(
            "📊 Your statistics\n\n\
             Articles read: {}\n\
             Articles saved: {}\n\
             Last active: {}\n\
             Preferred category: {}",
            prefs.articles_read,
            prefs.articles_saved,
            last_active,
            presenter::title_case(&prefs.preferred_category),
        ))
    }

    fn admin_stats_reply(&self, user_id: i64) -> Reply {
        if !self.is_admin(user_id) {
            return Reply::text("❌ This command is only available to administrators.");
        }

        let doc = self.store.load_articles();
        let summaries = self.store.load_summaries();
        let users = self.store.load_users();

        let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
        for a in &doc.articles {
            *by_category
                .entry(a.category.as_deref().unwrap_or("uncategorized"))
                .or_default() += 1;
        }

        let mut text = format!(
            "🔧 Admin statistics\n\n\
             Articles: {}\n\
             Summaries: {}\n\
             Users: {}\n\
             Last update: {}\n\n\
             Articles by category:\n",
            doc.articles.len(),
            summaries.summaries.len(),
            users.users.len(),
            doc.last_updated
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        );
        for (category, count) in by_category {
            text.push_str(&format!("• {}: {count}\n", presenter::title_case(category)));
        }
        Reply::text(text)
    }

    fn broadcast_reply(&self, user_id: i64, message: &str) -> Reply {
        if !self.is_admin(user_id) {
            return Reply::text("❌ This command is only available to administrators.");
        }
        if message.is_empty() {
            return Reply::text("Usage: /broadcast <message>");
        }
        let users = self.store.load_users();
        // Delivery fan-out belongs to the transport; we confirm the audience.
        Reply::text(format!(
            "📢 Broadcasting to {} users:\n\n{message}",
            users.users.len()
        ))
    }

    fn save_article(&self, user_id: i64, article_id: &str) -> Reply {
        let mut prefs = self.store.load_user(user_id);
        if prefs.saved_articles.iter().any(|id| id == article_id) {
            return Reply::text("📝 Article already saved.");
        }
        prefs.saved_articles.push(article_id.to_string());
        prefs.articles_saved += 1;
        prefs.last_active = Some(Utc::now());
        match self.store.save_user(user_id, prefs) {
            Ok(()) => Reply::text("✅ Article saved!"),
            Err(e) => {
                tracing::error!(error = ?e, user = user_id, "failed to save article");
                Reply::text(APOLOGY)
            }
        }
    }

    async fn select_category(&self, user_id: i64, category: &str) -> Vec<Reply> {
        let mut prefs = self.store.load_user(user_id);
        prefs.preferred_category = category.to_string();
        prefs.last_active = Some(Utc::now());
        if let Err(e) = self.store.save_user(user_id, prefs) {
            tracing::error!(error = ?e, user = user_id, "failed to persist category choice");
            return vec![Reply::text(APOLOGY)];
        }
        self.digest(user_id, Some(category)).await
    }

    /// Free-text fallback: canned small talk first, then fuzzy command
    /// matching, then a nudge toward /help.
    fn free_text_reply(&self, text: &str) -> Reply {
        let lowered = text.to_lowercase();

        if lowered.contains("hello") || lowered == "hi" || lowered.starts_with("hi ") {
            return Reply::text("Hey there! 👋");
        }
        if lowered.contains("how are you") {
            return Reply::text("I am good! Ready to fetch some news.");
        }
        if lowered.contains("bye") {
            return Reply::text("Talk to you later!");
        }

        if let Some(command) = fuzzy_command(&lowered) {
            return Reply::text(format!(
                "Did you mean /{command}? Try /help for the full command list."
            ));
        }

        Reply::text("🤖 I didn't understand that. Try /help to see available commands!")
    }
}

/// Closest command name by normalized Levenshtein similarity over the words
/// of the message, accepted at 0.6 or better.
fn fuzzy_command(text: &str) -> Option<&'static str> {
    const COMMANDS: &[&str] = &["news", "summary", "categories", "settings", "stats", "help", "start"];
    let mut best: Option<(&'static str, f64)> = None;
    for word in text.split_whitespace() {
        for &command in COMMANDS {
            let similarity = strsim::normalized_levenshtein(word, command);
            if similarity >= 0.6 && best.map_or(true, |(_, b)| similarity > b) {
                best = Some((command, similarity));
            }
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_command("/news"), Command::News);
        assert_eq!(parse_command("/news@digest_bot"), Command::News);
        assert_eq!(parse_command("/latest_summary"), Command::Summary);
        assert_eq!(
            parse_command("/broadcast hello everyone"),
            Command::Broadcast("hello everyone".to_string())
        );
        assert_eq!(
            parse_command("just chatting"),
            Command::Text("just chatting".to_string())
        );
    }

    #[test]
    fn fuzzy_matching_catches_typos() {
        assert_eq!(fuzzy_command("show me the newz please"), Some("news"));
        assert_eq!(fuzzy_command("sumary"), Some("summary"));
        assert_eq!(fuzzy_command("xyzzy"), None);
    }
}
