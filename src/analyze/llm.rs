//! LLM backend abstraction: a chat-completions client for production, a
//! disabled client when no backend is configured, and a scripted client for
//! tests. Callers must treat any `Err` as a signal to take their
//! deterministic fallback; nothing in the crate hard-depends on the model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt, get raw text back. The reply is not guaranteed to be
    /// well-formed anything; parse defensively.
    async fn complete(&self, prompt: &str) -> Result<String>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type SharedLlm = Arc<dyn LlmClient>;

/// Factory: disabled unless the config carries a usable key.
pub fn build_llm_client(cfg: &LlmConfig) -> SharedLlm {
    if !cfg.enabled || cfg.api_key.is_empty() {
        return Arc::new(DisabledLlm);
    }
    Arc::new(ChatCompletionsClient::from_config(cfg))
}

// ------------------------------------------------------------
// Chat-completions backend
// ------------------------------------------------------------

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn from_config(cfg: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-digest-bot/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("llm request")?;

        if !resp.status().is_success() {
            return Err(anyhow!("llm backend returned HTTP {}", resp.status()));
        }
        let body: Resp = resp.json().await.context("decoding llm response")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(anyhow!("llm returned empty content"));
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}

// ------------------------------------------------------------
// Disabled + scripted clients
// ------------------------------------------------------------

/// Always fails, so every caller takes its deterministic fallback path.
pub struct DisabledLlm;

#[async_trait]
impl LlmClient for DisabledLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("llm disabled"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Scripted client for tests: pops pre-loaded replies in order and records
/// every prompt it saw. An exhausted script fails like a dead backend.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(Err(message.into()));
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts mutex poisoned").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompts mutex poisoned")
            .push(prompt.to_string());
        match self
            .script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
        {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted llm exhausted")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
