//! News digest daemon: binary entrypoint.
//! Boots tracing and metrics, wires the store, fetcher, and LLM client, and
//! runs the background scheduler with the refresh and cleanup jobs. Chat
//! transports embed [`news_digest_bot::BotService`] from the library; see
//! `src/bin/chat_demo.rs` for a minimal local driver.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest_bot::analyze::llm::build_llm_client;
use news_digest_bot::config::AppConfig;
use news_digest_bot::feed::fetcher::FeedFetcher;
use news_digest_bot::pipeline::Pipeline;
use news_digest_bot::scheduler::{Scheduler, SystemClock};
use news_digest_bot::store::Store;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_digest_bot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    if let Err(e) = news_digest_bot::metrics::init() {
        tracing::warn!(error = ?e, "metrics exporter not started");
    }

    let store = Store::new(&cfg.data_dir);
    let llm = build_llm_client(&cfg.llm);
    let fetcher = FeedFetcher::new(std::time::Duration::from_secs(cfg.fetch_timeout_secs));
    let pipeline = Arc::new(Pipeline::new(cfg.clone(), store, fetcher, llm));

    let mut scheduler = Scheduler::new(Arc::new(SystemClock));
    {
        let pipeline = pipeline.clone();
        scheduler.schedule_recurring(
            "news_refresh",
            chrono::Duration::minutes(cfg.refresh_interval_mins),
            move || {
                let pipeline = pipeline.clone();
                Box::pin(async move { pipeline.refresh_once().await.map(|_| ()) })
            },
        );
    }
    {
        let pipeline = pipeline.clone();
        scheduler.schedule_recurring(
            "cleanup",
            chrono::Duration::minutes(cfg.cleanup_interval_mins),
            move || {
                let pipeline = pipeline.clone();
                Box::pin(async move { pipeline.cleanup_once().await })
            },
        );
    }

    tracing::info!(feeds = cfg.feeds.len(), "news digest daemon started");
    let handle = scheduler.spawn(std::time::Duration::from_secs(60));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handle.abort();
    Ok(())
}
