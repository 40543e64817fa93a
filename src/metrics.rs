// src/metrics.rs
//! Prometheus exposition for the daemon. The exporter serves its own
//! listener, so nothing else in the crate needs to know about HTTP.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

pub const ENV_METRICS_ADDR: &str = "METRICS_LISTEN_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:9090";

/// Install the recorder and start the exposition listener. Call once at
/// startup, inside the tokio runtime. `METRICS_LISTEN_ADDR=off` disables the
/// listener entirely.
pub fn init() -> Result<()> {
    let addr = std::env::var(ENV_METRICS_ADDR).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    if addr.eq_ignore_ascii_case("off") {
        return Ok(());
    }
    let addr: SocketAddr = addr.parse().context("parsing METRICS_LISTEN_ADDR")?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("installing prometheus exporter")?;
    tracing::info!(%addr, "metrics exposed");
    Ok(())
}
