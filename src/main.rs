//! Embassy evacuation alert service: binary entrypoint.
//! Starts the monitor loop in the background and serves the liveness probe.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use embassy_alert::config::MonitorConfig;
use embassy_alert::health::{self, HealthHandle};
use embassy_alert::metrics::Metrics;
use embassy_alert::{build_monitor, spawn_monitor};

/// Human-readable logs by default; LOG_FORMAT=json for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("embassy_alert=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = MonitorConfig::load()?;
    tracing::info!(
        feeds = cfg.feeds.len(),
        interval_secs = cfg.poll_interval_secs,
        candidate_limit = cfg.candidate_limit,
        enrichment = cfg.enrichment.enabled,
        persisted_dedup = cfg.seen_links_path.is_some(),
        "config loaded"
    );

    let metrics = Metrics::init()?;
    let monitor = build_monitor(&cfg)?;

    let health_handle = HealthHandle::new(monitor.settings().poll_interval);
    let _supervisor = spawn_monitor(monitor, health_handle.clone());

    let app = health::router(health_handle).merge(metrics.router());
    let addr = format!("{}:{}", cfg.liveness_host, cfg.liveness_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding liveness listener on {addr}"))?;
    tracing::info!(%addr, "liveness endpoint listening");

    axum::serve(listener, app).await.context("liveness server")?;
    Ok(())
}
