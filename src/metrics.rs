use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("monitor_cycles_total", "Completed poll cycles.");
        describe_counter!("items_dispatched_total", "Alerts sent to the notification channel.");
        describe_counter!("items_filtered_total", "Classified items rejected by the relevance filter.");
        describe_counter!("items_skipped_seen_total", "Candidates skipped because already dispatched.");
        describe_counter!("item_failures_total", "Per-item failures, labelled by kind.");
        describe_gauge!("monitor_last_cycle_ts", "Unix ts when the last poll cycle finished.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
