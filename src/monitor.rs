// src/monitor.rs
//! Monitor loop: poll feeds, push each candidate through resolve → classify → filter →
//! dispatch one at a time, sleep, repeat.
//!
//! Every candidate yields `Result<ItemOutcome, PipelineError>`. Errors are logged and the
//! cycle moves on; the link stays unseen so the next cycle retries it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::classify::Classifier;
use crate::dispatch::Dispatcher;
use crate::error::{PipelineError, Stage};
use crate::health::HealthHandle;
use crate::ingest::collect_candidates;
use crate::ingest::types::{FeedSource, NewsItem};
use crate::registry::LinkRegistry;
use crate::relevance::RelevanceFilter;
use crate::resolve::ArticleResolver;

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Only the first N aggregated items are looked at per cycle.
    pub candidate_limit: usize,
    /// Upper bound on a single article resolve, whatever the resolver does internally.
    pub resolve_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600),
            candidate_limit: 5,
            resolve_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    AlreadySeen,
    Filtered,
    Dispatched,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Items returned by all feeds, before the candidate limit.
    pub fetched: usize,
    pub candidates: usize,
    pub skipped_seen: usize,
    pub filtered: usize,
    pub dispatched: usize,
    pub failed: usize,
}

pub struct Monitor {
    feeds: Vec<Box<dyn FeedSource>>,
    resolver: Arc<dyn ArticleResolver>,
    classifier: Classifier,
    filter: RelevanceFilter,
    dispatcher: Dispatcher,
    registry: Box<dyn LinkRegistry>,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        feeds: Vec<Box<dyn FeedSource>>,
        resolver: Arc<dyn ArticleResolver>,
        classifier: Classifier,
        filter: RelevanceFilter,
        dispatcher: Dispatcher,
        registry: Box<dyn LinkRegistry>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            feeds,
            resolver,
            classifier,
            filter,
            dispatcher,
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &dyn LinkRegistry {
        self.registry.as_ref()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// One poll cycle. Never fails: feed and item errors are absorbed and counted.
    pub async fn run_cycle(&mut self) -> CycleReport {
        tracing::info!(feeds = self.feeds.len(), "checking news feeds");
        let items = collect_candidates(&self.feeds).await;

        let mut report = CycleReport {
            fetched: items.len(),
            ..CycleReport::default()
        };

        for item in items.into_iter().take(self.settings.candidate_limit) {
            report.candidates += 1;
            match self.process_item(&item).await {
                Ok(ItemOutcome::AlreadySeen) => {
                    report.skipped_seen += 1;
                    counter!("items_skipped_seen_total").increment(1);
                }
                Ok(ItemOutcome::Filtered) => {
                    report.filtered += 1;
                    counter!("items_filtered_total").increment(1);
                }
                Ok(ItemOutcome::Dispatched) => {
                    report.dispatched += 1;
                    counter!("items_dispatched_total").increment(1);
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("item_failures_total", "kind" => e.kind()).increment(1);
                    tracing::warn!(error = ?e, kind = e.kind(), link = %item.link, "item processing failed");
                }
            }
        }
        report
    }

    /// Resolve → classify → filter → dispatch for a single candidate.
    pub async fn process_item(&mut self, item: &NewsItem) -> Result<ItemOutcome, PipelineError> {
        if self.registry.contains(&item.link) {
            tracing::debug!(link = %item.link, "already dispatched");
            return Ok(ItemOutcome::AlreadySeen);
        }

        let article = tokio::time::timeout(self.settings.resolve_timeout, self.resolver.resolve(&item.link))
            .await
            .map_err(|elapsed| PipelineError::at(Stage::Resolve, &item.link, elapsed.into()))?
            .map_err(|e| PipelineError::at(Stage::Resolve, &item.link, e))?;
        tracing::debug!(link = %item.link, canonical = %article.canonical_url, "article resolved");

        let now = Local::now();
        let alert = self
            .classifier
            .classify(item, &article, now)
            .await
            .map_err(|e| PipelineError::at(Stage::Classify, &item.link, e))?;

        if !self.filter.accepts(&alert) {
            tracing::info!(link = %alert.link, title = %alert.title, "filtered: not about a home mission");
            return Ok(ItemOutcome::Filtered);
        }

        self.dispatcher
            .dispatch(&alert, self.registry.as_mut(), now)
            .await
            .map_err(|e| PipelineError::at(Stage::Dispatch, &alert.link, e))?;
        tracing::info!(link = %alert.link, country = %alert.country, "alert dispatched");
        Ok(ItemOutcome::Dispatched)
    }

    /// Poll forever. Only a panic ends this future.
    pub async fn run_forever(mut self, health: HealthHandle) {
        health.mark_running();
        loop {
            let report = self.run_cycle().await;
            let finished = Utc::now();
            health.cycle_finished(&report, finished);

            counter!("monitor_cycles_total").increment(1);
            gauge!("monitor_last_cycle_ts").set(finished.timestamp() as f64);
            tracing::info!(
                fetched = report.fetched,
                candidates = report.candidates,
                seen = report.skipped_seen,
                filtered = report.filtered,
                dispatched = report.dispatched,
                failed = report.failed,
                registry = self.registry.len(),
                sleep_secs = self.settings.poll_interval.as_secs(),
                "cycle finished"
            );

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

/// Run the monitor in the background and record in `health` if it ever stops.
pub fn spawn_monitor(monitor: Monitor, health: HealthHandle) -> JoinHandle<()> {
    let task = tokio::spawn(monitor.run_forever(health.clone()));
    tokio::spawn(async move {
        let reason = match task.await {
            Ok(()) => "monitor loop returned".to_string(),
            Err(e) if e.is_panic() => format!("monitor loop panicked: {e}"),
            Err(e) => format!("monitor loop aborted: {e}"),
        };
        tracing::error!(%reason, "monitoring stopped; liveness will report failure");
        health.mark_stopped(reason);
    })
}
