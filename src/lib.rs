// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod alert_log;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod enrich;
pub mod error;
pub mod health;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod relevance;
pub mod resolve;

// ---- Re-exports for stable public API ----
pub use crate::classify::{Branch, ClassifiedAlert, Classifier};
pub use crate::error::PipelineError;
pub use crate::monitor::{spawn_monitor, CycleReport, ItemOutcome, Monitor, MonitorSettings};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::alert_log::FileAlertLog;
use crate::config::MonitorConfig;
use crate::dispatch::Dispatcher;
use crate::enrich::EnrichmentSettings;
use crate::ingest::rss::RssFeed;
use crate::ingest::types::FeedSource;
use crate::notify::discord::DiscordNotifier;
use crate::registry::{FileLinkRegistry, LinkRegistry, MemoryLinkRegistry};
use crate::relevance::RelevanceFilter;
use crate::resolve::HttpArticleResolver;

/// Wire the production pipeline (RSS over HTTP, Discord, file log) from config.
pub fn build_monitor(cfg: &MonitorConfig) -> Result<Monitor> {
    for feed in cfg.feeds_needing_enrichment() {
        tracing::warn!(
            feed = %feed.label(),
            "enrichment is disabled; embassy headlines from this feed will never be dispatched"
        );
    }

    let http_timeout = Duration::from_secs(cfg.http_timeout_secs);
    let feed_client = reqwest::Client::builder()
        .user_agent("embassy-alert/0.1")
        .connect_timeout(Duration::from_secs(5))
        .timeout(http_timeout)
        .build()
        .context("building feed http client")?;

    let feeds: Vec<Box<dyn FeedSource>> = cfg
        .feeds
        .iter()
        .map(|q| Box::new(RssFeed::from_query(q, feed_client.clone())) as Box<dyn FeedSource>)
        .collect();

    let resolver = Arc::new(HttpArticleResolver::new(http_timeout)?);
    let enricher = enrich::build_enricher(&cfg.enrichment)?;
    let classifier = Classifier::new(enricher, EnrichmentSettings::from(&cfg.enrichment));
    let filter = RelevanceFilter::new(cfg.markers.iter().cloned());

    let notifier = Arc::new(DiscordNotifier::new(cfg.webhook_url.clone()).with_timeout(cfg.http_timeout_secs));
    let dispatcher = Dispatcher::new(
        notifier,
        Box::new(FileAlertLog::new(cfg.alert_log_path.clone())),
        cfg.mention.clone(),
    );

    let registry: Box<dyn LinkRegistry> = match &cfg.seen_links_path {
        Some(p) => Box::new(FileLinkRegistry::open(p)?),
        None => Box::new(MemoryLinkRegistry::new()),
    };

    let settings = MonitorSettings {
        poll_interval: Duration::from_secs(cfg.poll_interval_secs),
        candidate_limit: cfg.candidate_limit,
        // Redirect chains get one extra request timeout of slack.
        resolve_timeout: http_timeout.saturating_mul(2),
    };

    Ok(Monitor::new(feeds, resolver, classifier, filter, dispatcher, registry, settings))
}
