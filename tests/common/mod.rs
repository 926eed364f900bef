// tests/common/mod.rs
// Hand-written trait mocks shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use embassy_alert::alert_log::{AlertSink, LogRecord};
use embassy_alert::classify::Classifier;
use embassy_alert::dispatch::Dispatcher;
use embassy_alert::enrich::{EnrichmentSettings, TextEnricher};
use embassy_alert::ingest::types::{FeedSource, NewsItem};
use embassy_alert::notify::Notifier;
use embassy_alert::registry::MemoryLinkRegistry;
use embassy_alert::relevance::RelevanceFilter;
use embassy_alert::resolve::{ArticleResolver, ResolvedArticle};
use embassy_alert::{Monitor, MonitorSettings};

pub const MARKERS: [&str; 5] = ["주한", "대한민국 대사관", "한국 내 대사관", "서울 주재", "한국 대사관"];

pub fn item(title: &str, link: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        link: link.to_string(),
        source: "mock".to_string(),
    }
}

/// Returns the same items every cycle.
pub struct StaticFeed {
    pub label: String,
    pub items: Vec<NewsItem>,
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        &self.label
    }
}

pub struct FailingFeed;

#[async_trait]
impl FeedSource for FailingFeed {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>> {
        bail!("connection refused")
    }
    fn name(&self) -> &str {
        "failing"
    }
}

/// Link -> body; links without a body fail like a network error.
#[derive(Default)]
pub struct MapResolver {
    pub bodies: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MapResolver {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            bodies: pairs
                .iter()
                .map(|(l, b)| (l.to_string(), b.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArticleResolver for MapResolver {
    async fn resolve(&self, link: &str) -> Result<ResolvedArticle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.bodies.get(link) {
            Some(body) => Ok(ResolvedArticle {
                canonical_url: format!("{link}#resolved"),
                body_text: body.clone(),
            }),
            None => Err(anyhow!("network error resolving {link}")),
        }
    }
}

/// Summarize and translate both echo their input; counts calls.
#[derive(Default)]
pub struct EchoEnricher {
    pub summarize_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
}

#[async_trait]
impl TextEnricher for EchoEnricher {
    async fn summarize(&self, text: &str, _max_len: usize, _min_len: usize) -> Result<String> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.to_string())
    }
    async fn translate(&self, text: &str, _src: &str, _dest: &str) -> Result<String> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.to_string())
    }
    fn name(&self) -> &'static str {
        "echo"
    }
}

impl EchoEnricher {
    pub fn total_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst) + self.translate_calls.load(Ordering::SeqCst)
    }
}

/// Records every message; the first `fail_first` sends fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub attempts: AtomicUsize,
    pub fail_first: usize,
}

impl RecordingNotifier {
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, content: &str) -> Result<()> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            bail!("webhook returned 500");
        }
        self.sent.lock().unwrap().push(content.to_string());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Clone, Default)]
pub struct MemorySink {
    pub records: Arc<Mutex<Vec<LogRecord>>>,
}

#[async_trait]
impl AlertSink for MemorySink {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub struct BrokenSink;

#[async_trait]
impl AlertSink for BrokenSink {
    async fn append(&self, _record: &LogRecord) -> Result<()> {
        bail!("disk full")
    }
}

pub struct Harness {
    pub monitor: Monitor,
    pub notifier: Arc<RecordingNotifier>,
    pub enricher: Arc<EchoEnricher>,
    pub resolver: Arc<MapResolver>,
    pub sink: MemorySink,
}

pub fn harness(
    feeds: Vec<Box<dyn FeedSource>>,
    resolver: MapResolver,
    notifier: RecordingNotifier,
    candidate_limit: usize,
) -> Harness {
    let notifier = Arc::new(notifier);
    let enricher = Arc::new(EchoEnricher::default());
    let resolver = Arc::new(resolver);
    let sink = MemorySink::default();

    let classifier = Classifier::new(enricher.clone(), EnrichmentSettings::default());
    let dispatcher = Dispatcher::new(notifier.clone(), Box::new(sink.clone()), "@everyone");
    let monitor = Monitor::new(
        feeds,
        resolver.clone(),
        classifier,
        RelevanceFilter::new(MARKERS),
        dispatcher,
        Box::new(MemoryLinkRegistry::new()),
        MonitorSettings {
            candidate_limit,
            ..MonitorSettings::default()
        },
    );

    Harness {
        monitor,
        notifier,
        enricher,
        resolver,
        sink,
    }
}
