// src/ingest/mod.rs
pub mod rss;
pub mod types;

use crate::error::{PipelineError, Stage};
use crate::ingest::types::{FeedSource, NewsItem};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Items parsed from feeds.");
        describe_counter!("feed_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let out = re_tags.replace_all(&out, "");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Fetch every feed in order and concatenate their items.
/// A failing feed contributes zero items; the others are unaffected.
pub async fn collect_candidates(feeds: &[Box<dyn FeedSource>]) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut all = Vec::new();
    for feed in feeds {
        match feed.fetch_items().await {
            Ok(mut items) => {
                tracing::debug!(feed = feed.name(), count = items.len(), "feed fetched");
                all.append(&mut items);
            }
            Err(e) => {
                let err = PipelineError::at(Stage::Feed, feed.name(), e);
                tracing::warn!(error = ?err, kind = err.kind(), feed = feed.name(), "feed skipped");
                counter!("feed_errors_total").increment(1);
            }
        }
    }
    all
}
