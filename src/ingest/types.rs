// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One configured feed search. Defined at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedQuery {
    /// Feed URL; `{lang}` is replaced with `lang` when present.
    pub url: String,
    /// Language hint, e.g. "ko" or "en".
    pub lang: String,
}

impl FeedQuery {
    pub fn new(url: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lang: lang.into(),
        }
    }

    pub fn resolved_url(&self) -> String {
        self.url.replace("{lang}", &self.lang)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> String {
        format!("rss:{}", self.lang)
    }
}

/// Candidate produced fresh every cycle. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String, // feed label, e.g. "rss:ko"
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &str;
}
