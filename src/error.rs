// src/error.rs
//! Failure kinds caught at the per-feed and per-item boundaries.
//!
//! Components return `anyhow::Result` internally; the monitor folds those into a
//! `PipelineError` so that every skipped item carries an enumerable kind.

use thiserror::Error;

/// Pipeline stage where a failure happened. Used for timeout reporting and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Feed,
    Resolve,
    Classify,
    Dispatch,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Feed => "feed",
            Stage::Resolve => "resolve",
            Stage::Classify => "classify",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("feed fetch failed for {feed}")]
    FeedFetch {
        feed: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("article resolve failed for {link}")]
    ArticleResolve {
        link: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("classification failed for {link}")]
    Classification {
        link: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("dispatch failed for {link}")]
    Dispatch {
        link: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{stage} timed out for {target}")]
    Timeout {
        stage: Stage,
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Wrap a stage failure, promoting it to `Timeout` when the chain contains one.
    pub fn at(stage: Stage, target: impl Into<String>, source: anyhow::Error) -> Self {
        let target = target.into();
        if is_timeout(&source) {
            return PipelineError::Timeout {
                stage,
                target,
                source,
            };
        }
        match stage {
            Stage::Feed => PipelineError::FeedFetch {
                feed: target,
                source,
            },
            Stage::Resolve => PipelineError::ArticleResolve {
                link: target,
                source,
            },
            Stage::Classify => PipelineError::Classification {
                link: target,
                source,
            },
            Stage::Dispatch => PipelineError::Dispatch {
                link: target,
                source,
            },
        }
    }

    /// Short, stable label for logs and the `item_failures_total` metric.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::FeedFetch { .. } => "feed_fetch",
            PipelineError::ArticleResolve { .. } => "article_resolve",
            PipelineError::Classification { .. } => "classification",
            PipelineError::Dispatch { .. } => "dispatch",
            PipelineError::Timeout { .. } => "timeout",
        }
    }
}

/// True if anything in the chain is a tokio deadline or a timed-out HTTP request.
pub fn is_timeout(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<tokio::time::error::Elapsed>()
            || cause
                .downcast_ref::<reqwest::Error>()
                .is_some_and(|e| e.is_timeout())
    })
}
