// src/alert_log.rs
//! Append-only dispatch log: one pipe-delimited line per successful alert.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

use crate::classify::ClassifiedAlert;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub country: String,
    pub reported_time: String,
    pub title: String,
    pub localized_summary: String,
    pub link: String,
}

impl LogRecord {
    pub fn from_alert(alert: &ClassifiedAlert, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            country: alert.country.clone(),
            reported_time: alert.reported_time.clone(),
            title: alert.title.clone(),
            localized_summary: alert.localized_summary.clone(),
            link: alert.link.clone(),
        }
    }

    /// `timestamp | country | reported-time | title | summary | link`, newline-terminated.
    pub fn to_line(&self) -> String {
        let fields = [
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            one_line(&self.country),
            one_line(&self.reported_time),
            one_line(&self.title),
            one_line(&self.localized_summary),
            one_line(&self.link),
        ];
        format!("{}\n", fields.join(" | "))
    }
}

// Embedded newlines would split a record across lines.
fn one_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn append(&self, record: &LogRecord) -> Result<()>;
}

pub struct FileAlertLog {
    path: PathBuf,
}

impl FileAlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AlertSink for FileAlertLog {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating log dir {}", dir.display()))?;
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening alert log {}", self.path.display()))?;
        f.write_all(record.to_line().as_bytes())
            .await
            .context("writing alert log line")?;
        f.flush().await.context("flushing alert log")?;
        Ok(())
    }
}
