// src/dispatch.rs
//! Dispatcher: send, then log, then mark seen. A failed send stops the chain so the link
//! stays unseen and is retried next cycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::alert_log::{AlertSink, LogRecord};
use crate::classify::ClassifiedAlert;
use crate::notify::Notifier;
use crate::registry::LinkRegistry;

// Discord message limit; the summary is shortened so the link always survives.
pub const MAX_ALERT_CHARS: usize = 2000;

/// Alert text as posted to the channel.
pub fn format_alert(alert: &ClassifiedAlert, mention: &str) -> String {
    let render = |summary: &str| {
        let mut msg = String::new();
        if !mention.trim().is_empty() {
            msg.push_str(mention.trim());
            msg.push('\n');
        }
        msg.push_str(&format!(
            "🚨 **{} 대사관 철수 감지**\n📰보도내용: {}\n🕒보도시각: {}\n🔗링크: {}",
            alert.country, summary, alert.reported_time, alert.link
        ));
        msg
    };

    let msg = render(&alert.localized_summary);
    if msg.chars().count() <= MAX_ALERT_CHARS {
        return msg;
    }
    let fixed = render("").chars().count();
    let budget = MAX_ALERT_CHARS.saturating_sub(fixed);
    let mut summary: String = alert
        .localized_summary
        .chars()
        .take(budget.saturating_sub(1))
        .collect();
    if budget > 0 {
        summary.push('…');
    }
    render(&summary)
}

pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    log: Box<dyn AlertSink>,
    mention: String,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, log: Box<dyn AlertSink>, mention: impl Into<String>) -> Self {
        Self {
            notifier,
            log,
            mention: mention.into(),
        }
    }

    /// Only a send failure is returned as an error. A log failure after a successful send
    /// is reported but the link is still marked seen.
    pub async fn dispatch(
        &self,
        alert: &ClassifiedAlert,
        registry: &mut dyn LinkRegistry,
        now: DateTime<Local>,
    ) -> Result<()> {
        let content = format_alert(alert, &self.mention);
        self.notifier
            .send(&content)
            .await
            .with_context(|| format!("sending alert via {}", self.notifier.name()))?;

        if let Err(e) = self.log.append(&LogRecord::from_alert(alert, now)).await {
            tracing::warn!(error = ?e, link = %alert.link, "alert sent but log append failed");
        }

        if let Err(e) = registry.insert(&alert.link).await {
            // Registries keep the link in memory even when persisting it fails.
            tracing::warn!(error = ?e, link = %alert.link, "alert sent but seen-link persist failed");
        }
        Ok(())
    }
}
