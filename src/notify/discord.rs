use super::Notifier;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

// Discord rejects message content above this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, content: &str) -> Result<()> {
        let payload = DiscordWebhookPayload::text(content);

        let rsp = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!(e).context("Discord webhook request failed"))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Discord webhook returned non-success");
            return Err(anyhow!("Discord webhook HTTP error: {status}"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: String,
}

impl DiscordWebhookPayload {
    fn text(content: &str) -> Self {
        let content = if content.chars().count() > MAX_CONTENT_CHARS {
            let mut cut: String = content.chars().take(MAX_CONTENT_CHARS - 1).collect();
            cut.push('…');
            cut
        } else {
            content.to_string()
        };
        Self { content }
    }
}
