pub mod discord;

use anyhow::Result;

/// Outbound alert channel. One call = one message.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}
