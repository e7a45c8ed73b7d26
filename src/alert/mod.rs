pub mod format;
pub mod slack;

use anyhow::Result;
use async_trait::async_trait;

pub use format::{format_notification, Notification};
pub use slack::SlackWebhook;

/// Delivery channel for notifications. Fire-and-forget: only transport
/// failures are reported.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<()>;
}
