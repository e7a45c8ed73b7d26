use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::format::Notification;
use super::AlertSink;

/// Slack incoming webhook.
pub struct SlackWebhook {
    client: Client,
    webhook_url: String,
}

impl SlackWebhook {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[async_trait]
impl AlertSink for SlackWebhook {
    async fn dispatch(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(notification)
            .send()
            .await
            .context("Slack webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Slack webhook returned {}: {}", status, body);
        }
        Ok(())
    }
}
