//! Outbound reminder delivery over a JSON webhook, with a log-only fallback
//! when no webhook is configured.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::clinical::Notifier;
use crate::domain::DomainError;

use super::super::gateway::HttpClientTrait;

/// Posts reminder texts to a configured webhook URL.
#[derive(Debug)]
pub struct WebhookNotifier<C: HttpClientTrait> {
    client: C,
    url: String,
    channel: String,
}

impl<C: HttpClientTrait> WebhookNotifier<C> {
    pub fn new(client: C, url: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> Notifier for WebhookNotifier<C> {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        let body = json!({
            "channel": self.channel,
            "text": text,
        });

        self.client
            .post_json(&self.url, vec![("Content-Type", "application/json")], &body)
            .await
            .map_err(|e| DomainError::notification(format!("Webhook delivery failed: {}", e)))?;

        Ok(())
    }
}

/// Fallback notifier that records reminders in the application log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        info!(reminder = %text, "Reminder dispatched to log");
        Ok(())
    }
}
