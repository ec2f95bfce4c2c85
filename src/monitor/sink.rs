//! Alert delivery.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::AlertSinkConfig;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A formatted alert ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    pub severity: Severity,
    /// Component that raised the alert.
    pub source: String,
    pub title: String,
    /// Slack-flavoured markdown body.
    pub mrkdwn: String,
}

/// Errors raised while delivering an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("alert endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("alert sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for alerts. Delivery failures must be returned, not swallowed.
pub trait AlertSink: Send + Sync {
    fn send(&self, message: &AlertMessage) -> impl Future<Output = Result<(), AlertError>> + Send;
}

/// Writes alerts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        match message.severity {
            Severity::Info => tracing::info!(source = %message.source, title = %message.title, "{}", message.mrkdwn),
            Severity::Warning => tracing::warn!(source = %message.source, title = %message.title, "{}", message.mrkdwn),
        }
        Ok(())
    }
}

/// JSON payload for a Slack-compatible incoming webhook.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: String,
    mrkdwn: bool,
    username: &'a str,
}

/// Posts alerts to an incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

impl AlertSink for WebhookSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let payload = WebhookPayload {
            text: format!("*{}*\n{}", message.title, message.mrkdwn),
            mrkdwn: true,
            username: &message.source,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlertError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}

/// The sink selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    Log(LogSink),
    Webhook(WebhookSink),
}

impl ConfiguredSink {
    /// Webhook when a URL is configured, log otherwise.
    pub fn from_config(config: &AlertSinkConfig) -> Result<Self, AlertError> {
        match &config.webhook_url {
            Some(url) => {
                let timeout = Duration::from_secs(config.request_timeout_secs);
                Ok(ConfiguredSink::Webhook(WebhookSink::new(url.clone(), timeout)?))
            }
            None => {
                tracing::warn!("No alert webhook configured, alerts will only be logged");
                Ok(ConfiguredSink::Log(LogSink))
            }
        }
    }
}

impl AlertSink for ConfiguredSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        match self {
            ConfiguredSink::Log(sink) => sink.send(message).await,
            ConfiguredSink::Webhook(sink) => sink.send(message).await,
        }
    }
}
