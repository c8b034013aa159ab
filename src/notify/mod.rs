//! Slack webhook notification
//!
//! Relays finished recommendation text to a team channel. Delivery problems
//! are reported as [`RadarError::Delivery`] and never abort the pipeline;
//! with no webhook configured the notifier is a no-op.

use crate::config::SlackConfig;
use crate::error::{RadarError, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct SlackNotifier {
    http: Client,
    webhook_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RadarError::Delivery(e.to_string()))?;

        Ok(Self {
            http,
            webhook_url: config.webhook_url.clone(),
        })
    }

    /// Create a no-op notifier (for when no webhook is configured)
    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            webhook_url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// POST the text to the webhook; success is HTTP 2xx.
    pub async fn deliver(&self, text: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            return Ok(());
        };

        let response = self
            .http
            .post(url)
            .json(&WebhookMessage { text })
            .send()
            .await
            .map_err(|e| RadarError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RadarError::Delivery(format!(
                "webhook returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        tracing::info!("recommendation delivered to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                status_line
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    fn notifier_for(url: &str) -> SlackNotifier {
        SlackNotifier::new(&SlackConfig {
            webhook_url: Some(url.to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_noop() {
        let notifier = SlackNotifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.deliver("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_successful_delivery() {
        let url = serve_once("HTTP/1.1 200 OK").await;
        let notifier = notifier_for(&url);
        assert!(notifier.is_enabled());
        notifier.deliver("recommendation text").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_2xx_is_delivery_error() {
        let url = serve_once("HTTP/1.1 404 Not Found").await;
        let notifier = notifier_for(&url);
        let err = notifier.deliver("recommendation text").await.unwrap_err();
        assert!(matches!(err, RadarError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_network_failure_is_delivery_error() {
        let notifier = notifier_for("http://127.0.0.1:9");
        let err = notifier.deliver("recommendation text").await.unwrap_err();
        assert!(matches!(err, RadarError::Delivery(_)));
    }
}
