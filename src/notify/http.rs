// ABOUTME: HTTP notification sink posting events as JSON.
// ABOUTME: Any non-2xx response or transport error is a delivery failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Ack, DeliveryError, NotificationEvent, NotificationSink};

pub const DEFAULT_EVENTS_ENDPOINT: &str = "https://api.datadoghq.com/api/v1/events";

/// Connection settings for [`HttpSink`].
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub endpoint: String,
    pub api_key: String,
    pub app_key: String,
    pub source_type_name: String,
    pub timeout: Duration,
}

/// Wire body sent to the events endpoint.
#[derive(Debug, Serialize)]
struct EventBody<'a> {
    title: &'a str,
    text: &'a str,
    tags: Vec<String>,
    alert_type: &'static str,
    source_type_name: &'a str,
}

pub struct HttpSink {
    client: reqwest::Client,
    config: HttpSinkConfig,
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn body<'a>(&'a self, event: &'a NotificationEvent) -> EventBody<'a> {
        EventBody {
            title: &event.title,
            text: &event.text,
            tags: event.tags.to_strings(),
            alert_type: event.severity.as_str(),
            source_type_name: &self.config.source_type_name,
        }
    }
}

#[async_trait]
impl NotificationSink for HttpSink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<Ack, DeliveryError> {
        let body = serde_json::to_vec(&self.body(event))
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("content-type", "application/json")
            .header("DD-API-KEY", &self.config.api_key)
            .header("DD-APPLICATION-KEY", &self.config.app_key)
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Ack::Delivered)
    }
}
