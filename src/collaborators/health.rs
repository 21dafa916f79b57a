// ABOUTME: HTTP health check collaborator.
// ABOUTME: A single GET with a timeout; any 2xx or 3xx response counts as reachable.

use std::time::Duration;

use async_trait::async_trait;

use super::HealthCheck;

#[derive(Debug, Clone, Default)]
pub struct HttpHealthCheck {
    client: reqwest::Client,
}

impl HttpHealthCheck {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self, url: &str, timeout: Duration) -> bool {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                let reachable = status.is_success() || status.is_redirection();
                tracing::info!(url, status = status.as_u16(), reachable, "health check");
                reachable
            }
            Err(e) => {
                tracing::warn!(url, "health check failed: {}", e);
                false
            }
        }
    }
}
