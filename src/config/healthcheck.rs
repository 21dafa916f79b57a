// ABOUTME: Post-deploy health check configuration.
// ABOUTME: One bounded probe after a fixed delay, never an open-ended retry loop.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthcheckConfig {
    /// Path appended to the deployment URL.
    #[serde(default = "default_path")]
    pub path: String,

    /// Wait before the single probe.
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl HealthcheckConfig {
    /// Probe URL for a deployment base URL.
    pub fn probe_url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            delay: default_delay(),
            timeout: default_timeout(),
        }
    }
}

fn default_path() -> String {
    "/".to_string()
}

fn default_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
