// ABOUTME: Resolved secrets injected into the pipeline at construction.
// ABOUTME: Enumerates the deploy credential and the optional telemetry credentials.

use std::fmt;

use super::Config;

/// Secrets resolved once from configuration.
///
/// The deploy token is required for real deployments. Notifications are
/// enabled only when both telemetry keys are present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub deploy_token: Option<String>,
    pub telemetry_api_key: Option<String>,
    pub telemetry_app_key: Option<String>,
}

impl Credentials {
    pub fn resolve(config: &Config) -> Self {
        Self {
            deploy_token: config.deploy.token.as_ref().and_then(|v| v.resolve_optional()),
            telemetry_api_key: config.notify.api_key.as_ref().and_then(|v| v.resolve_optional()),
            telemetry_app_key: config.notify.app_key.as_ref().and_then(|v| v.resolve_optional()),
        }
    }

    /// Both telemetry keys, or `None` if either is missing.
    pub fn telemetry(&self) -> Option<(&str, &str)> {
        match (&self.telemetry_api_key, &self.telemetry_app_key) {
            (Some(api), Some(app)) => Some((api.as_str(), app.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("Credentials")
            .field("deploy_token", &redact(&self.deploy_token))
            .field("telemetry_api_key", &redact(&self.telemetry_api_key))
            .field("telemetry_app_key", &redact(&self.telemetry_app_key))
            .finish()
    }
}
