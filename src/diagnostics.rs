// ABOUTME: Diagnostics accumulator for non-fatal warnings during a pipeline run.
// ABOUTME: Collects best-effort failures that are reported but never fail the run.

use serde::Serialize;

/// Collects non-fatal warnings during a pipeline run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn notification_delivery(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NotificationDelivery,
            message: message.into(),
        }
    }

    pub fn status_publish(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StatusPublish,
            message: message.into(),
        }
    }

    pub fn rollback_lookup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RollbackLookup,
            message: message.into(),
        }
    }

    pub fn stale_deployment(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StaleDeployment,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The telemetry sink did not accept the run event.
    NotificationDelivery,
    /// The hosting platform's deployment status was not updated.
    StatusPublish,
    /// The rollback target could not be read.
    RollbackLookup,
    /// A deployment was still in progress when post-deploy ran.
    StaleDeployment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings_in_order() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::status_publish("gh exited 1"));
        diag.warn(Warning::notification_delivery("connection refused"));

        let kinds: Vec<_> = diag.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            [WarningKind::StatusPublish, WarningKind::NotificationDelivery]
        );
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::rollback_lookup("x").kind,
            WarningKind::RollbackLookup
        );
        assert_eq!(
            Warning::stale_deployment("x").kind,
            WarningKind::StaleDeployment
        );
    }
}
