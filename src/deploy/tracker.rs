// ABOUTME: Deployment tracker enforcing the deployment state machine.
// ABOUTME: Creates records in_progress and moves each to a terminal state exactly once.

use chrono::Utc;

use crate::types::{DeploymentId, EnvironmentName, Revision};

use super::{Deployment, DeploymentStatus, InvariantViolation, Outcome};

/// Owns every deployment record created during one pipeline run.
#[derive(Debug, Default)]
pub struct DeploymentTracker {
    deployments: Vec<Deployment>,
}

impl DeploymentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a deployment for `environment` at `revision`.
    ///
    /// The record passes through `created` and is returned `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation::Conflict` if a non-terminal deployment
    /// already exists for the same environment and revision.
    pub fn create(
        &mut self,
        environment: &EnvironmentName,
        revision: &Revision,
    ) -> Result<Deployment, InvariantViolation> {
        if let Some(existing) = self.deployments.iter().find(|d| {
            &d.environment == environment && &d.revision == revision && !d.status.is_terminal()
        }) {
            return Err(InvariantViolation::Conflict {
                existing: existing.id.clone(),
                environment: environment.clone(),
                revision: revision.clone(),
            });
        }

        let mut deployment = Deployment {
            id: DeploymentId::generate(),
            environment: environment.clone(),
            revision: revision.clone(),
            created_at: Utc::now(),
            status: DeploymentStatus::Created,
            url: None,
        };
        Self::advance(&mut deployment, DeploymentStatus::InProgress)?;

        tracing::info!(
            deployment_id = %deployment.id,
            environment = %environment,
            revision = %revision,
            "deployment created"
        );

        self.deployments.push(deployment.clone());
        Ok(deployment)
    }

    /// Move a deployment from `in_progress` to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation::InvalidTransition` if the deployment is
    /// already terminal, or `PreconditionFailed` if this tracker never
    /// created it.
    pub fn transition(
        &mut self,
        deployment: &Deployment,
        outcome: Outcome,
        url: Option<String>,
    ) -> Result<Deployment, InvariantViolation> {
        let record = self
            .deployments
            .iter_mut()
            .find(|d| d.id == deployment.id)
            .ok_or_else(|| {
                InvariantViolation::precondition(format!(
                    "deployment {} is not tracked by this run",
                    deployment.id
                ))
            })?;

        Self::advance(record, outcome.into())?;
        if url.is_some() {
            record.url = url;
        }

        tracing::info!(
            deployment_id = %record.id,
            status = %record.status,
            url = record.url.as_deref().unwrap_or(""),
            "deployment finished"
        );

        Ok(record.clone())
    }

    /// Current state of a tracked deployment.
    pub fn get(&self, id: &DeploymentId) -> Option<&Deployment> {
        self.deployments.iter().find(|d| &d.id == id)
    }

    /// All deployments created by this tracker, in creation order.
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    fn advance(
        deployment: &mut Deployment,
        next: DeploymentStatus,
    ) -> Result<(), InvariantViolation> {
        if !deployment.status.can_transition_to(next) {
            return Err(InvariantViolation::InvalidTransition {
                deployment: deployment.id.clone(),
                from: deployment.status,
                to: next,
            });
        }
        tracing::debug!(
            deployment_id = %deployment.id,
            from = %deployment.status,
            to = %next,
            "deployment transition"
        );
        deployment.status = next;
        Ok(())
    }
}
