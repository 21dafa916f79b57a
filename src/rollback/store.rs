// ABOUTME: Storage-agnostic rollback store contract.
// ABOUTME: Backends implement append and list; record and latest enforce ordering rules.

use async_trait::async_trait;

use crate::deploy::{Deployment, DeploymentStatus, InvariantViolation};
use crate::types::EnvironmentName;

use super::{RollbackError, RollbackSnapshot, SnapshotMetadata};

/// Append-only store of rollback snapshots.
///
/// Implementations must tolerate concurrent appends from different runs
/// without rewriting existing snapshots.
#[async_trait]
pub trait RollbackStore: Send + Sync {
    /// Persist a snapshot. Never overwrites an existing one.
    async fn append(&self, snapshot: &RollbackSnapshot) -> Result<(), RollbackError>;

    /// All snapshots for an environment, newest first.
    async fn list(
        &self,
        environment: &EnvironmentName,
    ) -> Result<Vec<RollbackSnapshot>, RollbackError>;

    /// Record a snapshot for a successful deployment.
    ///
    /// # Errors
    ///
    /// Returns `RollbackError::Precondition` if the deployment has not
    /// reached `success`.
    async fn record(
        &self,
        deployment: &Deployment,
        metadata: SnapshotMetadata,
    ) -> Result<RollbackSnapshot, RollbackError> {
        if deployment.status() != DeploymentStatus::Success {
            return Err(InvariantViolation::precondition(format!(
                "rollback snapshot requires a successful deployment, {} is {}",
                deployment.id(),
                deployment.status()
            ))
            .into());
        }

        let snapshot = RollbackSnapshot::capture(deployment, metadata);
        self.append(&snapshot).await?;
        tracing::info!(
            environment = %snapshot.environment,
            deployment_id = %snapshot.deployment_id,
            version = %snapshot.version,
            "rollback snapshot recorded"
        );
        Ok(snapshot)
    }

    /// The rollback target for an environment: its newest snapshot.
    async fn latest(
        &self,
        environment: &EnvironmentName,
    ) -> Result<RollbackSnapshot, RollbackError> {
        self.list(environment)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RollbackError::NotFound {
                environment: environment.clone(),
            })
    }
}
