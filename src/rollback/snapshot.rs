// ABOUTME: Immutable rollback snapshot record and the metadata supplied at record time.
// ABOUTME: Serialized shape is the persisted rollback metadata contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::Deployment;
use crate::types::{DeploymentId, EnvironmentName, RunId, ServiceName};

/// Metadata not carried by the deployment record itself.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub service: ServiceName,
    pub version: String,
    pub run_id: RunId,
}

/// Everything needed to redeploy a previously successful version.
///
/// Persisted as:
/// `{service, version, environment, timestamp, commit_sha, deployment_id, deployment_url, run_id}`
/// with `timestamp` in RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackSnapshot {
    pub service: ServiceName,
    pub version: String,
    pub environment: EnvironmentName,
    pub timestamp: DateTime<Utc>,
    pub commit_sha: String,
    pub deployment_id: DeploymentId,
    #[serde(default)]
    pub deployment_url: String,
    pub run_id: RunId,
}

impl RollbackSnapshot {
    pub(crate) fn capture(deployment: &Deployment, metadata: SnapshotMetadata) -> Self {
        Self {
            service: metadata.service,
            version: metadata.version,
            environment: deployment.environment().clone(),
            timestamp: Utc::now(),
            commit_sha: deployment.revision().to_string(),
            deployment_id: deployment.id().clone(),
            deployment_url: deployment.url().unwrap_or_default().to_string(),
            run_id: metadata.run_id,
        }
    }
}
