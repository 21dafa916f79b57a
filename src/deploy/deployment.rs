// ABOUTME: Lifecycle record of one attempt to publish a revision to an environment.
// ABOUTME: Status and URL are the only fields that change after creation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{DeploymentId, EnvironmentName, Revision};

use super::DeploymentStatus;

/// A deployment record owned by the [`DeploymentTracker`](super::DeploymentTracker).
///
/// Callers receive clones; mutation goes through the tracker so the state
/// machine is enforced in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub(crate) id: DeploymentId,
    pub(crate) environment: EnvironmentName,
    pub(crate) revision: Revision,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) status: DeploymentStatus,
    pub(crate) url: Option<String>,
}

impl Deployment {
    pub fn id(&self) -> &DeploymentId {
        &self.id
    }

    pub fn environment(&self) -> &EnvironmentName {
        &self.environment
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    /// External URL reported by the deploy collaborator, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
