// ABOUTME: Internal invariant violations raised by the deployment tracker and rollback store.
// ABOUTME: These indicate programming errors and abort a pipeline run immediately.

use crate::types::{DeploymentId, EnvironmentName, Revision};

use super::DeploymentStatus;

/// An internal invariant was broken. Never expected in correct usage.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    /// A deployment was asked to make an illegal state change.
    #[error("invalid transition for deployment {deployment}: {from} -> {to}")]
    InvalidTransition {
        deployment: DeploymentId,
        from: DeploymentStatus,
        to: DeploymentStatus,
    },

    /// An operation was invoked before its required prior state was reached.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A non-terminal deployment already exists for the same target.
    #[error("conflict: deployment {existing} for {environment}@{revision} is still in progress")]
    Conflict {
        existing: DeploymentId,
        environment: EnvironmentName,
        revision: Revision,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    InvalidTransition,
    PreconditionFailed,
    Conflict,
}

impl InvariantViolation {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> InvariantKind {
        match self {
            InvariantViolation::InvalidTransition { .. } => InvariantKind::InvalidTransition,
            InvariantViolation::PreconditionFailed(_) => InvariantKind::PreconditionFailed,
            InvariantViolation::Conflict { .. } => InvariantKind::Conflict,
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        InvariantViolation::PreconditionFailed(message.into())
    }
}
