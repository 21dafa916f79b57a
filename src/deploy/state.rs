// ABOUTME: Deployment lifecycle states and terminal outcomes.
// ABOUTME: created -> in_progress -> success | failure, with no exit from a terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a deployment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Allocated but not yet started. Only observable inside the tracker.
    Created,
    /// Deploy collaborator is (or may be) running.
    InProgress,
    /// Deployed and verified.
    Success,
    /// Deploy failed.
    Failure,
}

impl DeploymentStatus {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failure)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: DeploymentStatus) -> bool {
        matches!(
            (self, next),
            (DeploymentStatus::Created, DeploymentStatus::InProgress)
                | (DeploymentStatus::InProgress, DeploymentStatus::Success)
                | (DeploymentStatus::InProgress, DeploymentStatus::Failure)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::Created => "created",
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported to [`DeploymentTracker::transition`](super::DeploymentTracker::transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for DeploymentStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => DeploymentStatus::Success,
            Outcome::Failure => DeploymentStatus::Failure,
        }
    }
}
