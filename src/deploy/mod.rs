// ABOUTME: Deployment lifecycle tracking for a single pipeline run.
// ABOUTME: Exports the deployment record, its state machine, and invariant errors.

mod deployment;
mod error;
mod state;
mod tracker;

pub use deployment::Deployment;
pub use error::{InvariantKind, InvariantViolation};
pub use state::{DeploymentStatus, Outcome};
pub use tracker::DeploymentTracker;
