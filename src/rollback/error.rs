// ABOUTME: Rollback store error types with SNAFU pattern.
// ABOUTME: Separates missing snapshots, invariant violations, and storage failures.

use std::path::PathBuf;

use snafu::Snafu;

use crate::deploy::InvariantViolation;
use crate::types::EnvironmentName;

/// Errors from recording or reading rollback snapshots.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RollbackError {
    #[snafu(display("no rollback snapshot recorded for environment {environment}"))]
    NotFound { environment: EnvironmentName },

    #[snafu(display("{source}"))]
    Precondition { source: InvariantViolation },

    #[snafu(display("rollback storage error at {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("malformed rollback snapshot {}: {source}", path.display()))]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("rollback snapshot already exists at {}", path.display()))]
    AlreadyExists { path: PathBuf },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackErrorKind {
    NotFound,
    PreconditionFailed,
    Storage,
}

impl RollbackError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RollbackErrorKind {
        match self {
            RollbackError::NotFound { .. } => RollbackErrorKind::NotFound,
            RollbackError::Precondition { .. } => RollbackErrorKind::PreconditionFailed,
            RollbackError::Io { .. }
            | RollbackError::Malformed { .. }
            | RollbackError::AlreadyExists { .. } => RollbackErrorKind::Storage,
        }
    }
}

impl From<InvariantViolation> for RollbackError {
    fn from(source: InvariantViolation) -> Self {
        RollbackError::Precondition { source }
    }
}
