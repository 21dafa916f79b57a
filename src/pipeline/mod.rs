// ABOUTME: Deployment pipeline: fixed stage graph, stage result ledger, and executor.
// ABOUTME: Produces a PipelineReport per invocation.

mod executor;
mod ledger;
mod report;
mod stage;

pub use executor::{Collaborators, PipelineInputs, StageGraphExecutor};
pub use ledger::{OutputKey, StageLedger, StageResult};
pub use report::{
    EXIT_ABORTED, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS, NotificationOutcome,
    PipelineReport, StageReport,
};
pub use stage::{FailureKind, STAGES, Stage, StageFailure, StageId, StageStatus, stage};
