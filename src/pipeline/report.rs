// ABOUTME: Final report of one pipeline run.
// ABOUTME: Stage outcomes, deployment and rollback state, warnings, and the exit code.

use serde::Serialize;

use crate::deploy::Deployment;
use crate::diagnostics::Warning;
use crate::rollback::RollbackSnapshot;
use crate::types::{EnvironmentName, Revision, RunId, ServiceName};

use super::ledger::{OutputKey, StageLedger, StageResult};
use super::stage::StageId;

/// Exit code of a run where every required stage succeeded.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a run with a failed stage.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when an internal invariant aborted the run.
pub const EXIT_ABORTED: i32 = 2;
/// Exit code when the run was interrupted.
pub const EXIT_INTERRUPTED: i32 = 130;

/// What happened to the run's notification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum NotificationOutcome {
    Delivered,
    /// No telemetry credentials configured.
    Disabled,
    Failed { reason: String },
    /// Post-deploy ended before emitting.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageId,
    #[serde(flatten)]
    pub result: StageResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: RunId,
    pub service: ServiceName,
    pub environment: EnvironmentName,
    pub revision: Revision,
    pub dry_run: bool,
    pub stages: Vec<StageReport>,
    pub deployment: Option<Deployment>,
    /// Snapshot written by this run.
    pub snapshot: Option<RollbackSnapshot>,
    /// Latest known-good snapshot, looked up only when the run failed.
    pub rollback_target: Option<RollbackSnapshot>,
    pub notification: NotificationOutcome,
    pub warnings: Vec<Warning>,
    pub success: bool,
}

impl PipelineReport {
    pub(crate) fn stages_from(ledger: &StageLedger) -> Vec<StageReport> {
        ledger
            .iter()
            .map(|(stage, result)| StageReport {
                stage,
                result: result.clone(),
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn exit_code(&self) -> i32 {
        if self.success { EXIT_SUCCESS } else { EXIT_FAILURE }
    }

    pub fn stage(&self, id: StageId) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|s| s.stage == id)
            .map(|s| &s.result)
    }

    /// First value recorded under `key` by any stage.
    pub fn output(&self, key: OutputKey) -> Option<&str> {
        self.stages.iter().find_map(|s| s.result.output(key))
    }
}
