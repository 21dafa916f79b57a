// ABOUTME: In-memory ledger of stage results for one pipeline run.
// ABOUTME: Carries typed outputs (cache key, deployment id, URL) between stages.

use serde::{Serialize, Serializer};
use std::fmt;

use super::stage::{STAGES, Stage, StageFailure, StageId, StageStatus};

/// Names of values a stage can hand to later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKey {
    CacheKey,
    Version,
    DeploymentId,
    DeploymentUrl,
    DryRun,
}

impl OutputKey {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKey::CacheKey => "cache_key",
            OutputKey::Version => "version",
            OutputKey::DeploymentId => "deployment_id",
            OutputKey::DeploymentUrl => "deployment_url",
            OutputKey::DryRun => "dry_run",
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status, outputs and failure detail of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub status: StageStatus,
    /// Insertion-ordered outputs. Re-recording a key replaces its value in place.
    #[serde(serialize_with = "serialize_outputs")]
    pub outputs: Vec<(OutputKey, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
}

fn serialize_outputs<S: Serializer>(
    outputs: &[(OutputKey, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(outputs.iter().map(|(k, v)| (k.as_str(), v)))
}

impl StageResult {
    fn pending() -> Self {
        Self {
            status: StageStatus::Pending,
            outputs: Vec::new(),
            failure: None,
        }
    }

    pub fn output(&self, key: OutputKey) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Stage results for the whole run, indexed by `StageId::index`.
#[derive(Debug, Clone)]
pub struct StageLedger {
    results: [StageResult; STAGES.len()],
}

impl Default for StageLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl StageLedger {
    pub fn new() -> Self {
        Self {
            results: std::array::from_fn(|_| StageResult::pending()),
        }
    }

    pub fn result(&self, id: StageId) -> &StageResult {
        &self.results[id.index()]
    }

    fn result_mut(&mut self, id: StageId) -> &mut StageResult {
        &mut self.results[id.index()]
    }

    pub fn status(&self, id: StageId) -> StageStatus {
        self.result(id).status
    }

    /// Value recorded by `stage` under `key`.
    pub fn output(&self, stage: StageId, key: OutputKey) -> Option<&str> {
        self.result(stage).output(key)
    }

    pub fn record_output(&mut self, stage: StageId, key: OutputKey, value: impl Into<String>) {
        let value = value.into();
        tracing::debug!(stage = %stage, key = %key, value = %value, "stage output");
        let outputs = &mut self.result_mut(stage).outputs;
        match outputs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => outputs.push((key, value)),
        }
    }

    pub fn start(&mut self, stage: StageId) {
        self.result_mut(stage).status = StageStatus::Running;
    }

    pub fn succeed(&mut self, stage: StageId) {
        self.result_mut(stage).status = StageStatus::Success;
    }

    pub fn fail(&mut self, stage: StageId, failure: StageFailure) {
        let result = self.result_mut(stage);
        result.status = StageStatus::Failure;
        result.failure = Some(failure);
    }

    pub fn skip(&mut self, stage: StageId) {
        self.result_mut(stage).status = StageStatus::Skipped;
    }

    /// Whether `stage` may start given its dependencies' results.
    ///
    /// Always-run stages need terminal dependencies. Other stages need every
    /// required dependency to have succeeded and every optional one to be
    /// terminal.
    pub fn is_ready(&self, stage: &Stage) -> bool {
        stage.dependencies.iter().all(|dep| {
            let status = self.status(*dep);
            if stage.always_run || !super::stage::stage(*dep).required {
                status.is_terminal()
            } else {
                status == StageStatus::Success
            }
        })
    }

    /// True iff every non-skipped required stage succeeded.
    ///
    /// `exclude` leaves one stage out, so a running stage can ask about
    /// everything before it.
    pub fn succeeded_except(&self, exclude: Option<StageId>) -> bool {
        self.iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter(|(id, _)| super::stage::stage(*id).required)
            .filter(|(_, r)| r.status != StageStatus::Skipped)
            .all(|(_, r)| r.status == StageStatus::Success)
    }

    pub fn overall_success(&self) -> bool {
        self.succeeded_except(None)
    }

    /// Results in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (StageId, &StageResult)> {
        STAGES.iter().map(|s| s.id).zip(self.results.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::stage;

    #[test]
    fn new_ledger_is_all_pending() {
        let ledger = StageLedger::new();
        assert!(ledger.iter().all(|(_, r)| r.status == StageStatus::Pending));
        assert!(!ledger.overall_success());
    }

    #[test]
    fn results_are_kept_per_stage_in_stage_order() {
        let mut ledger = StageLedger::new();
        ledger.succeed(StageId::PreDeploy);
        ledger.fail(StageId::Deploy, StageFailure::collaborator("exit 2"));
        ledger.skip(StageId::PostDeploy);

        let seen: Vec<_> = ledger.iter().map(|(id, r)| (id, r.status)).collect();
        assert_eq!(
            seen,
            [
                (StageId::PreDeploy, StageStatus::Success),
                (StageId::Deploy, StageStatus::Failure),
                (StageId::PostDeploy, StageStatus::Skipped),
            ]
        );
        assert!(ledger.result(StageId::PreDeploy).failure.is_none());
        assert!(ledger.result(StageId::Deploy).failure.is_some());
    }

    #[test]
    fn outputs_keep_insertion_order_and_replace_in_place() {
        let mut ledger = StageLedger::new();
        ledger.record_output(StageId::PreDeploy, OutputKey::Version, "v1");
        ledger.record_output(StageId::PreDeploy, OutputKey::CacheKey, "k");
        ledger.record_output(StageId::PreDeploy, OutputKey::Version, "v2");

        let outputs = &ledger.result(StageId::PreDeploy).outputs;
        assert_eq!(
            outputs,
            &[
                (OutputKey::Version, "v2".to_string()),
                (OutputKey::CacheKey, "k".to_string())
            ]
        );
        assert_eq!(ledger.output(StageId::PreDeploy, OutputKey::CacheKey), Some("k"));
        assert_eq!(ledger.output(StageId::Deploy, OutputKey::CacheKey), None);
    }

    #[test]
    fn deploy_waits_for_successful_pre_deploy() {
        let mut ledger = StageLedger::new();
        assert!(!ledger.is_ready(stage(StageId::Deploy)));

        ledger.fail(StageId::PreDeploy, StageFailure::validation("no token"));
        assert!(!ledger.is_ready(stage(StageId::Deploy)));

        let mut ledger = StageLedger::new();
        ledger.succeed(StageId::PreDeploy);
        assert!(ledger.is_ready(stage(StageId::Deploy)));
    }

    #[test]
    fn post_deploy_runs_after_any_terminal_outcome() {
        let mut ledger = StageLedger::new();
        ledger.fail(StageId::PreDeploy, StageFailure::validation("no token"));
        assert!(!ledger.is_ready(stage(StageId::PostDeploy)));

        ledger.skip(StageId::Deploy);
        assert!(ledger.is_ready(stage(StageId::PostDeploy)));
    }

    #[test]
    fn skipped_stages_do_not_count_but_failures_do() {
        let mut ledger = StageLedger::new();
        ledger.succeed(StageId::PreDeploy);
        ledger.skip(StageId::Deploy);
        ledger.succeed(StageId::PostDeploy);
        assert!(ledger.overall_success());

        ledger.fail(StageId::PreDeploy, StageFailure::collaborator("exit 1"));
        assert!(!ledger.overall_success());
    }

    #[test]
    fn succeeded_except_ignores_running_stage() {
        let mut ledger = StageLedger::new();
        ledger.succeed(StageId::PreDeploy);
        ledger.succeed(StageId::Deploy);
        ledger.start(StageId::PostDeploy);
        assert!(ledger.succeeded_except(Some(StageId::PostDeploy)));
        assert!(!ledger.overall_success());
    }
}
