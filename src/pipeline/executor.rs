// ABOUTME: Stage graph executor running pre-deploy, deploy and post-deploy in order.
// ABOUTME: Drives the deployment state machine, rollback store and notification emitter.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::cache_key::{self, CacheKey, Fingerprint};
use crate::collaborators::{CollaboratorError, Deployer, HealthCheck, StatusPublisher, Toolchain, ToolchainStep};
use crate::config::{Config, Credentials};
use crate::deploy::{Deployment, DeploymentTracker, InvariantViolation, Outcome};
use crate::diagnostics::{Diagnostics, Warning};
use crate::notify::{Ack, NotificationEmitter, NotificationEvent, Severity, Tags};
use crate::rollback::{RollbackError, RollbackErrorKind, RollbackSnapshot, RollbackStore, SnapshotMetadata};
use crate::types::{DeploymentId, EnvironmentName, Revision, RunId};

use super::ledger::{OutputKey, StageLedger};
use super::report::{NotificationOutcome, PipelineReport};
use super::stage::{STAGES, StageFailure, StageId};

const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a stage body: `Err` is a stage-local failure, not an abort.
type StageOutcome = Result<(), StageFailure>;

/// The external systems one run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub toolchain: Arc<dyn Toolchain>,
    pub deployer: Arc<dyn Deployer>,
    pub health: Arc<dyn HealthCheck>,
    pub status: Arc<dyn StatusPublisher>,
}

/// Per-invocation inputs.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub environment: EnvironmentName,
    pub revision: Revision,
    pub dry_run: bool,
    pub run_id: RunId,
}

impl PipelineInputs {
    pub fn new(environment: EnvironmentName, revision: Revision) -> Self {
        Self {
            environment,
            revision,
            dry_run: false,
            run_id: RunId::generate(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }
}

/// Mutable state owned by one run.
struct RunState<'a> {
    inputs: &'a PipelineInputs,
    ledger: StageLedger,
    tracker: DeploymentTracker,
    deployment: Option<DeploymentId>,
    cache_key: Option<CacheKey>,
    snapshot: Option<RollbackSnapshot>,
    rollback_target: Option<RollbackSnapshot>,
    notification: NotificationOutcome,
    diagnostics: Diagnostics,
}

impl<'a> RunState<'a> {
    fn new(inputs: &'a PipelineInputs) -> Self {
        Self {
            inputs,
            ledger: StageLedger::new(),
            tracker: DeploymentTracker::new(),
            deployment: None,
            cache_key: None,
            snapshot: None,
            rollback_target: None,
            notification: NotificationOutcome::NotAttempted,
            diagnostics: Diagnostics::default(),
        }
    }

    fn current_deployment(&self) -> Option<&Deployment> {
        self.deployment.as_ref().and_then(|id| self.tracker.get(id))
    }

    /// Move the run's deployment to `failure` unless it is already terminal.
    fn fail_deployment(&mut self, url: Option<String>) -> Result<(), InvariantViolation> {
        let Some(deployment) = self
            .current_deployment()
            .filter(|d| !d.status().is_terminal())
            .cloned()
        else {
            return Ok(());
        };
        self.tracker.transition(&deployment, Outcome::Failure, url)?;
        Ok(())
    }

    fn into_report(self, executor: &StageGraphExecutor) -> PipelineReport {
        let deployment = self.current_deployment().cloned();
        PipelineReport {
            run_id: self.inputs.run_id.clone(),
            service: executor.config.service.clone(),
            environment: self.inputs.environment.clone(),
            revision: self.inputs.revision.clone(),
            dry_run: self.inputs.dry_run,
            stages: PipelineReport::stages_from(&self.ledger),
            success: self.ledger.overall_success(),
            deployment,
            snapshot: self.snapshot,
            rollback_target: self.rollback_target,
            notification: self.notification,
            warnings: self.diagnostics.into_warnings(),
        }
    }
}

/// Runs the fixed three-stage pipeline for one invocation.
pub struct StageGraphExecutor {
    config: Config,
    credentials: Credentials,
    collaborators: Collaborators,
    store: Arc<dyn RollbackStore>,
    emitter: NotificationEmitter,
    workdir: PathBuf,
}

impl StageGraphExecutor {
    pub fn new(
        config: Config,
        credentials: Credentials,
        collaborators: Collaborators,
        store: Arc<dyn RollbackStore>,
        emitter: NotificationEmitter,
    ) -> Self {
        Self {
            config,
            credentials,
            collaborators,
            store,
            emitter,
            workdir: PathBuf::from("."),
        }
    }

    /// Directory that relative cache file paths resolve against.
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Run every stage and report the outcome.
    ///
    /// Stage failures are captured in the report. Dropping the returned
    /// future cancels the run; a deployment already created then stays
    /// `in_progress` and no notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an `InvariantViolation` if the deployment state machine or
    /// the rollback ordering rules are broken. The run stops immediately.
    #[tracing::instrument(skip_all, fields(run_id = %inputs.run_id, environment = %inputs.environment, dry_run = inputs.dry_run))]
    pub async fn run(&self, inputs: &PipelineInputs) -> Result<PipelineReport, InvariantViolation> {
        let mut state = RunState::new(inputs);

        for stage in &STAGES {
            if !state.ledger.is_ready(stage) {
                tracing::info!(stage = %stage.id, "stage skipped, dependencies did not succeed");
                state.ledger.skip(stage.id);
                continue;
            }

            tracing::info!(stage = %stage.id, "stage started");
            state.ledger.start(stage.id);

            // A panicking body still leaves later always-run stages to run.
            let outcome = match AssertUnwindSafe(self.run_stage(stage.id, &mut state))
                .catch_unwind()
                .await
            {
                Ok(result) => result?,
                Err(panic) => Err(StageFailure::collaborator(format!(
                    "stage panicked: {}",
                    panic_message(&*panic)
                ))),
            };

            match outcome {
                Ok(()) => {
                    tracing::info!(stage = %stage.id, "stage succeeded");
                    state.ledger.succeed(stage.id);
                }
                Err(failure) => {
                    tracing::warn!(stage = %stage.id, "stage failed: {}", failure);
                    state.ledger.fail(stage.id, failure);
                }
            }
        }

        let report = state.into_report(self);
        tracing::info!(success = report.success, "pipeline finished");
        Ok(report)
    }

    async fn run_stage(
        &self,
        id: StageId,
        state: &mut RunState<'_>,
    ) -> Result<StageOutcome, InvariantViolation> {
        match id {
            StageId::PreDeploy => self.pre_deploy(state).await,
            StageId::Deploy => self.deploy(state).await,
            StageId::PostDeploy => self.post_deploy(state).await,
        }
    }

    async fn pre_deploy(&self, state: &mut RunState<'_>) -> Result<StageOutcome, InvariantViolation> {
        let inputs = state.inputs;

        if !inputs.dry_run {
            let deployment = state.tracker.create(&inputs.environment, &inputs.revision)?;
            state
                .ledger
                .record_output(StageId::PreDeploy, OutputKey::DeploymentId, deployment.id().as_str());
            state.deployment = Some(deployment.id().clone());
        }

        let outcome = self.prepare(state).await;
        if outcome.is_err() {
            state.fail_deployment(None)?;
        }
        Ok(outcome)
    }

    async fn prepare(&self, state: &mut RunState<'_>) -> StageOutcome {
        let inputs = state.inputs;

        if !self.config.declares(&inputs.environment) {
            let declared: Vec<&str> = self.config.environments.iter().map(|e| e.as_str()).collect();
            return Err(StageFailure::validation(format!(
                "environment '{}' is not declared (declared: {})",
                inputs.environment,
                declared.join(", ")
            )));
        }

        if !inputs.dry_run && self.credentials.deploy_token.is_none() {
            return Err(StageFailure::validation("deploy credential is not set"));
        }

        // Derived before install so the key names the dependency set as checked out.
        if let Some(key) = self.cache_key().await? {
            state
                .ledger
                .record_output(StageId::PreDeploy, OutputKey::CacheKey, key.as_str());
            state.cache_key = Some(key);
        }

        for step in [ToolchainStep::Install, ToolchainStep::Lint, ToolchainStep::Test] {
            self.toolchain_step(step, state.cache_key.as_ref()).await?;
        }

        state
            .ledger
            .record_output(StageId::PreDeploy, OutputKey::Version, self.version(&inputs.revision));
        Ok(())
    }

    async fn deploy(&self, state: &mut RunState<'_>) -> Result<StageOutcome, InvariantViolation> {
        let inputs = state.inputs;

        if let Err(failure) = self
            .toolchain_step(ToolchainStep::Build, state.cache_key.as_ref())
            .await
        {
            state.fail_deployment(None)?;
            return Ok(Err(failure));
        }

        let receipt = bounded(
            "deploy",
            self.config.deploy.timeout,
            self.collaborators.deployer.deploy(&inputs.environment, inputs.dry_run),
        )
        .await;

        if inputs.dry_run {
            let receipt = match receipt {
                Ok(receipt) => receipt,
                Err(e) => return Ok(Err(StageFailure::collaborator(e.to_string()))),
            };
            state.ledger.record_output(StageId::Deploy, OutputKey::DryRun, "true");
            if let Some(url) = receipt.url.filter(|u| !u.trim().is_empty()) {
                state.ledger.record_output(StageId::Deploy, OutputKey::DeploymentUrl, url);
            }
            tracing::info!("dry run, no deployment recorded");
            return Ok(Ok(()));
        }

        let deployment = state.current_deployment().cloned().ok_or_else(|| {
            InvariantViolation::precondition("deploy stage started without a deployment record")
        })?;

        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(e) => {
                state.tracker.transition(&deployment, Outcome::Failure, None)?;
                return Ok(Err(StageFailure::collaborator(e.to_string())));
            }
        };

        let url = receipt.url.filter(|u| !u.trim().is_empty());
        if let Some(url) = &url {
            state
                .ledger
                .record_output(StageId::Deploy, OutputKey::DeploymentUrl, url.clone());
        }

        if let Some(failure) = self.verify_health(url.as_deref()).await {
            state.tracker.transition(&deployment, Outcome::Failure, url)?;
            return Ok(Err(failure));
        }

        let deployment = state.tracker.transition(&deployment, Outcome::Success, url)?;

        let metadata = SnapshotMetadata {
            service: self.config.service.clone(),
            version: self.version(&inputs.revision),
            run_id: inputs.run_id.clone(),
        };
        match self.store.record(&deployment, metadata).await {
            Ok(snapshot) => {
                state.snapshot = Some(snapshot);
                Ok(Ok(()))
            }
            Err(RollbackError::Precondition { source }) => Err(source),
            Err(e) => Ok(Err(StageFailure::collaborator(format!(
                "rollback snapshot not recorded: {e}"
            )))),
        }
    }

    async fn post_deploy(&self, state: &mut RunState<'_>) -> Result<StageOutcome, InvariantViolation> {
        if let Some(deployment) = state.current_deployment().cloned() {
            let deployment = if deployment.status().is_terminal() {
                deployment
            } else {
                state.diagnostics.warn(Warning::stale_deployment(format!(
                    "deployment {} was still in progress, marking it failed",
                    deployment.id()
                )));
                state.tracker.transition(&deployment, Outcome::Failure, None)?
            };
            self.publish_status(&deployment, &mut state.diagnostics).await;
        }

        let success = state.ledger.succeeded_except(Some(StageId::PostDeploy));
        if !success {
            self.lookup_rollback_target(state).await;
        }

        let event = self.build_event(state, success);
        state.notification = match self.emitter.emit(&event).await {
            Ok(Ack::Delivered) => NotificationOutcome::Delivered,
            Ok(Ack::Disabled) => NotificationOutcome::Disabled,
            Err(e) => {
                state
                    .diagnostics
                    .warn(Warning::notification_delivery(format!("notification not delivered: {e}")));
                NotificationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(Ok(()))
    }

    async fn toolchain_step(&self, step: ToolchainStep, cache_key: Option<&CacheKey>) -> StageOutcome {
        bounded(
            step.as_str(),
            self.config.toolchain.timeout,
            self.collaborators.toolchain.run(step, cache_key),
        )
        .await
        .map_err(|e| StageFailure::collaborator(e.to_string()))
    }

    async fn cache_key(&self) -> Result<Option<CacheKey>, StageFailure> {
        let cache = &self.config.cache;
        if cache.is_empty() {
            return Ok(None);
        }

        let mut fingerprints = Vec::with_capacity(cache.files.len() + cache.selectors.len());
        for file in &cache.files {
            let fingerprint = Fingerprint::of_file(&self.workdir, file).await.map_err(|e| {
                StageFailure::validation(format!("cannot fingerprint {}: {e}", file.display()))
            })?;
            fingerprints.push(fingerprint);
        }
        fingerprints.extend(cache.selectors.iter().cloned().map(Fingerprint::selector));

        cache_key::derive(&fingerprints)
            .map(Some)
            .map_err(|e| StageFailure::validation(e.to_string()))
    }

    fn version(&self, revision: &Revision) -> String {
        format!("{}-{}", self.config.service, revision.short())
    }

    /// Probe the deployed URL once, after the configured delay.
    ///
    /// Returns `None` when healthy or when there is nothing to check.
    async fn verify_health(&self, url: Option<&str>) -> Option<StageFailure> {
        let (Some(url), Some(healthcheck)) = (url, &self.config.healthcheck) else {
            return None;
        };

        let probe = healthcheck.probe_url(url);
        tracing::info!(url = %probe, "waiting {}s before health check", healthcheck.delay.as_secs());
        tokio::time::sleep(healthcheck.delay).await;

        let reachable = tokio::time::timeout(
            healthcheck.timeout,
            self.collaborators.health.check(&probe, healthcheck.timeout),
        )
        .await
        .unwrap_or(false);

        if reachable {
            tracing::info!(url = %probe, "health check passed");
            None
        } else {
            Some(StageFailure::collaborator(format!(
                "health check failed: {probe} is unreachable"
            )))
        }
    }

    async fn publish_status(&self, deployment: &Deployment, diagnostics: &mut Diagnostics) {
        let timeout = self
            .config
            .status
            .as_ref()
            .map_or(DEFAULT_STATUS_TIMEOUT, |s| s.timeout);

        if let Err(e) = bounded(
            "status update",
            timeout,
            self.collaborators.status.publish(deployment),
        )
        .await
        {
            diagnostics.warn(Warning::status_publish(format!(
                "deployment status for {} not published: {e}",
                deployment.id()
            )));
        }
    }

    async fn lookup_rollback_target(&self, state: &mut RunState<'_>) {
        match self.store.latest(&state.inputs.environment).await {
            Ok(snapshot) => {
                tracing::info!(
                    version = %snapshot.version,
                    deployment_id = %snapshot.deployment_id,
                    "rollback target available"
                );
                state.rollback_target = Some(snapshot);
            }
            Err(e) if e.kind() == RollbackErrorKind::NotFound => {
                tracing::info!("no rollback target recorded for {}", state.inputs.environment);
            }
            Err(e) => {
                state
                    .diagnostics
                    .warn(Warning::rollback_lookup(format!("rollback target unavailable: {e}")));
            }
        }
    }

    fn build_event(&self, state: &RunState<'_>, success: bool) -> NotificationEvent {
        let inputs = state.inputs;
        let status = if success { "success" } else { "failure" };

        let mut tags = Tags::new(
            &self.config.notify.source,
            inputs.environment.as_str(),
            &self.config.repo,
            status,
        );
        for raw in &self.config.notify.tags {
            tags = tags.with_raw(raw);
        }
        if let Some(version) = state.ledger.output(StageId::PreDeploy, OutputKey::Version) {
            tags = tags.with("version", version);
        }
        if let Some(id) = state.ledger.output(StageId::PreDeploy, OutputKey::DeploymentId) {
            tags = tags.with("deployment_id", id);
        }

        let title = format!(
            "{} deploy to {} {}{}",
            self.config.service,
            inputs.environment,
            if success { "succeeded" } else { "failed" },
            if inputs.dry_run { " (dry run)" } else { "" }
        );

        let mut lines = vec![
            format!("revision: {}", inputs.revision),
            format!("run: {}", inputs.run_id),
        ];
        for (id, result) in state.ledger.iter() {
            if id == StageId::PostDeploy {
                continue;
            }
            match &result.failure {
                Some(failure) => lines.push(format!("{id}: {} ({failure})", result.status)),
                None => lines.push(format!("{id}: {}", result.status)),
            }
        }
        if let Some(url) = state.ledger.output(StageId::Deploy, OutputKey::DeploymentUrl) {
            lines.push(format!("url: {url}"));
        }
        if let Some(target) = &state.rollback_target {
            lines.push(format!(
                "rollback target: {} ({})",
                target.version, target.commit_sha
            ));
        }

        let severity = if success { Severity::Info } else { Severity::Error };
        NotificationEvent::new(title, lines.join("\n"), tags, severity)
    }
}

/// Bound a collaborator call by `limit`.
async fn bounded<T>(
    what: &str,
    limit: Duration,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            what: what.to_string(),
            timeout: limit,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
