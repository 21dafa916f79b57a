// ABOUTME: Test support utilities.
// ABOUTME: Scripted collaborators, a recording notification sink, and a pipeline harness.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shipyard::cache_key::CacheKey;
use shipyard::collaborators::{
    CollaboratorError, DeployReceipt, Deployer, HealthCheck, StatusPublisher,
    Toolchain, ToolchainStep,
};
use shipyard::config::{Config, Credentials};
use shipyard::deploy::{Deployment, DeploymentStatus};
use shipyard::notify::{Ack, DeliveryError, NotificationEmitter, NotificationEvent, NotificationSink};
use shipyard::pipeline::{Collaborators, PipelineInputs, StageGraphExecutor};
use shipyard::rollback::{MemoryRollbackStore, RollbackStore};
use shipyard::types::{EnvironmentName, Revision};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("shipyard=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const REVISION: &str = "0123456789abcdef0123456789abcdef01234567";
pub const DEPLOY_URL: &str = "https://staging.example.com";

/// Toolchain that records every step and fails the configured one.
#[derive(Default)]
pub struct ScriptedToolchain {
    pub calls: Mutex<Vec<ToolchainStep>>,
    /// Cache key handed to each step, in call order.
    pub cache_keys: Mutex<Vec<Option<CacheKey>>>,
    pub fail_on: Option<ToolchainStep>,
    /// Install overwrites this file with new content, like a lock file refresh.
    pub rewrite_on_install: Option<(PathBuf, String)>,
}

#[async_trait]
impl Toolchain for ScriptedToolchain {
    async fn run(
        &self,
        step: ToolchainStep,
        cache_key: Option<&CacheKey>,
    ) -> Result<(), CollaboratorError> {
        self.calls.lock().push(step);
        self.cache_keys.lock().push(cache_key.cloned());
        if step == ToolchainStep::Install {
            if let Some((path, content)) = &self.rewrite_on_install {
                std::fs::write(path, content).unwrap();
            }
        }
        if self.fail_on == Some(step) {
            return Err(CollaboratorError::NonZeroExit {
                what: step.to_string(),
                code: Some(1),
                detail: format!("{step} failed"),
            });
        }
        Ok(())
    }
}

pub enum DeployBehavior {
    Succeed(Option<String>),
    Fail,
    Hang,
    Panic,
}

/// Deployer that records `(environment, dry_run)` calls.
pub struct ScriptedDeployer {
    pub calls: Mutex<Vec<(EnvironmentName, bool)>>,
    pub behavior: DeployBehavior,
}

impl ScriptedDeployer {
    pub fn new(behavior: DeployBehavior) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            behavior,
        }
    }
}

#[async_trait]
impl Deployer for ScriptedDeployer {
    async fn deploy(
        &self,
        environment: &EnvironmentName,
        dry_run: bool,
    ) -> Result<DeployReceipt, CollaboratorError> {
        self.calls.lock().push((environment.clone(), dry_run));
        match &self.behavior {
            DeployBehavior::Succeed(url) => Ok(DeployReceipt { url: url.clone() }),
            DeployBehavior::Fail => Err(CollaboratorError::NonZeroExit {
                what: "deploy command".to_string(),
                code: Some(2),
                detail: "quota exceeded".to_string(),
            }),
            DeployBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(DeployReceipt::default())
            }
            DeployBehavior::Panic => panic!("deployer exploded"),
        }
    }
}

/// Health check with a fixed answer.
pub struct StaticHealth {
    pub reachable: bool,
    pub probes: Mutex<Vec<String>>,
}

impl StaticHealth {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            probes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HealthCheck for StaticHealth {
    async fn check(&self, url: &str, _timeout: Duration) -> bool {
        self.probes.lock().push(url.to_string());
        self.reachable
    }
}

/// Status publisher that records published statuses.
#[derive(Default)]
pub struct RecordingStatus {
    pub published: Mutex<Vec<DeploymentStatus>>,
    pub fail: bool,
}

#[async_trait]
impl StatusPublisher for RecordingStatus {
    async fn publish(&self, deployment: &Deployment) -> Result<(), CollaboratorError> {
        self.published.lock().push(deployment.status());
        if self.fail {
            return Err(CollaboratorError::Launch {
                what: "status command".to_string(),
                message: "gh: not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Sink that records every delivery attempt.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<NotificationEvent>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<Ack, DeliveryError> {
        self.events.lock().push(event.clone());
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(Ack::Delivered)
    }
}

/// Everything a pipeline run touches, with handles kept for assertions.
pub struct Harness {
    pub config: Config,
    pub credentials: Credentials,
    pub toolchain: Arc<ScriptedToolchain>,
    pub deployer: Arc<ScriptedDeployer>,
    pub health: Arc<StaticHealth>,
    pub status: Arc<RecordingStatus>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<dyn RollbackStore>,
    pub memory: MemoryRollbackStore,
}

impl Harness {
    /// A deploy that succeeds with `DEPLOY_URL` and healthy probes.
    pub fn new() -> Self {
        init_tracing();
        let memory = MemoryRollbackStore::new();
        Self {
            config: Config::template(),
            credentials: Credentials {
                deploy_token: Some("token".to_string()),
                telemetry_api_key: Some("api".to_string()),
                telemetry_app_key: Some("app".to_string()),
            },
            toolchain: Arc::new(ScriptedToolchain::default()),
            deployer: Arc::new(ScriptedDeployer::new(DeployBehavior::Succeed(Some(
                DEPLOY_URL.to_string(),
            )))),
            health: Arc::new(StaticHealth::new(true)),
            status: Arc::new(RecordingStatus::default()),
            sink: Arc::new(RecordingSink::default()),
            store: Arc::new(memory.clone()),
            memory,
        }
    }

    pub fn deploy_behavior(mut self, behavior: DeployBehavior) -> Self {
        self.deployer = Arc::new(ScriptedDeployer::new(behavior));
        self
    }

    pub fn executor(&self) -> StageGraphExecutor {
        let collaborators = Collaborators {
            toolchain: self.toolchain.clone(),
            deployer: self.deployer.clone(),
            health: self.health.clone(),
            status: self.status.clone(),
        };
        StageGraphExecutor::new(
            self.config.clone(),
            self.credentials.clone(),
            collaborators,
            self.store.clone(),
            NotificationEmitter::new(self.sink.clone()),
        )
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.sink.events.lock().clone()
    }
}

pub fn inputs(environment: &str) -> PipelineInputs {
    PipelineInputs::new(
        EnvironmentName::new(environment).unwrap(),
        Revision::new(REVISION).unwrap(),
    )
}
