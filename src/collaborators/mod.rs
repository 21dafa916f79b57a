// ABOUTME: Contracts for the external systems the pipeline drives.
// ABOUTME: Toolchain, deploy, health check, and deployment status collaborators.

mod command;
mod health;
mod process;

pub use command::{CommandContext, CommandResult, CommandRunner};
pub use health::HttpHealthCheck;
pub use process::{CommandDeployer, CommandStatusPublisher, CommandToolchain, NoopStatusPublisher};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache_key::CacheKey;
use crate::deploy::Deployment;
use crate::types::EnvironmentName;

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{what} exited with status {code:?}: {detail}")]
    NonZeroExit {
        what: String,
        code: Option<i32>,
        detail: String,
    },

    #[error("{what} timed out after {}s", timeout.as_secs())]
    Timeout { what: String, timeout: Duration },

    #[error("failed to launch {what}: {message}")]
    Launch { what: String, message: String },
}

/// A build/test tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolchainStep {
    Install,
    Lint,
    Test,
    Build,
}

impl ToolchainStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolchainStep::Install => "install",
            ToolchainStep::Lint => "lint",
            ToolchainStep::Test => "test",
            ToolchainStep::Build => "build",
        }
    }
}

impl fmt::Display for ToolchainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the deploy collaborator returned on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReceipt {
    /// Deployment URL; `None` when the collaborator printed none.
    pub url: Option<String>,
}

/// Installs dependencies, lints, tests and builds.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Run one step. Unconfigured steps succeed without doing anything.
    ///
    /// `cache_key` identifies the dependency set as it was before any step
    /// ran, so an install step can restore or reuse a cache under it.
    async fn run(
        &self,
        step: ToolchainStep,
        cache_key: Option<&CacheKey>,
    ) -> Result<(), CollaboratorError>;
}

/// Publishes code to an environment.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(
        &self,
        environment: &EnvironmentName,
        dry_run: bool,
    ) -> Result<DeployReceipt, CollaboratorError>;
}

/// Probes a deployed URL once.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Whether `url` answered within `timeout`.
    async fn check(&self, url: &str, timeout: Duration) -> bool;
}

/// Mirrors the final deployment state to the hosting platform.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, deployment: &Deployment) -> Result<(), CollaboratorError>;
}
