// ABOUTME: Process-backed collaborators driven by configured shell commands.
// ABOUTME: Maps exit status and stdout onto the collaborator contracts.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::cache_key::CacheKey;
use crate::config::{DeployConfig, StatusConfig, ToolchainConfig};
use crate::deploy::Deployment;
use crate::types::EnvironmentName;

use super::{
    CollaboratorError, CommandContext, CommandResult, CommandRunner, DeployReceipt, Deployer,
    StatusPublisher, Toolchain, ToolchainStep,
};

fn check_exit(what: &str, result: CommandResult) -> Result<CommandResult, CollaboratorError> {
    if result.success {
        return Ok(result);
    }
    match result.exit_code {
        Some(_) => Err(CollaboratorError::NonZeroExit {
            what: what.to_string(),
            code: result.exit_code,
            detail: result.detail(),
        }),
        None => Err(CollaboratorError::Launch {
            what: what.to_string(),
            message: result.detail(),
        }),
    }
}

/// Toolchain steps run as configured shell commands.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    runner: CommandRunner,
    config: ToolchainConfig,
    context: CommandContext,
}

impl CommandToolchain {
    pub fn new(runner: CommandRunner, config: ToolchainConfig, context: CommandContext) -> Self {
        Self {
            runner,
            config,
            context,
        }
    }

    fn command(&self, step: ToolchainStep) -> Option<&str> {
        match step {
            ToolchainStep::Install => self.config.install.as_deref(),
            ToolchainStep::Lint => self.config.lint.as_deref(),
            ToolchainStep::Test => self.config.test.as_deref(),
            ToolchainStep::Build => self.config.build.as_deref(),
        }
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn run(
        &self,
        step: ToolchainStep,
        cache_key: Option<&CacheKey>,
    ) -> Result<(), CollaboratorError> {
        let Some(command) = self.command(step) else {
            tracing::debug!("toolchain step {} not configured, skipping", step);
            return Ok(());
        };

        let mut env = self.context.to_env();
        if let Some(key) = cache_key {
            env.insert("SHIPYARD_CACHE_KEY".to_string(), key.to_string());
        }

        tracing::info!("running toolchain step {}", step);
        let result = self.runner.run(command, &env).await;
        check_exit(step.as_str(), result).map(|_| ())
    }
}

/// Deploys by running the configured deploy command.
#[derive(Clone)]
pub struct CommandDeployer {
    runner: CommandRunner,
    config: DeployConfig,
    context: CommandContext,
    token: Option<String>,
}

impl std::fmt::Debug for CommandDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDeployer")
            .field("command", &self.config.command)
            .finish()
    }
}

impl CommandDeployer {
    pub fn new(
        runner: CommandRunner,
        config: DeployConfig,
        context: CommandContext,
        token: Option<String>,
    ) -> Self {
        Self {
            runner,
            config,
            context,
            token,
        }
    }

    fn env(&self, environment: &EnvironmentName, dry_run: bool) -> HashMap<String, String> {
        let mut env = self.context.to_env();
        env.insert("SHIPYARD_ENVIRONMENT".to_string(), environment.to_string());
        env.insert("SHIPYARD_DRY_RUN".to_string(), dry_run.to_string());
        if let Some(token) = &self.token {
            env.insert("SHIPYARD_DEPLOY_TOKEN".to_string(), token.clone());
        }
        env
    }
}

/// Last stdout line that looks like an HTTP(S) URL.
pub(crate) fn extract_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|l| l.starts_with("https://") || l.starts_with("http://"))
        .map(str::to_string)
}

#[async_trait]
impl Deployer for CommandDeployer {
    async fn deploy(
        &self,
        environment: &EnvironmentName,
        dry_run: bool,
    ) -> Result<DeployReceipt, CollaboratorError> {
        let command = if dry_run {
            match &self.config.dry_run_command {
                Some(command) => command.as_str(),
                None => {
                    tracing::info!(
                        "dry run: would run deploy command `{}` for {}",
                        self.config.command,
                        environment
                    );
                    return Ok(DeployReceipt::default());
                }
            }
        } else {
            self.config.command.as_str()
        };

        let result = self.runner.run(command, &self.env(environment, dry_run)).await;
        let result = check_exit("deploy command", result)?;

        Ok(DeployReceipt {
            url: extract_url(&result.stdout),
        })
    }
}

/// Publishes deployment status by running a configured command.
#[derive(Debug, Clone)]
pub struct CommandStatusPublisher {
    runner: CommandRunner,
    config: StatusConfig,
    context: CommandContext,
}

impl CommandStatusPublisher {
    pub fn new(runner: CommandRunner, config: StatusConfig, context: CommandContext) -> Self {
        Self {
            runner,
            config,
            context,
        }
    }
}

#[async_trait]
impl StatusPublisher for CommandStatusPublisher {
    async fn publish(&self, deployment: &Deployment) -> Result<(), CollaboratorError> {
        let mut env = self.context.to_env();
        env.insert(
            "SHIPYARD_DEPLOYMENT_ID".to_string(),
            deployment.id().to_string(),
        );
        env.insert(
            "SHIPYARD_DEPLOYMENT_STATUS".to_string(),
            deployment.status().to_string(),
        );
        env.insert(
            "SHIPYARD_DEPLOYMENT_URL".to_string(),
            deployment.url().unwrap_or_default().to_string(),
        );

        let result = self.runner.run(&self.config.command, &env).await;
        check_exit("status command", result).map(|_| ())
    }
}

/// Status publisher used when no status command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatusPublisher;

#[async_trait]
impl StatusPublisher for NoopStatusPublisher {
    async fn publish(&self, deployment: &Deployment) -> Result<(), CollaboratorError> {
        tracing::debug!(
            deployment_id = %deployment.id(),
            status = %deployment.status(),
            "no status publisher configured"
        );
        Ok(())
    }
}
