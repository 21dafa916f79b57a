// ABOUTME: Shell command execution for process-backed collaborators.
// ABOUTME: Runs commands via sh -c with context passed as environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::types::{EnvironmentName, Revision, ServiceName};

/// Context passed to commands via environment variables.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub service: ServiceName,
    pub environment: EnvironmentName,
    pub revision: Revision,
    pub dry_run: bool,
}

impl CommandContext {
    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("SHIPYARD_SERVICE".to_string(), self.service.to_string());
        env.insert(
            "SHIPYARD_ENVIRONMENT".to_string(),
            self.environment.to_string(),
        );
        env.insert("SHIPYARD_REVISION".to_string(), self.revision.to_string());
        env.insert("SHIPYARD_DRY_RUN".to_string(), self.dry_run.to_string());
        env
    }
}

/// Result of running a command.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Last non-empty line of stderr, falling back to stdout.
    pub fn detail(&self) -> String {
        last_line(&self.stderr)
            .or_else(|| last_line(&self.stdout))
            .unwrap_or_default()
            .to_string()
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|l| !l.is_empty())
}

/// Runs shell commands from a working directory.
///
/// Child processes are killed when the returned future is dropped, so
/// callers bound a run with `tokio::time::timeout`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    workdir: PathBuf,
}

impl CommandRunner {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }

    /// Run `command` with extra environment variables.
    ///
    /// Launch failures are reported as an unsuccessful result with the
    /// error in `stderr`.
    pub async fn run(&self, command: &str, env: &HashMap<String, String>) -> CommandResult {
        tracing::debug!("running command: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = CommandResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !result.success {
                    tracing::warn!(
                        "command failed with exit code {:?}: {}",
                        result.exit_code,
                        command
                    );
                }

                result
            }
            Err(e) => {
                tracing::error!("failed to execute command {}: {}", command, e);
                CommandResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        }
    }
}
