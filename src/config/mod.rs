// ABOUTME: Configuration types and parsing for shipyard.yml.
// ABOUTME: Handles YAML parsing, durations, secret references, and environment validation.

mod credentials;
mod env_value;
mod healthcheck;

pub use credentials::Credentials;
pub use env_value::EnvValue;
pub use healthcheck::HealthcheckConfig;

use crate::error::{Error, Result};
use crate::notify::DEFAULT_EVENTS_ENDPOINT;
use crate::types::{EnvironmentName, ServiceName};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "shipyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "shipyard.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".shipyard/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceName,

    /// Repository identity used in notification tags (e.g. `org/web`).
    pub repo: String,

    #[serde(deserialize_with = "deserialize_environments")]
    pub environments: NonEmpty<EnvironmentName>,

    pub deploy: DeployConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub healthcheck: Option<HealthcheckConfig>,

    #[serde(default)]
    pub status: Option<StatusConfig>,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub rollback: RollbackConfig,
}

/// The deploy collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Shell command performing the deployment. Its last stdout line that
    /// looks like a URL is taken as the deployment URL.
    pub command: String,

    /// Command run instead of `command` for dry runs. When absent a dry run
    /// does not invoke anything.
    #[serde(default)]
    pub dry_run_command: Option<String>,

    #[serde(default = "default_deploy_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Deploy credential, exported to the command as `SHIPYARD_DEPLOY_TOKEN`.
    #[serde(default)]
    pub token: Option<EnvValue>,
}

/// Build/test tool invocations. Every step is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub install: Option<String>,
    #[serde(default)]
    pub lint: Option<String>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default = "default_toolchain_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            install: None,
            lint: None,
            test: None,
            build: None,
            timeout: default_toolchain_timeout(),
        }
    }
}

/// Inputs to the dependency cache key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Dependency lock files, fingerprinted by content.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Version selectors such as `node-20`.
    #[serde(default)]
    pub selectors: Vec<String>,
}

impl CacheConfig {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.selectors.is_empty()
    }
}

/// External deployment status update, run in post-deploy.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    pub command: String,
    #[serde(default = "default_status_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub api_key: Option<EnvValue>,
    #[serde(default)]
    pub app_key: Option<EnvValue>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Value of the `source:` tag.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_source")]
    pub source_type_name: String,
    /// Extra `key:value` tags appended to every event.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_notify_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            app_key: None,
            endpoint: default_endpoint(),
            source: default_source(),
            source_type_name: default_source(),
            tags: Vec::new(),
            timeout: default_notify_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollbackConfig {
    #[serde(default = "default_rollback_dir")]
    pub dir: PathBuf,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            dir: default_rollback_dir(),
        }
    }
}

fn default_deploy_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_toolchain_timeout() -> Duration {
    Duration::from_secs(900)
}

fn default_status_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_endpoint() -> String {
    DEFAULT_EVENTS_ENDPOINT.to_string()
}

fn default_source() -> String {
    "shipyard".to_string()
}

fn default_rollback_dir() -> PathBuf {
    PathBuf::from(".shipyard/rollback")
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Whether `environment` is a declared deployment target.
    pub fn declares(&self, environment: &EnvironmentName) -> bool {
        self.environments.iter().any(|e| e == environment)
    }

    pub fn template() -> Self {
        Config {
            service: ServiceName::new("my-app").expect("template service name is valid"),
            repo: "my-org/my-app".to_string(),
            environments: NonEmpty {
                head: EnvironmentName::new("staging").expect("template environment is valid"),
                tail: vec![EnvironmentName::new("production").expect("template environment is valid")],
            },
            deploy: DeployConfig {
                command: "./deploy.sh".to_string(),
                dry_run_command: None,
                timeout: default_deploy_timeout(),
                token: Some(EnvValue::FromEnv {
                    var: "DEPLOY_TOKEN".to_string(),
                    default: None,
                }),
            },
            toolchain: ToolchainConfig::default(),
            cache: CacheConfig::default(),
            healthcheck: None,
            status: None,
            notify: NotifyConfig::default(),
            rollback: RollbackConfig::default(),
        }
    }
}

fn deserialize_environments<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<EnvironmentName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<EnvironmentName> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one environment is required"))
}
