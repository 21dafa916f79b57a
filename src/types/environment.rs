// ABOUTME: Target environment name validation.
// ABOUTME: Environment names key deployments and rollback snapshots, so they must be path and tag safe.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvironmentNameError {
    #[error("environment name cannot be empty")]
    Empty,

    #[error("environment name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("environment name must start with a lowercase letter")]
    InvalidStart,

    #[error("invalid character in environment name: '{0}'")]
    InvalidChar(char),
}

/// Name of a deployment target such as `staging` or `production`.
///
/// Lowercase ASCII letters, digits, `-` and `_` only. The name is used
/// verbatim as a directory name by the rollback store and as the value of
/// the `env:` notification tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    pub fn new(value: &str) -> Result<Self, EnvironmentNameError> {
        let first = value.chars().next().ok_or(EnvironmentNameError::Empty)?;

        if value.len() > 63 {
            return Err(EnvironmentNameError::TooLong);
        }

        if !first.is_ascii_lowercase() {
            return Err(EnvironmentNameError::InvalidStart);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(EnvironmentNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EnvironmentName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnvironmentName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EnvironmentName::new(&s).map_err(serde::de::Error::custom)
    }
}
