// ABOUTME: Source revision (commit SHA or tag) being deployed.
// ABOUTME: Validates shape and provides the short form used in version names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const SHORT_LEN: usize = 7;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("revision cannot be empty")]
    Empty,

    #[error("revision exceeds maximum length of 128 characters")]
    TooLong,

    #[error("revision cannot contain whitespace")]
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: &str) -> Result<Self, RevisionError> {
        if value.is_empty() {
            return Err(RevisionError::Empty);
        }
        if value.len() > 128 {
            return Err(RevisionError::TooLong);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(RevisionError::Whitespace);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, or the whole revision if shorter.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Revision::new(&s).map_err(serde::de::Error::custom)
    }
}
