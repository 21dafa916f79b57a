// ABOUTME: Notification event model with key:value tags and severity.
// ABOUTME: Events are ephemeral and never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Event severity, mapped to the sink's alert type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

/// A single `key:value` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Tags attached to an event.
///
/// Construction always starts with the identity tags `source`, `env`,
/// `repo` and `status`. Further tags are appended as given; duplicate keys
/// are not detected.
#[derive(Debug, Clone, Default)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new(source: &str, env: &str, repo: &str, status: &str) -> Self {
        Tags(Vec::new())
            .with("source", source)
            .with("env", env)
            .with("repo", repo)
            .with("status", status)
    }

    /// Append a tag.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Tag {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Append a pre-formatted `key:value` tag. A tag with no `:` gets an empty value.
    #[must_use]
    pub fn with_raw(self, raw: &str) -> Self {
        match raw.split_once(':') {
            Some((key, value)) => self.with(key, value),
            None => self.with(raw, ""),
        }
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags rendered as `key:value` strings, in insertion order.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(Tag::to_string).collect()
    }
}

impl PartialEq for Tags {
    // Order-insensitive multiset comparison.
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.to_strings();
        let mut b = other.to_strings();
        a.sort();
        b.sort();
        a == b
    }
}

impl Eq for Tags {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: String,
    pub text: String,
    pub tags: Tags,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        tags: Tags,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            tags,
            severity,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tags_come_first() {
        let tags = Tags::new("ci", "production", "org/web", "success");
        assert_eq!(
            tags.to_strings(),
            ["source:ci", "env:production", "repo:org/web", "status:success"]
        );
    }

    #[test]
    fn extra_tags_are_appended_without_dedup() {
        let tags = Tags::new("ci", "staging", "org/web", "failure")
            .with("team", "web")
            .with_raw("env:other");
        assert_eq!(tags.len(), 6);
        assert_eq!(tags.get("env"), Some("staging"));
        assert_eq!(tags.get("team"), Some("web"));
    }

    #[test]
    fn tag_equality_ignores_order() {
        let a = Tags::default().with("a", "1").with("b", "2");
        let b = Tags::default().with("b", "2").with("a", "1");
        assert_eq!(a, b);
    }

    #[test]
    fn raw_tag_without_separator() {
        let tags = Tags::default().with_raw("canary");
        assert_eq!(tags.to_strings(), ["canary:"]);
    }
}
