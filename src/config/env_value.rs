// ABOUTME: Environment variable value types with interpolation support.
// ABOUTME: Handles literal values and references to environment variables.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    /// Resolve the value, treating an unset variable without default as absent.
    /// Empty strings count as absent too.
    pub fn resolve_optional(&self) -> Option<String> {
        let value = match self {
            EnvValue::Literal(s) => Some(s.clone()),
            EnvValue::FromEnv { var, default } => std::env::var(var).ok().or_else(|| default.clone()),
        };
        value.filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let value = EnvValue::Literal("secret".to_string());
        assert_eq!(value.resolve_optional().as_deref(), Some("secret"));
    }

    #[test]
    fn env_reference_uses_variable() {
        temp_env::with_var("SHIPYARD_TEST_TOKEN", Some("from-env"), || {
            let value = EnvValue::FromEnv {
                var: "SHIPYARD_TEST_TOKEN".to_string(),
                default: None,
            };
            assert_eq!(value.resolve_optional().as_deref(), Some("from-env"));
        });
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        temp_env::with_var_unset("SHIPYARD_TEST_UNSET", || {
            let value = EnvValue::FromEnv {
                var: "SHIPYARD_TEST_UNSET".to_string(),
                default: Some("fallback".to_string()),
            };
            assert_eq!(value.resolve_optional().as_deref(), Some("fallback"));
        });
    }

    #[test]
    fn unset_variable_without_default_is_absent() {
        temp_env::with_var_unset("SHIPYARD_TEST_UNSET", || {
            let value = EnvValue::FromEnv {
                var: "SHIPYARD_TEST_UNSET".to_string(),
                default: None,
            };
            assert!(value.resolve_optional().is_none());
        });
    }

    #[test]
    fn empty_value_counts_as_absent() {
        temp_env::with_var("SHIPYARD_TEST_EMPTY", Some(""), || {
            let value = EnvValue::FromEnv {
                var: "SHIPYARD_TEST_EMPTY".to_string(),
                default: None,
            };
            assert!(value.resolve_optional().is_none());
        });
    }
}
