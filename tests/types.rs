// ABOUTME: Integration tests for type-safe identifiers and validated types.
// ABOUTME: Tests parsing, validation, and type safety properties.

use shipyard::types::*;

mod service_name_tests {
    use super::*;

    #[test]
    fn valid_dns_name() {
        let name = ServiceName::new("web-api").unwrap();
        assert_eq!(name.as_str(), "web-api");
    }

    #[test]
    fn empty_returns_error() {
        assert!(matches!(ServiceName::new(""), Err(ServiceNameError::Empty)));
    }

    #[test]
    fn too_long_returns_error() {
        let long = "a".repeat(64);
        assert!(matches!(
            ServiceName::new(&long),
            Err(ServiceNameError::TooLong)
        ));
    }

    #[test]
    fn hyphen_edges_return_error() {
        assert!(matches!(
            ServiceName::new("-web"),
            Err(ServiceNameError::StartsWithHyphen)
        ));
        assert!(matches!(
            ServiceName::new("web-"),
            Err(ServiceNameError::EndsWithHyphen)
        ));
    }

    #[test]
    fn uppercase_returns_error() {
        assert!(matches!(
            ServiceName::new("Web"),
            Err(ServiceNameError::NotLowercase)
        ));
    }
}

mod environment_name_tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        for name in ["staging", "production", "pr-42", "eu_west"] {
            assert_eq!(EnvironmentName::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn rejects_path_separators() {
        assert!(matches!(
            EnvironmentName::new("prod/../etc"),
            Err(EnvironmentNameError::InvalidChar('/'))
        ));
    }

    #[test]
    fn must_start_with_letter() {
        assert!(matches!(
            EnvironmentName::new("1prod"),
            Err(EnvironmentNameError::InvalidStart)
        ));
        assert!(matches!(
            EnvironmentName::new(".hidden"),
            Err(EnvironmentNameError::InvalidStart)
        ));
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: EnvironmentName = serde_yaml::from_str("staging").unwrap();
        assert_eq!(ok.as_str(), "staging");
        assert!(serde_yaml::from_str::<EnvironmentName>("Staging").is_err());
    }
}

mod revision_tests {
    use super::*;

    #[test]
    fn short_form_is_seven_chars() {
        let rev = Revision::new("0123456789abcdef").unwrap();
        assert_eq!(rev.short(), "0123456");
    }

    #[test]
    fn short_form_of_short_revision_is_whole() {
        let rev = Revision::new("v1.2").unwrap();
        assert_eq!(rev.short(), "v1.2");
    }

    #[test]
    fn rejects_whitespace_and_empty() {
        assert!(matches!(Revision::new(""), Err(RevisionError::Empty)));
        assert!(matches!(
            Revision::new("abc def"),
            Err(RevisionError::Whitespace)
        ));
    }
}

mod id_tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = DeploymentId::generate();
        let b = DeploymentId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = RunId::new("run-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"run-7\"");
        let back: RunId = serde_json::from_str("\"run-7\"").unwrap();
        assert_eq!(back, id);
    }
}
