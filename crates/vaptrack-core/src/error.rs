//! Error types for vaptrack

use thiserror::Error;

/// Result type alias using vaptrack's Error
pub type Result<T> = std::result::Result<T, Error>;

/// vaptrack error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Workflow errors (E001-E099)
    #[error("Transition from '{from}' to '{to}' is not allowed.")]
    InvalidTransition { from: String, to: String },

    #[error("Unknown lifecycle status '{0}'. Valid statuses: Draft, Develop, Test, Release.")]
    UnknownStatus(String),

    // Entity errors (E100-E199)
    #[error("Feature '{0}' not found in the catalog. Run `vaptrack features list` to see all features.")]
    FeatureNotFound(String),

    #[error("Domain '{0}' not found. Run `vaptrack domains list` to see all domains.")]
    DomainNotFound(String),

    #[error("Feature '{0}' is not in Release status and cannot be enabled for a domain.")]
    FeatureNotReleased(String),

    // Catalog errors (E200-E299)
    #[error("Catalog file '{0}' not found in the data directory.")]
    CatalogNotFound(String),

    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored value could not be parsed: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "E001",
            Self::UnknownStatus(_) => "E002",
            Self::FeatureNotFound(_) => "E100",
            Self::DomainNotFound(_) => "E101",
            Self::FeatureNotReleased(_) => "E102",
            Self::CatalogNotFound(_) => "E200",
            Self::CatalogParse(_) => "E201",
            Self::DatabaseError(_) => "E400",
            Self::Parse(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidTransition { from, .. } => Some(format!(
                "Check the allowed transitions for '{}' with `vaptrack features history`",
                from
            )),
            Self::FeatureNotFound(_) => Some("vaptrack features list".to_string()),
            Self::DomainNotFound(_) => Some("vaptrack domains list".to_string()),
            Self::FeatureNotReleased(key) => Some(format!(
                "vaptrack features transition {} Release",
                key
            )),
            Self::CatalogNotFound(_) => Some("vaptrack catalog files".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let errors = [
            (
                Error::InvalidTransition {
                    from: "Draft".to_string(),
                    to: "Release".to_string(),
                },
                "E001",
            ),
            (Error::UnknownStatus("bogus".to_string()), "E002"),
            (Error::FeatureNotFound("xss".to_string()), "E100"),
            (Error::DomainNotFound("example.com".to_string()), "E101"),
            (Error::FeatureNotReleased("xss".to_string()), "E102"),
            (Error::CatalogNotFound("features.json".to_string()), "E200"),
            (Error::CatalogParse("bad json".to_string()), "E201"),
            (Error::Parse("bad row".to_string()), "E401"),
            (Error::ConfigError("bad key".to_string()), "E600"),
            (Error::InvalidInput("not a list".to_string()), "E800"),
        ];

        for (error, code) in errors {
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn test_invalid_transition_message_names_both_states() {
        let err = Error::InvalidTransition {
            from: "Develop".to_string(),
            to: "Release".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Develop"));
        assert!(msg.contains("Release"));
    }

    #[test]
    fn test_suggestions() {
        assert!(
            Error::FeatureNotReleased("csrf-guard".to_string())
                .suggestion()
                .unwrap()
                .contains("csrf-guard")
        );
        assert!(Error::Parse("x".to_string()).suggestion().is_none());
    }
}
