//! Feature lifecycle status and the transition table
//!
//! Two historical vocabularies exist in the wild: the original
//! `available`/`in_progress`/`testing`/`implemented` names and the current
//! lifecycle names. `normalize` is the single place both are mapped to the
//! canonical enum; comparisons never touch raw strings anywhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a security feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeatureStatus {
    /// Defined in the catalog, no work started
    #[default]
    Draft,
    /// Implementation in progress
    Develop,
    /// Under verification
    Test,
    /// Implemented and eligible for domain builds
    Release,
}

impl FeatureStatus {
    /// All statuses in lifecycle order
    pub const ALL: [FeatureStatus; 4] = [
        FeatureStatus::Draft,
        FeatureStatus::Develop,
        FeatureStatus::Test,
        FeatureStatus::Release,
    ];

    /// Normalize a raw status string to the canonical enum.
    ///
    /// Accepts any casing of the canonical names and the legacy aliases
    /// (`available`, `in_progress`, `testing`, `implemented`).
    pub fn normalize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "available" => Some(Self::Draft),
            "develop" | "in_progress" => Some(Self::Develop),
            "test" | "testing" => Some(Self::Test),
            "release" | "implemented" => Some(Self::Release),
            _ => None,
        }
    }

    /// Canonical Title-Case spelling used for persistence and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Develop => "Develop",
            Self::Test => "Test",
            Self::Release => "Release",
        }
    }

    /// Statuses reachable from this one (self-loops are always allowed
    /// and are not listed here)
    pub fn allowed_transitions(&self) -> &'static [FeatureStatus] {
        match self {
            Self::Draft => &[Self::Develop],
            Self::Develop => &[Self::Draft, Self::Test],
            Self::Test => &[Self::Develop, Self::Release],
            // Regression path: a released feature can be pulled back
            Self::Release => &[Self::Test, Self::Develop],
        }
    }

    /// Whether a transition from `self` to `to` is legal
    pub fn can_transition_to(&self, to: FeatureStatus) -> bool {
        *self == to || self.allowed_transitions().contains(&to)
    }

    /// Whether this status makes the feature eligible for domain builds
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release)
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical_names() {
        assert_eq!(FeatureStatus::normalize("Draft"), Some(FeatureStatus::Draft));
        assert_eq!(FeatureStatus::normalize("develop"), Some(FeatureStatus::Develop));
        assert_eq!(FeatureStatus::normalize("TEST"), Some(FeatureStatus::Test));
        assert_eq!(FeatureStatus::normalize("ReLeAsE"), Some(FeatureStatus::Release));
        assert_eq!(FeatureStatus::normalize("shipped"), None);
        assert_eq!(FeatureStatus::normalize(""), None);
    }

    #[test]
    fn test_normalize_legacy_aliases() {
        assert_eq!(FeatureStatus::normalize("available"), Some(FeatureStatus::Draft));
        assert_eq!(FeatureStatus::normalize("in_progress"), Some(FeatureStatus::Develop));
        assert_eq!(FeatureStatus::normalize("testing"), Some(FeatureStatus::Test));
        assert_eq!(FeatureStatus::normalize("implemented"), Some(FeatureStatus::Release));
        assert_eq!(FeatureStatus::normalize("Implemented"), Some(FeatureStatus::Release));
    }

    #[test]
    fn test_canonical_spelling_is_title_case() {
        assert_eq!(FeatureStatus::Draft.as_str(), "Draft");
        assert_eq!(FeatureStatus::Develop.as_str(), "Develop");
        assert_eq!(FeatureStatus::Test.as_str(), "Test");
        assert_eq!(FeatureStatus::Release.as_str(), "Release");
    }

    #[test]
    fn test_transition_table() {
        use FeatureStatus::*;

        let allowed = [
            (Draft, Develop),
            (Develop, Draft),
            (Develop, Test),
            (Test, Develop),
            (Test, Release),
            (Release, Test),
            (Release, Develop),
        ];

        for from in FeatureStatus::ALL {
            for to in FeatureStatus::ALL {
                let expected = from == to || allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {} should be {}",
                    from,
                    to,
                    if expected { "allowed" } else { "rejected" }
                );
            }
        }
    }

    #[test]
    fn test_self_loop_always_allowed() {
        for status in FeatureStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_no_draft_to_release_shortcut() {
        assert!(!FeatureStatus::Draft.can_transition_to(FeatureStatus::Release));
        assert!(!FeatureStatus::Draft.can_transition_to(FeatureStatus::Test));
        assert!(!FeatureStatus::Develop.can_transition_to(FeatureStatus::Release));
        assert!(!FeatureStatus::Release.can_transition_to(FeatureStatus::Draft));
    }

    #[test]
    fn test_release_eligibility() {
        assert!(FeatureStatus::Release.is_release());
        assert!(!FeatureStatus::Test.is_release());
    }
}
