// ==========================================
// Correlativities Engine - Domain Types
// ==========================================
// Strongly-typed identifiers and closed enums shared by every layer.
// Serialized forms match the stored strings.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Identifiers
// ==========================================
// String-backed newtypes so a subject id can never be passed where a
// student id is expected.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the id is empty or whitespace only
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Student identifier
    StudentId
);
string_id!(
    /// Subject identifier
    SubjectId
);
string_id!(
    /// Career (degree program) identifier
    CareerId
);
string_id!(
    /// Enrollment record identifier
    EnrollmentId
);
string_id!(
    /// Prerequisite edge identifier
    PrerequisiteId
);

// ==========================================
// Enrollment Status
// ==========================================
// Stored as `active` / `completed` / `dropped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,    // currently taking the subject
    Completed, // passed
    Dropped,   // abandoned
}

impl EnrollmentStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
        }
    }

    /// Whether a record with this status occupies a seat
    pub fn occupies_seat(&self) -> bool {
        matches!(self, EnrollmentStatus::Active)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown enrollment status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for EnrollmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "dropped" => Ok(EnrollmentStatus::Dropped),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ==========================================
// Subject Eligibility Status
// ==========================================
// Derived per (student, subject); never persisted.
// Also used as the correlativities graph node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectEligibilityStatus {
    AlreadyPassed,     // completed
    CurrentlyEnrolled, // active
    Locked,            // at least one prerequisite not completed
    Available,         // all prerequisites completed
}

impl SubjectEligibilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectEligibilityStatus::AlreadyPassed => "ALREADY_PASSED",
            SubjectEligibilityStatus::CurrentlyEnrolled => "CURRENTLY_ENROLLED",
            SubjectEligibilityStatus::Locked => "LOCKED",
            SubjectEligibilityStatus::Available => "AVAILABLE",
        }
    }

    /// i18n key of the user-facing label
    pub fn label_key(&self) -> &'static str {
        match self {
            SubjectEligibilityStatus::AlreadyPassed => "status.already_passed",
            SubjectEligibilityStatus::CurrentlyEnrolled => "status.currently_enrolled",
            SubjectEligibilityStatus::Locked => "status.locked",
            SubjectEligibilityStatus::Available => "status.available",
        }
    }
}

impl fmt::Display for SubjectEligibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_db_str() {
        for status in [
            EnrollmentStatus::Active,
            EnrollmentStatus::Completed,
            EnrollmentStatus::Dropped,
        ] {
            assert_eq!(status.to_db_str().parse::<EnrollmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_parse_is_lenient_on_case_and_spaces() {
        assert_eq!(" Completed ".parse(), Ok(EnrollmentStatus::Completed));
        assert!("approved".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn test_only_active_occupies_seat() {
        assert!(EnrollmentStatus::Active.occupies_seat());
        assert!(!EnrollmentStatus::Completed.occupies_seat());
        assert!(!EnrollmentStatus::Dropped.occupies_seat());
    }

    #[test]
    fn test_eligibility_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&SubjectEligibilityStatus::AlreadyPassed).unwrap();
        assert_eq!(json, "\"ALREADY_PASSED\"");
        assert_eq!(
            SubjectEligibilityStatus::CurrentlyEnrolled.to_string(),
            "CURRENTLY_ENROLLED"
        );
    }

    #[test]
    fn test_blank_ids() {
        assert!(SubjectId::new("  ").is_blank());
        assert!(!StudentId::from("S-1").is_blank());
        let json = serde_json::to_string(&CareerId::new("C1")).unwrap();
        assert_eq!(json, "\"C1\"");
    }
}
