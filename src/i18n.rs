// ==========================================
// Internationalization (i18n)
// ==========================================
// rust-i18n; Spanish (default) and English
// The rust_i18n::i18n! macro is initialized in lib.rs
// ==========================================

use crate::domain::{EnrollmentRejection, SubjectEligibilityStatus};

pub const SUPPORTED_LOCALES: [&str; 2] = ["es", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Switch the message language
///
/// # Arguments
/// - locale: "es" or "en"; anything else falls back to "es" lookups
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// Translate a key (no arguments)
///
/// # Example
/// ```no_run
/// use correlativities_engine::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Translate a key, substituting `%{name}` placeholders
///
/// # Example
/// ```no_run
/// use correlativities_engine::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/subjects.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// Display label of an eligibility status
pub fn status_label(status: SubjectEligibilityStatus) -> String {
    t(status.label_key())
}

/// Human-readable rejection reason
pub fn rejection_message(rejection: &EnrollmentRejection) -> String {
    match rejection {
        EnrollmentRejection::AlreadyRecorded { status } => t_with_args(
            rejection.reason_key(),
            &[("status", status.to_db_str())],
        ),
        EnrollmentRejection::MissingPrerequisites { missing } => {
            let subjects = missing
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            t_with_args(rejection.reason_key(), &[("subjects", &subjects)])
        }
        EnrollmentRejection::NoCapacity {
            capacity,
            current_enrollment,
        } => t_with_args(
            rejection.reason_key(),
            &[
                ("current", &current_enrollment.to_string()),
                ("capacity", &capacity.to_string()),
            ],
        ),
        EnrollmentRejection::SubjectNotFound => t(rejection.reason_key()),
    }
}
