// ==========================================
// Correlativities Engine - Enrollment & Prerequisite Entities
// ==========================================

use crate::domain::types::{EnrollmentId, EnrollmentStatus, PrerequisiteId, StudentId, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest relationship between a student and a subject.
///
/// At most one record exists per (student, subject); re-enrollment
/// overwrites status instead of adding history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
}

impl Enrollment {
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }
}

/// Insert payload for an enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub status: EnrollmentStatus,
}

impl NewEnrollment {
    pub fn active(student_id: StudentId, subject_id: SubjectId) -> Self {
        Self {
            student_id,
            subject_id,
            status: EnrollmentStatus::Active,
        }
    }
}

/// Directed correlativity: `subject_id` requires `prerequisite_subject_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub id: PrerequisiteId,
    pub subject_id: SubjectId,
    pub prerequisite_subject_id: SubjectId,
}
