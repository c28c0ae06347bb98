// ==========================================
// Correlativities Engine - Eligibility Core
// ==========================================
// Pure decision rules shared by the eligibility engine, the graph
// builder and the enrollment gatekeeper.
// Rule: stateless, no side effects, no I/O
// ==========================================

use crate::domain::{Enrollment, EnrollmentStatus, SubjectEligibilityStatus, SubjectId};
use std::collections::HashMap;

/// Outcome of the per-subject state rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDecision {
    pub status: SubjectEligibilityStatus,
    /// Unmet prerequisite ids; empty unless status is LOCKED
    pub missing: Vec<SubjectId>,
}

// ==========================================
// EligibilityCore
// ==========================================
pub struct EligibilityCore;

impl EligibilityCore {
    /// Index a student's records by subject
    ///
    /// Duplicate records for one subject should not exist; if they do, the
    /// later one wins.
    pub fn index_enrollments(enrollments: Vec<Enrollment>) -> HashMap<SubjectId, Enrollment> {
        enrollments
            .into_iter()
            .map(|e| (e.subject_id.clone(), e))
            .collect()
    }

    /// A prerequisite is met only by a COMPLETED record
    pub fn is_prerequisite_met(
        prerequisite_id: &SubjectId,
        enrollments: &HashMap<SubjectId, Enrollment>,
    ) -> bool {
        enrollments
            .get(prerequisite_id)
            .map(Enrollment::is_completed)
            .unwrap_or(false)
    }

    /// Prerequisites not completed, in the given order
    pub fn missing_prerequisites(
        prerequisite_ids: &[SubjectId],
        enrollments: &HashMap<SubjectId, Enrollment>,
    ) -> Vec<SubjectId> {
        prerequisite_ids
            .iter()
            .filter(|id| !Self::is_prerequisite_met(id, enrollments))
            .cloned()
            .collect()
    }

    /// Decide the state of one subject
    ///
    /// # Rules (first match wins)
    /// 1. record COMPLETED → ALREADY_PASSED
    /// 2. record ACTIVE → CURRENTLY_ENROLLED
    /// 3. any prerequisite not completed → LOCKED
    /// 4. otherwise → AVAILABLE
    ///
    /// A DROPPED record falls through to rules 3/4. Capacity never
    /// affects the state.
    ///
    /// # Arguments
    /// - subject_id: subject being evaluated
    /// - prerequisite_ids: its prerequisites (already scoped by the caller)
    /// - enrollments: the student's records by subject
    pub fn compute_state(
        subject_id: &SubjectId,
        prerequisite_ids: &[SubjectId],
        enrollments: &HashMap<SubjectId, Enrollment>,
    ) -> StateDecision {
        match enrollments.get(subject_id).map(|e| e.status) {
            Some(EnrollmentStatus::Completed) => StateDecision {
                status: SubjectEligibilityStatus::AlreadyPassed,
                missing: Vec::new(),
            },
            Some(EnrollmentStatus::Active) => StateDecision {
                status: SubjectEligibilityStatus::CurrentlyEnrolled,
                missing: Vec::new(),
            },
            Some(EnrollmentStatus::Dropped) | None => {
                let missing = Self::missing_prerequisites(prerequisite_ids, enrollments);
                let status = if missing.is_empty() {
                    SubjectEligibilityStatus::Available
                } else {
                    SubjectEligibilityStatus::Locked
                };
                StateDecision { status, missing }
            }
        }
    }
}
