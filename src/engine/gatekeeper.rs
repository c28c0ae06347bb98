// ==========================================
// Correlativities Engine - Enrollment Gatekeeper
// ==========================================
// Check order: existing record → prerequisites → capacity
// Creation: atomic capacity check + insert in the enrollment store
// Bulk: validate every subject concurrently, then create the valid ones
// with bounded concurrency (tokio Semaphore)
// ==========================================

use crate::domain::{
    BulkEnrollmentResult, BulkItemOutcome, BulkItemResult, BulkPhase, Enrollment,
    EnrollmentDecision, EnrollmentId, EnrollmentRejection, EnrollmentStatus, NewEnrollment,
    StudentId, SubjectId,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::{EligibilityCore, EnrollmentRepositories};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// Default bound on concurrent creations in one bulk request
pub const DEFAULT_BULK_MAX_CONCURRENT: usize = 4;

pub struct EnrollmentGatekeeper {
    repos: EnrollmentRepositories,
    bulk_max_concurrent: usize,
}

impl EnrollmentGatekeeper {
    pub fn new(repos: EnrollmentRepositories) -> Self {
        Self {
            repos,
            bulk_max_concurrent: DEFAULT_BULK_MAX_CONCURRENT,
        }
    }

    /// Bound on concurrent creations; values below 1 are raised to 1
    pub fn with_bulk_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.bulk_max_concurrent = max_concurrent.max(1);
        self
    }

    /// Decide whether a student may enroll in a subject
    ///
    /// # Rules (first failing check wins)
    /// 1. any record exists for (student, subject), whatever its status
    /// 2. a prerequisite of the subject is not completed (all stored
    ///    prerequisites, no career scope)
    /// 3. the subject does not exist or is full
    ///
    /// # Returns
    /// - Ok(EnrollmentDecision): allowed or the first rejection reason
    /// - Err(EngineError::Store): a store read failed
    #[instrument(skip(self), fields(student_id = %student_id, subject_id = %subject_id))]
    pub async fn check_enrollment(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> EngineResult<EnrollmentDecision> {
        // === 1. existing record ===
        if let Some(existing) = self
            .repos
            .enrollments
            .find_by_student_and_subject(student_id, subject_id)
            .await?
        {
            return Ok(EnrollmentDecision::Rejected(
                EnrollmentRejection::AlreadyRecorded {
                    status: existing.status,
                },
            ));
        }

        // === 2. prerequisites ===
        let edges = self.repos.prerequisites.get_by_subject(subject_id).await?;
        if !edges.is_empty() {
            let enrollments = EligibilityCore::index_enrollments(
                self.repos.enrollments.list_by_student(student_id).await?,
            );
            let prerequisite_ids: Vec<SubjectId> = edges
                .into_iter()
                .map(|e| e.prerequisite_subject_id)
                .collect();
            let missing = EligibilityCore::missing_prerequisites(&prerequisite_ids, &enrollments);
            if !missing.is_empty() {
                return Ok(EnrollmentDecision::Rejected(
                    EnrollmentRejection::MissingPrerequisites { missing },
                ));
            }
        }

        // === 3. capacity ===
        match self.repos.catalog.subject_capacity(subject_id).await? {
            None => Ok(EnrollmentDecision::Rejected(
                EnrollmentRejection::SubjectNotFound,
            )),
            Some(capacity) if !capacity.has_capacity => Ok(EnrollmentDecision::Rejected(
                EnrollmentRejection::NoCapacity {
                    capacity: capacity.capacity,
                    current_enrollment: capacity.current_enrollment,
                },
            )),
            Some(_) => Ok(EnrollmentDecision::Allowed),
        }
    }

    /// Boolean view of `check_enrollment`
    pub async fn can_enroll(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> EngineResult<bool> {
        Ok(self
            .check_enrollment(student_id, subject_id)
            .await?
            .is_allowed())
    }

    /// Create an enrollment record
    ///
    /// Prerequisites are not re-checked; the capacity check and the insert
    /// are one atomic store operation.
    ///
    /// # Errors
    /// - EngineError::CapacityExceeded: subject full at creation time
    /// - EngineError::NotFound: unknown subject
    /// - EngineError::Store: duplicate record or other store failure
    #[instrument(skip(self), fields(student_id = %student_id, subject_id = %subject_id, status = %status))]
    pub async fn enroll(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        status: EnrollmentStatus,
    ) -> EngineResult<Enrollment> {
        let enrollment = self
            .repos
            .enrollments
            .create_within_capacity(NewEnrollment {
                student_id: student_id.clone(),
                subject_id: subject_id.clone(),
                status,
            })
            .await?;
        info!(enrollment_id = %enrollment.id, "enrollment created");
        Ok(enrollment)
    }

    /// Enroll a student in several subjects
    ///
    /// # Flow
    /// 1. Deduplicate ids, keeping first occurrence order
    /// 2. Validate every subject concurrently; a store error invalidates
    ///    only that subject
    /// 3. Create ACTIVE records for the valid subjects, at most
    ///    `bulk_max_concurrent` at a time; failures are isolated per subject
    ///
    /// Counts in the result cover phase 3 only.
    #[instrument(skip(self, subject_ids), fields(student_id = %student_id, requested = subject_ids.len()))]
    pub async fn bulk_enroll(
        &self,
        student_id: &StudentId,
        subject_ids: &[SubjectId],
    ) -> BulkEnrollmentResult {
        let mut seen = HashSet::new();
        let unique: Vec<&SubjectId> = subject_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let names = self.subject_names(&unique).await;

        // === Phase 1: validation ===
        let checks = join_all(unique.iter().map(|subject_id| async move {
            let decision = self.check_enrollment(student_id, subject_id).await;
            (*subject_id, decision)
        }))
        .await;

        let mut items = Vec::with_capacity(unique.len());
        let mut valid = Vec::new();
        for (subject_id, decision) in checks {
            let outcome = match decision {
                Ok(EnrollmentDecision::Allowed) => {
                    valid.push(subject_id);
                    continue;
                }
                Ok(EnrollmentDecision::Rejected(reason)) => BulkItemOutcome::Rejected(reason),
                Err(e) => {
                    warn!(subject_id = %subject_id, error = %e, "validation failed");
                    BulkItemOutcome::Failed(e.to_string())
                }
            };
            items.push(BulkItemResult {
                subject_id: subject_id.clone(),
                subject_name: names.get(subject_id).cloned(),
                phase: BulkPhase::Validation,
                outcome,
            });
        }

        // === Phase 2: creation ===
        let semaphore = Semaphore::new(self.bulk_max_concurrent);
        let created = join_all(valid.iter().map(|subject_id| {
            let semaphore = &semaphore;
            async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => {
                        match self
                            .enroll(student_id, subject_id, EnrollmentStatus::Active)
                            .await
                        {
                            Ok(enrollment) => BulkItemOutcome::Enrolled(enrollment),
                            Err(EngineError::CapacityExceeded {
                                capacity,
                                current_enrollment,
                                ..
                            }) => BulkItemOutcome::Rejected(EnrollmentRejection::NoCapacity {
                                capacity,
                                current_enrollment,
                            }),
                            Err(e) => BulkItemOutcome::Failed(e.to_string()),
                        }
                    }
                    Err(e) => BulkItemOutcome::Failed(e.to_string()),
                };
                (*subject_id, outcome)
            }
        }))
        .await;

        for (subject_id, outcome) in created {
            items.push(BulkItemResult {
                subject_id: subject_id.clone(),
                subject_name: names.get(subject_id).cloned(),
                phase: BulkPhase::Creation,
                outcome,
            });
        }

        let result = BulkEnrollmentResult::from_items(items);
        info!(
            success = result.success_count,
            failed = result.failure_count,
            rejected = result.rejected().count(),
            "bulk enrollment finished"
        );
        result
    }

    /// Overwrite the status of an existing record
    ///
    /// No transition rules; the seat counter follows the new status.
    /// Re-activating a record fails with CapacityExceeded when the subject
    /// is full.
    #[instrument(skip(self), fields(enrollment_id = %enrollment_id, status = %status))]
    pub async fn change_status(
        &self,
        enrollment_id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> EngineResult<Enrollment> {
        Ok(self
            .repos
            .enrollments
            .change_status(enrollment_id, status)
            .await?)
    }

    /// Subject names for reporting; a lookup failure only loses the names
    async fn subject_names(&self, subject_ids: &[&SubjectId]) -> HashMap<SubjectId, String> {
        let ids: Vec<SubjectId> = subject_ids.iter().map(|id| (*id).clone()).collect();
        match self.repos.catalog.find_subjects(&ids).await {
            Ok(subjects) => subjects.into_iter().map(|s| (s.id, s.name)).collect(),
            Err(e) => {
                warn!(error = %e, "subject names unavailable");
                HashMap::new()
            }
        }
    }
}
