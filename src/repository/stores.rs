// ==========================================
// Correlativities Engine - Store Ports
// ==========================================
// Read/write interfaces of the three external collaborators the engine
// consumes. No business rules here: stores only move data.
// Implementors: SubjectRepository / PrerequisiteRepository /
// EnrollmentRepository (rusqlite), test mocks.
// ==========================================

use crate::domain::{
    CapacityInfo, CareerId, Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment,
    PrerequisiteEdge, PrerequisiteId, StudentId, Subject, SubjectId,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// CatalogStore
// ==========================================
/// Subject metadata and career plan lookups
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Subjects assigned to a career
    ///
    /// `year`/`semester` of each returned subject are the career-specific
    /// placement, not the subject's catalog default.
    ///
    /// # Returns
    /// - Ok(Vec<Subject>): ordered by (year, semester, name); empty for an unknown career
    async fn subjects_by_career(&self, career_id: &CareerId) -> RepositoryResult<Vec<Subject>>;

    /// Subjects by ids; unknown ids are skipped
    async fn find_subjects(&self, subject_ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>>;

    /// Capacity read used right before enrolling
    ///
    /// # Returns
    /// - Ok(None): subject does not exist
    async fn subject_capacity(&self, subject_id: &SubjectId)
        -> RepositoryResult<Option<CapacityInfo>>;
}

// ==========================================
// PrerequisiteStore
// ==========================================
/// Directed edges `(subject_id, prerequisite_subject_id)`
#[async_trait]
pub trait PrerequisiteStore: Send + Sync {
    /// Every edge, in creation order
    async fn get_all(&self) -> RepositoryResult<Vec<PrerequisiteEdge>>;

    /// Edges whose `subject_id` is the given subject
    async fn get_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<Vec<PrerequisiteEdge>>;

    /// Edges whose `prerequisite_subject_id` is the given subject
    async fn get_subjects_that_require(
        &self,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<Vec<PrerequisiteEdge>>;

    /// Add an edge
    ///
    /// # Errors
    /// - ValidationError: self-edge
    /// - UniqueConstraintViolation: edge already present
    async fn create(
        &self,
        subject_id: &SubjectId,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<PrerequisiteEdge>;

    async fn delete(&self, id: &PrerequisiteId) -> RepositoryResult<()>;

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<()>;
}

// ==========================================
// EnrollmentStore
// ==========================================
/// Enrollment records, one per (student, subject)
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Every record of a student
    async fn list_by_student(&self, student_id: &StudentId) -> RepositoryResult<Vec<Enrollment>>;

    /// Record for (student, subject), if any
    async fn find_by_student_and_subject(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> RepositoryResult<Option<Enrollment>>;

    async fn find_by_id(&self, id: &EnrollmentId) -> RepositoryResult<Option<Enrollment>>;

    /// Capacity check and insert as one atomic operation
    ///
    /// Reads `capacity`/`current_enrollment`, refuses when full, inserts the
    /// record and, when the new status occupies a seat, increments
    /// `current_enrollment`. No other writer can interleave between the
    /// check and the insert.
    ///
    /// # Errors
    /// - NotFound: subject does not exist
    /// - CapacityExceeded: subject full at check time
    /// - UniqueConstraintViolation: (student, subject) already recorded
    async fn create_within_capacity(&self, enrollment: NewEnrollment)
        -> RepositoryResult<Enrollment>;

    /// Status overwrite without a lifecycle guard
    ///
    /// Keeps `current_enrollment` equal to the number of seat-occupying
    /// records of the subject. A change that would take a seat is refused
    /// when the subject is full, and the record keeps its status.
    ///
    /// # Errors
    /// - NotFound: unknown enrollment id
    /// - CapacityExceeded: re-activation while the subject is full
    async fn change_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment>;
}
