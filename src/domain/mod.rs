// ==========================================
// Correlativities Engine - Domain Layer
// ==========================================
// Entities, identifiers and derived result types.
// No data access, no engine logic.
// ==========================================

pub mod eligibility;
pub mod enrollment;
pub mod subject;
pub mod types;

pub use eligibility::{
    BulkEnrollmentResult, BulkItemOutcome, BulkItemResult, BulkPhase, CorrelativitiesGraph,
    EnrollmentDecision, EnrollmentRejection, SubjectEdge, SubjectEligibility, SubjectNode,
};
pub use enrollment::{Enrollment, NewEnrollment, PrerequisiteEdge};
pub use subject::{CapacityInfo, Career, CareerSubject, Subject};
pub use types::{
    CareerId, EnrollmentId, EnrollmentStatus, ParseStatusError, PrerequisiteId, StudentId,
    SubjectEligibilityStatus, SubjectId,
};
