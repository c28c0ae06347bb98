// ==========================================
// Correlativities Engine - Repository Layer
// ==========================================
// Rule: repositories hold no business logic
// ==========================================
// Store ports consumed by the engine plus the SQLite adapters.
// All queries are parameterized.
// ==========================================

pub mod enrollment_repo;
pub mod error;
pub mod prerequisite_repo;
pub mod stores;
pub mod subject_repo;

pub use enrollment_repo::EnrollmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use prerequisite_repo::PrerequisiteRepository;
pub use stores::{CatalogStore, EnrollmentStore, PrerequisiteStore};
pub use subject_repo::SubjectRepository;
