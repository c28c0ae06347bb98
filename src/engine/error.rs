// ==========================================
// Correlativities Engine - Engine Errors
// ==========================================
// Store failures bubble up unmodified (no retries, no backoff).
// ==========================================

use crate::domain::{CareerId, StudentId};
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A store read or write failed
    #[error("store failure: {0}")]
    Store(#[source] RepositoryError),

    /// Graph assembly failed; no partial graph is returned
    #[error("failed to load correlativities graph (student={student_id}, career={career_id}): {source}")]
    GraphLoad {
        student_id: StudentId,
        career_id: CareerId,
        #[source]
        source: RepositoryError,
    },

    /// Subject full at creation time
    #[error("subject {subject_id} has reached its capacity ({current_enrollment}/{capacity})")]
    CapacityExceeded {
        subject_id: String,
        capacity: i32,
        current_enrollment: i32,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            } => EngineError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            },
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Store(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
