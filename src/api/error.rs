// ==========================================
// Correlativities Engine - API Errors
// ==========================================
// Translates repository and engine errors into caller-facing messages.
// Every error carries an explicit reason.
// ==========================================

use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Input / business rule errors
    // ==========================================
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("subject {subject_id} is full ({current_enrollment}/{capacity})")]
    CapacityExceeded {
        subject_id: String,
        capacity: i32,
        current_enrollment: i32,
    },

    #[error("business rule violated: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // Data access errors
    // ==========================================
    #[error("store failure: {0}")]
    StoreFailure(String),

    #[error("graph load failed: {0}")]
    GraphLoadFailure(String),

    // ==========================================
    // Generic
    // ==========================================
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// From RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            } => ApiError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            },
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("unique constraint violated: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("foreign key violated: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationFailure(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationFailure(format!("field {}: {}", field, message))
            }
            RepositoryError::LockError(msg) => {
                ApiError::StoreFailure(format!("database lock failed: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::StoreFailure(msg),
            RepositoryError::InternalError(msg) => ApiError::Internal(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// From EngineError
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Store(source) => ApiError::from(source),
            err @ EngineError::GraphLoad { .. } => ApiError::GraphLoadFailure(err.to_string()),
            EngineError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            } => ApiError::CapacityExceeded {
                subject_id,
                capacity,
                current_enrollment,
            },
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
