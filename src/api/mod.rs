// ==========================================
// Correlativities Engine - API Layer
// ==========================================
// Business entry points for the CLI and embedding applications
// ==========================================

pub mod enrollment_api;
pub mod error;

pub use enrollment_api::EnrollmentApi;
pub use error::{ApiError, ApiResult};
