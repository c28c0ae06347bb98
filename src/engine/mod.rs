// ==========================================
// Correlativities Engine - Engine Layer
// ==========================================
// Business rules only; engines never build SQL.
// Every refusal carries a typed reason.
// ==========================================

pub mod correlativities;
pub mod eligibility;
pub mod eligibility_core;
pub mod error;
pub mod gatekeeper;
pub mod prerequisite_index;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use correlativities::CorrelativitiesGraphBuilder;
pub use eligibility::{CareerSnapshot, EligibilityEngine};
pub use eligibility_core::{EligibilityCore, StateDecision};
pub use error::{EngineError, EngineResult};
pub use gatekeeper::{EnrollmentGatekeeper, DEFAULT_BULK_MAX_CONCURRENT};
pub use prerequisite_index::PrerequisiteIndex;
pub use repositories::EnrollmentRepositories;
