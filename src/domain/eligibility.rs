// ==========================================
// Correlativities Engine - Derived Results
// ==========================================
// Computed per request from current store state; never persisted,
// never cached across requests.
// ==========================================

use crate::domain::enrollment::Enrollment;
use crate::domain::subject::{CapacityInfo, Subject};
use crate::domain::types::{
    EnrollmentStatus, PrerequisiteId, SubjectEligibilityStatus, SubjectId,
};
use serde::{Deserialize, Serialize};

// ==========================================
// SubjectEligibility
// ==========================================
/// Eligibility of one subject for one student within a career.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEligibility {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub year: i32,
    pub semester: i32,
    pub status: SubjectEligibilityStatus,
    /// Unmet prerequisites; empty unless status is LOCKED
    pub missing_prerequisites: Vec<Subject>,
    pub capacity: CapacityInfo,
}

impl SubjectEligibility {
    /// Selectable in the academic offer: AVAILABLE and not full
    pub fn is_selectable(&self) -> bool {
        self.status == SubjectEligibilityStatus::Available && self.capacity.has_capacity
    }
}

// ==========================================
// Correlativities Graph
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectNode {
    pub id: SubjectId,
    pub name: String,
    pub year: i32,
    pub semester: i32,
    pub state: SubjectEligibilityStatus,
    pub capacity: i32,
    pub current_enrollment: i32,
    /// Prerequisite ids of this subject, for tooltips
    pub prerequisites: Vec<SubjectId>,
}

/// Arrow from the requirement (`source`) to the subject it unlocks (`target`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEdge {
    pub id: PrerequisiteId,
    pub source: SubjectId,
    pub target: SubjectId,
    /// Source subject completed by the student
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelativitiesGraph {
    pub nodes: Vec<SubjectNode>,
    pub edges: Vec<SubjectEdge>,
    /// Prerequisite cycles found among the nodes (diagnostic only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<Vec<SubjectId>>,
}

impl CorrelativitiesGraph {
    pub fn node(&self, id: &SubjectId) -> Option<&SubjectNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, source: &SubjectId, target: &SubjectId) -> Option<&SubjectEdge> {
        self.edges
            .iter()
            .find(|e| &e.source == source && &e.target == target)
    }
}

// ==========================================
// Enrollment checks
// ==========================================
/// Why an enrollment request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrollmentRejection {
    /// A record already exists for (student, subject), whatever its status
    AlreadyRecorded { status: EnrollmentStatus },
    MissingPrerequisites { missing: Vec<SubjectId> },
    NoCapacity { capacity: i32, current_enrollment: i32 },
    SubjectNotFound,
}

impl EnrollmentRejection {
    /// i18n key describing the reason
    pub fn reason_key(&self) -> &'static str {
        match self {
            EnrollmentRejection::AlreadyRecorded { .. } => "rejection.already_recorded",
            EnrollmentRejection::MissingPrerequisites { .. } => "rejection.missing_prerequisites",
            EnrollmentRejection::NoCapacity { .. } => "rejection.no_capacity",
            EnrollmentRejection::SubjectNotFound => "rejection.subject_not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum EnrollmentDecision {
    Allowed,
    Rejected(EnrollmentRejection),
}

impl EnrollmentDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EnrollmentDecision::Allowed)
    }

    pub fn rejection(&self) -> Option<&EnrollmentRejection> {
        match self {
            EnrollmentDecision::Allowed => None,
            EnrollmentDecision::Rejected(reason) => Some(reason),
        }
    }
}

// ==========================================
// Bulk enrollment
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkPhase {
    /// Eligibility check of every selected subject
    Validation,
    /// Record creation for the subjects that passed validation
    Creation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum BulkItemOutcome {
    Enrolled(Enrollment),
    Rejected(EnrollmentRejection),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub subject_id: SubjectId,
    pub subject_name: Option<String>,
    pub phase: BulkPhase,
    pub outcome: BulkItemOutcome,
}

impl BulkItemResult {
    pub fn is_enrolled(&self) -> bool {
        matches!(self.outcome, BulkItemOutcome::Enrolled(_))
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.subject_name
            .as_deref()
            .unwrap_or_else(|| self.subject_id.as_str())
    }
}

/// Aggregate of one bulk enrollment.
///
/// `success_count` and `failure_count` cover the creation phase only;
/// subjects refused during validation are reported by `rejected()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEnrollmentResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub items: Vec<BulkItemResult>,
}

impl BulkEnrollmentResult {
    pub fn from_items(items: Vec<BulkItemResult>) -> Self {
        let created: Vec<&BulkItemResult> = items
            .iter()
            .filter(|item| item.phase == BulkPhase::Creation)
            .collect();
        let success_count = created.iter().filter(|item| item.is_enrolled()).count();
        let failure_count = created.len() - success_count;
        Self {
            success_count,
            failure_count,
            items,
        }
    }

    /// Subjects refused during validation
    pub fn rejected(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items
            .iter()
            .filter(|item| item.phase == BulkPhase::Validation)
    }

    pub fn enrolled(&self) -> impl Iterator<Item = &Enrollment> {
        self.items.iter().filter_map(|item| match &item.outcome {
            BulkItemOutcome::Enrolled(enrollment) => Some(enrollment),
            _ => None,
        })
    }
}
