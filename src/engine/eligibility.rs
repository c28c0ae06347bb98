// ==========================================
// Correlativities Engine - Eligibility Engine
// ==========================================
// Input: career subjects + prerequisite edges + student records
// Output: per-subject eligibility map (read-only, nothing is written)
// ==========================================

use crate::domain::{
    CareerId, Enrollment, StudentId, Subject, SubjectEligibility, SubjectId,
};
use crate::engine::error::EngineResult;
use crate::engine::{EligibilityCore, EnrollmentRepositories, PrerequisiteIndex};
use crate::repository::RepositoryResult;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// CareerSnapshot
// ==========================================
/// Store state needed to evaluate one student within one career
pub struct CareerSnapshot {
    /// Career subjects, placement year/semester, store order
    pub subjects: Vec<Subject>,
    /// Edges with both endpoints in the career
    pub scoped: PrerequisiteIndex,
    /// Every stored edge
    pub all: PrerequisiteIndex,
    /// Student records by subject
    pub enrollments: HashMap<SubjectId, Enrollment>,
}

impl CareerSnapshot {
    /// Load the three inputs concurrently
    pub async fn load(
        repos: &EnrollmentRepositories,
        student_id: &StudentId,
        career_id: &CareerId,
    ) -> RepositoryResult<Self> {
        let (subjects, edges, enrollments) = futures::try_join!(
            repos.catalog.subjects_by_career(career_id),
            repos.prerequisites.get_all(),
            repos.enrollments.list_by_student(student_id),
        )?;

        let scope: HashSet<SubjectId> = subjects.iter().map(|s| s.id.clone()).collect();
        let scoped = PrerequisiteIndex::scoped(&edges, &scope);
        let all = PrerequisiteIndex::from_edges(edges);

        Ok(Self {
            subjects,
            scoped,
            all,
            enrollments: EligibilityCore::index_enrollments(enrollments),
        })
    }
}

// ==========================================
// EligibilityEngine
// ==========================================
pub struct EligibilityEngine {
    repos: EnrollmentRepositories,
}

impl EligibilityEngine {
    pub fn new(repos: EnrollmentRepositories) -> Self {
        Self { repos }
    }

    /// Eligibility of every subject of a career for one student
    ///
    /// # Arguments
    /// - student_id: student being evaluated
    /// - career_id: career whose subjects are evaluated
    ///
    /// # Returns
    /// - Ok(map): one entry per career subject; empty for an unknown career
    /// - Err: first store failure
    #[instrument(skip(self), fields(student_id = %student_id, career_id = %career_id))]
    pub async fn get_eligibility_for_student(
        &self,
        student_id: &StudentId,
        career_id: &CareerId,
    ) -> EngineResult<BTreeMap<SubjectId, SubjectEligibility>> {
        let snapshot = CareerSnapshot::load(&self.repos, student_id, career_id).await?;

        let by_id: HashMap<&SubjectId, &Subject> =
            snapshot.subjects.iter().map(|s| (&s.id, s)).collect();

        let mut result = BTreeMap::new();
        for subject in &snapshot.subjects {
            let decision = EligibilityCore::compute_state(
                &subject.id,
                snapshot.scoped.prerequisites_of(&subject.id),
                &snapshot.enrollments,
            );

            // Scoped edges only, so every missing id is a career subject
            let missing_prerequisites = decision
                .missing
                .iter()
                .filter_map(|id| by_id.get(id).map(|s| (*s).clone()))
                .collect();

            result.insert(
                subject.id.clone(),
                SubjectEligibility {
                    subject_id: subject.id.clone(),
                    subject_name: subject.name.clone(),
                    year: subject.year,
                    semester: subject.semester,
                    status: decision.status,
                    missing_prerequisites,
                    capacity: subject.capacity_info(),
                },
            );
        }

        debug!(subjects = result.len(), "eligibility computed");
        Ok(result)
    }

    /// Prerequisites of a subject the student has not completed
    ///
    /// Uses every stored prerequisite of the subject, with no career scope.
    /// Ids without a subject record are skipped.
    #[instrument(skip(self), fields(student_id = %student_id, subject_id = %subject_id))]
    pub async fn get_missing_prerequisites(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> EngineResult<Vec<Subject>> {
        let edges = self.repos.prerequisites.get_by_subject(subject_id).await?;
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let enrollments = EligibilityCore::index_enrollments(
            self.repos.enrollments.list_by_student(student_id).await?,
        );
        let prerequisite_ids: Vec<SubjectId> = edges
            .into_iter()
            .map(|e| e.prerequisite_subject_id)
            .collect();
        let missing = EligibilityCore::missing_prerequisites(&prerequisite_ids, &enrollments);
        if missing.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.repos.catalog.find_subjects(&missing).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrollmentStatus, SubjectEligibilityStatus};
    use crate::engine::test_support::InMemoryStore;
    use crate::engine::EngineError;
    use std::sync::Arc;

    fn sid(id: &str) -> SubjectId {
        SubjectId::new(id)
    }

    /// Career "C1": A (1/1), B (1/2) requires A, C (2/1) requires A and B
    fn chain_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.add_subject("A", "Algebra", 1, 1, 30);
        store.add_subject("B", "Calculus", 1, 2, 30);
        store.add_subject("C", "Analysis", 2, 1, 30);
        for s in ["A", "B", "C"] {
            store.place("C1", s);
        }
        store.require("B", "A");
        store.require("C", "A");
        store.require("C", "B");
        store
    }

    #[tokio::test]
    async fn test_fresh_student_sees_roots_available() {
        let store = chain_store();
        let engine = EligibilityEngine::new(store.repositories());

        let map = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map[&sid("A")].status, SubjectEligibilityStatus::Available);
        assert_eq!(map[&sid("B")].status, SubjectEligibilityStatus::Locked);
        assert_eq!(map[&sid("C")].status, SubjectEligibilityStatus::Locked);
        let missing: Vec<&str> = map[&sid("C")]
            .missing_prerequisites
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(missing, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_progress_through_chain() {
        let store = chain_store();
        store.record("s1", "A", EnrollmentStatus::Completed);
        store.record("s1", "B", EnrollmentStatus::Active);
        let engine = EligibilityEngine::new(store.repositories());

        let map = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap();

        assert_eq!(map[&sid("A")].status, SubjectEligibilityStatus::AlreadyPassed);
        assert_eq!(map[&sid("B")].status, SubjectEligibilityStatus::CurrentlyEnrolled);
        assert_eq!(map[&sid("C")].status, SubjectEligibilityStatus::Locked);
        assert_eq!(map[&sid("C")].missing_prerequisites.len(), 1);
        assert_eq!(map[&sid("C")].missing_prerequisites[0].id, sid("B"));
    }

    #[tokio::test]
    async fn test_full_subject_stays_available() {
        let store = chain_store();
        store.set_current_enrollment("A", 30);
        let engine = EligibilityEngine::new(store.repositories());

        let map = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap();

        let a = &map[&sid("A")];
        assert_eq!(a.status, SubjectEligibilityStatus::Available);
        assert!(!a.capacity.has_capacity);
        assert_eq!(a.capacity.available_spots, 0);
        assert!(!a.is_selectable());
    }

    #[tokio::test]
    async fn test_prerequisite_outside_career_not_enforced() {
        let store = chain_store();
        store.add_subject("X", "Elective", 1, 1, 10);
        store.require("A", "X");
        let engine = EligibilityEngine::new(store.repositories());

        let map = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap();

        assert_eq!(map[&sid("A")].status, SubjectEligibilityStatus::Available);

        // The unscoped query still reports it
        let missing = engine
            .get_missing_prerequisites(&StudentId::new("s1"), &sid("A"))
            .await
            .unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, sid("X"));
    }

    #[tokio::test]
    async fn test_unknown_career_yields_empty_map() {
        let store = chain_store();
        let engine = EligibilityEngine::new(store.repositories());

        let map = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("NOPE"))
            .await
            .unwrap();

        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_missing_prerequisites_empty_when_none_defined() {
        let store = chain_store();
        let engine = EligibilityEngine::new(store.repositories());

        let missing = engine
            .get_missing_prerequisites(&StudentId::new("s1"), &sid("A"))
            .await
            .unwrap();

        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = chain_store();
        store.fail_reads();
        let engine = EligibilityEngine::new(store.repositories());

        let err = engine
            .get_eligibility_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Store(_)));
    }
}
