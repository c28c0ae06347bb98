// ==========================================
// Correlativities Engine - Graph Builder
// ==========================================
// Output: nodes (career subjects with state) + edges (prerequisite ->
// subject) for visualization. Node state follows EligibilityCore.
// Cycles are reported, never rejected.
// ==========================================

use crate::domain::{
    CareerId, CorrelativitiesGraph, StudentId, SubjectEdge, SubjectNode,
};
use crate::engine::eligibility::CareerSnapshot;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::{EligibilityCore, EnrollmentRepositories};
use tracing::{instrument, warn};

pub struct CorrelativitiesGraphBuilder {
    repos: EnrollmentRepositories,
    report_cycles: bool,
}

impl CorrelativitiesGraphBuilder {
    pub fn new(repos: EnrollmentRepositories) -> Self {
        Self {
            repos,
            report_cycles: true,
        }
    }

    /// Toggle cycle detection
    pub fn with_cycle_report(mut self, report_cycles: bool) -> Self {
        self.report_cycles = report_cycles;
        self
    }

    /// Build the correlativities graph of a career for one student
    ///
    /// # Returns
    /// - Ok(graph): nodes sorted by (year, semester, name, id); edges in
    ///   store order, only those with both endpoints in the career
    /// - Err(EngineError::GraphLoad): any store read failed; no partial graph
    #[instrument(skip(self), fields(student_id = %student_id, career_id = %career_id))]
    pub async fn build_graph(
        &self,
        student_id: &StudentId,
        career_id: &CareerId,
    ) -> EngineResult<CorrelativitiesGraph> {
        let snapshot = CareerSnapshot::load(&self.repos, student_id, career_id)
            .await
            .map_err(|source| EngineError::GraphLoad {
                student_id: student_id.clone(),
                career_id: career_id.clone(),
                source,
            })?;

        let mut subjects = snapshot.subjects.clone();
        subjects.sort_by(|a, b| {
            (a.year, a.semester, &a.name, &a.id).cmp(&(b.year, b.semester, &b.name, &b.id))
        });

        let nodes: Vec<SubjectNode> = subjects
            .into_iter()
            .map(|subject| {
                let decision = EligibilityCore::compute_state(
                    &subject.id,
                    snapshot.scoped.prerequisites_of(&subject.id),
                    &snapshot.enrollments,
                );
                SubjectNode {
                    prerequisites: snapshot.all.prerequisites_of(&subject.id).to_vec(),
                    state: decision.status,
                    capacity: subject.capacity,
                    current_enrollment: subject.current_enrollment,
                    id: subject.id,
                    name: subject.name,
                    year: subject.year,
                    semester: subject.semester,
                }
            })
            .collect();

        let edges: Vec<SubjectEdge> = snapshot
            .scoped
            .edges()
            .iter()
            .map(|edge| SubjectEdge {
                id: edge.id.clone(),
                source: edge.prerequisite_subject_id.clone(),
                target: edge.subject_id.clone(),
                is_enabled: EligibilityCore::is_prerequisite_met(
                    &edge.prerequisite_subject_id,
                    &snapshot.enrollments,
                ),
            })
            .collect();

        let cycles = if self.report_cycles {
            snapshot.scoped.detect_cycles()
        } else {
            Vec::new()
        };
        for cycle in &cycles {
            let members: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
            warn!(career_id = %career_id, subjects = ?members, "prerequisite cycle detected");
        }

        Ok(CorrelativitiesGraph {
            nodes,
            edges,
            cycles,
        })
    }
}
