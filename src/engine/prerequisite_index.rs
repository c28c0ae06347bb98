// ==========================================
// Correlativities Engine - Prerequisite Index
// ==========================================
// Typed adjacency list built once per request from the stored edges,
// mirrored into a petgraph DiGraph (subject -> prerequisite) for cycle
// analysis. Acyclicity is not enforced; cycles are tolerated and reported.
// ==========================================

use crate::domain::{PrerequisiteEdge, SubjectId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

static NO_SUBJECTS: [SubjectId; 0] = [];

/// Adjacency list over subject ids
#[derive(Debug, Clone, Default)]
pub struct PrerequisiteIndex {
    edges: Vec<PrerequisiteEdge>,
    /// subject -> its prerequisites, in edge order
    requires: HashMap<SubjectId, Vec<SubjectId>>,
    /// prerequisite -> subjects it unlocks, in edge order
    unlocks: HashMap<SubjectId, Vec<SubjectId>>,
    graph: DiGraph<SubjectId, ()>,
    nodes: HashMap<SubjectId, NodeIndex>,
}

impl PrerequisiteIndex {
    /// Index every edge
    pub fn from_edges(edges: Vec<PrerequisiteEdge>) -> Self {
        let mut index = Self::default();
        for edge in edges {
            index.push(edge);
        }
        index
    }

    /// Index only edges whose both endpoints are in `scope`
    ///
    /// A prerequisite outside the scope is dropped together with its edge,
    /// so it is not enforced for subjects inside the scope.
    pub fn scoped<'a, I>(edges: I, scope: &HashSet<SubjectId>) -> Self
    where
        I: IntoIterator<Item = &'a PrerequisiteEdge>,
    {
        let mut index = Self::default();
        for edge in edges {
            if scope.contains(&edge.subject_id) && scope.contains(&edge.prerequisite_subject_id) {
                index.push(edge.clone());
            }
        }
        index
    }

    fn node(&mut self, subject_id: &SubjectId) -> NodeIndex {
        if let Some(&node) = self.nodes.get(subject_id) {
            return node;
        }
        let node = self.graph.add_node(subject_id.clone());
        self.nodes.insert(subject_id.clone(), node);
        node
    }

    fn push(&mut self, edge: PrerequisiteEdge) {
        let from = self.node(&edge.subject_id);
        let to = self.node(&edge.prerequisite_subject_id);
        self.graph.add_edge(from, to, ());

        self.requires
            .entry(edge.subject_id.clone())
            .or_default()
            .push(edge.prerequisite_subject_id.clone());
        self.unlocks
            .entry(edge.prerequisite_subject_id.clone())
            .or_default()
            .push(edge.subject_id.clone());
        self.edges.push(edge);
    }

    pub fn prerequisites_of(&self, subject_id: &SubjectId) -> &[SubjectId] {
        self.requires
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&NO_SUBJECTS)
    }

    pub fn dependents_of(&self, subject_id: &SubjectId) -> &[SubjectId] {
        self.unlocks
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&NO_SUBJECTS)
    }

    /// Edges in store order
    pub fn edges(&self) -> &[PrerequisiteEdge] {
        &self.edges
    }

    /// Prerequisite cycles (strongly connected components)
    ///
    /// Every component with more than one subject, or a subject requiring
    /// itself, is returned. Members are sorted; components are sorted by
    /// their first member.
    pub fn detect_cycles(&self) -> Vec<Vec<SubjectId>> {
        let mut cycles: Vec<Vec<SubjectId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut members: Vec<SubjectId> = component
                    .into_iter()
                    .map(|node| self.graph[node].clone())
                    .collect();
                members.sort();
                members
            })
            .collect();

        cycles.sort();
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PrerequisiteId;

    fn edge(subject: &str, prerequisite: &str) -> PrerequisiteEdge {
        PrerequisiteEdge {
            id: PrerequisiteId::new(format!("{}<-{}", subject, prerequisite)),
            subject_id: SubjectId::new(subject),
            prerequisite_subject_id: SubjectId::new(prerequisite),
        }
    }

    fn ids(values: &[&str]) -> Vec<SubjectId> {
        values.iter().map(|v| SubjectId::new(*v)).collect()
    }

    #[test]
    fn test_adjacency_both_directions() {
        let index = PrerequisiteIndex::from_edges(vec![edge("C", "A"), edge("C", "B"), edge("D", "A")]);

        assert_eq!(index.prerequisites_of(&SubjectId::new("C")), ids(&["A", "B"]).as_slice());
        assert_eq!(index.dependents_of(&SubjectId::new("A")), ids(&["C", "D"]).as_slice());
        assert!(index.prerequisites_of(&SubjectId::new("A")).is_empty());
        assert_eq!(index.edges().len(), 3);
    }

    #[test]
    fn test_scoped_drops_edges_leaving_scope() {
        let edges = vec![edge("B", "A"), edge("B", "OUTSIDE")];
        let scope: HashSet<SubjectId> = ids(&["A", "B"]).into_iter().collect();

        let index = PrerequisiteIndex::scoped(&edges, &scope);

        assert_eq!(index.prerequisites_of(&SubjectId::new("B")), ids(&["A"]).as_slice());
        assert_eq!(index.edges().len(), 1);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let index = PrerequisiteIndex::from_edges(vec![edge("B", "A"), edge("C", "B"), edge("C", "A")]);
        assert!(index.detect_cycles().is_empty());
    }

    #[test]
    fn test_detects_cycle_and_ignores_tail() {
        // A -> B -> C -> A, D requires A
        let index = PrerequisiteIndex::from_edges(vec![
            edge("A", "C"),
            edge("B", "A"),
            edge("C", "B"),
            edge("D", "A"),
        ]);

        assert_eq!(index.detect_cycles(), vec![ids(&["A", "B", "C"])]);
    }

    #[test]
    fn test_detects_self_loop_and_separate_cycles() {
        let index = PrerequisiteIndex::from_edges(vec![
            edge("X", "X"),
            edge("P", "Q"),
            edge("Q", "P"),
        ]);

        assert_eq!(index.detect_cycles(), vec![ids(&["P", "Q"]), ids(&["X"])]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let edges: Vec<PrerequisiteEdge> = (1..5_000)
            .map(|i| edge(&format!("S{}", i), &format!("S{}", i - 1)))
            .collect();
        let index = PrerequisiteIndex::from_edges(edges);
        assert!(index.detect_cycles().is_empty());
    }
}
