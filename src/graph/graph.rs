use crate::error::SchedulerError;
use crate::graph::exam::ExamId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Undirected conflict graph over exams.
///
/// Nodes keep their insertion order; that order is the tie-break used by
/// the greedy colorer. Each unordered pair is stored once per endpoint in
/// `adjacency`, so the edge set is symmetric and deduplicated by
/// construction.
///
/// Only `exams` and `adjacency` are stored; deserializing rebuilds the index
/// and rejects adjacency that is out of range or one-sided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawConflictGraph", into = "RawConflictGraph")]
pub struct ConflictGraph {
    exams: Vec<ExamId>,
    index: HashMap<ExamId, u32>,
    adjacency: Vec<BTreeSet<u32>>,
}

#[derive(Serialize, Deserialize)]
struct RawConflictGraph {
    exams: Vec<ExamId>,
    adjacency: Vec<BTreeSet<u32>>,
}

impl From<ConflictGraph> for RawConflictGraph {
    fn from(graph: ConflictGraph) -> Self {
        RawConflictGraph {
            exams: graph.exams,
            adjacency: graph.adjacency,
        }
    }
}

impl TryFrom<RawConflictGraph> for ConflictGraph {
    type Error = SchedulerError;

    fn try_from(raw: RawConflictGraph) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| SchedulerError::Serialization(format!("conflict graph: {reason}"));
        if raw.exams.len() != raw.adjacency.len() {
            return Err(corrupt(format!(
                "{} exams but {} adjacency lists",
                raw.exams.len(),
                raw.adjacency.len()
            )));
        }

        let mut index = HashMap::with_capacity(raw.exams.len());
        for (idx, exam) in raw.exams.iter().enumerate() {
            if index.insert(exam.clone(), idx as u32).is_some() {
                return Err(corrupt(format!("exam {exam} is listed twice")));
            }
        }

        let nodes = raw.exams.len() as u32;
        for (idx, neighbors) in raw.adjacency.iter().enumerate() {
            for &other in neighbors {
                if other >= nodes {
                    return Err(corrupt(format!(
                        "exam {} points at node {other} of {nodes}",
                        raw.exams[idx]
                    )));
                }
                if !raw.adjacency[other as usize].contains(&(idx as u32)) {
                    return Err(corrupt(format!(
                        "conflict {} - {} is one-sided",
                        raw.exams[idx], raw.exams[other as usize]
                    )));
                }
            }
        }

        Ok(ConflictGraph {
            exams: raw.exams,
            index,
            adjacency: raw.adjacency,
        })
    }
}

impl ConflictGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `exam` if it is new and returns its node index.
    pub fn add_exam(&mut self, exam: impl Into<ExamId>) -> u32 {
        let exam = exam.into();
        if let Some(&idx) = self.index.get(&exam) {
            return idx;
        }
        let idx = self.exams.len() as u32;
        self.index.insert(exam.clone(), idx);
        self.exams.push(exam);
        self.adjacency.push(BTreeSet::new());
        idx
    }

    /// Records a conflict between `a` and `b`, adding either exam if needed.
    ///
    /// Returns `false` when the conflict was already present. A self-loop is
    /// stored as given; [`crate::graph::GreedyColorer`] refuses such graphs.
    pub fn add_conflict(&mut self, a: impl Into<ExamId>, b: impl Into<ExamId>) -> bool {
        let a = self.add_exam(a);
        let b = self.add_exam(b);
        self.connect(a, b)
    }

    pub(crate) fn connect(&mut self, a: u32, b: u32) -> bool {
        let inserted = self.adjacency[a as usize].insert(b);
        self.adjacency[b as usize].insert(a);
        inserted
    }

    pub fn node_count(&self) -> usize {
        self.exams.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency
            .iter()
            .enumerate()
            .map(|(idx, neighbors)| neighbors.range(idx as u32..).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    /// Exams in insertion order.
    pub fn exams(&self) -> &[ExamId] {
        &self.exams
    }

    pub fn exam(&self, idx: u32) -> &ExamId {
        &self.exams[idx as usize]
    }

    pub fn index_of(&self, exam: &ExamId) -> Option<u32> {
        self.index.get(exam).copied()
    }

    pub fn contains(&self, exam: &ExamId) -> bool {
        self.index.contains_key(exam)
    }

    pub fn neighbors(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency[idx as usize].iter().copied()
    }

    pub fn degree(&self, idx: u32) -> usize {
        self.adjacency[idx as usize].len()
    }

    pub fn degree_of(&self, exam: &ExamId) -> Option<usize> {
        self.index_of(exam).map(|idx| self.degree(idx))
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    pub fn has_conflict(&self, a: &ExamId, b: &ExamId) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => self.adjacency[a as usize].contains(&b),
            _ => false,
        }
    }

    /// First node adjacent to itself, if any.
    pub fn self_loop(&self) -> Option<u32> {
        self.adjacency
            .iter()
            .enumerate()
            .find(|(idx, neighbors)| neighbors.contains(&(*idx as u32)))
            .map(|(idx, _)| idx as u32)
    }

    /// Every unordered pair exactly once, as `(lower, higher)` node indices.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (idx, neighbors) in self.adjacency.iter().enumerate() {
            let idx = idx as u32;
            for &other in neighbors.range(idx..) {
                edges.push((idx, other));
            }
        }
        edges
    }

    pub fn edge_list(&self) -> Vec<(ExamId, ExamId)> {
        self.edges()
            .into_iter()
            .map(|(a, b)| (self.exam(a).clone(), self.exam(b).clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_conflict_is_symmetric_and_deduplicated() {
        let mut graph = ConflictGraph::new();
        assert!(graph.add_conflict("A", "B"));
        assert!(!graph.add_conflict("B", "A"));
        assert!(!graph.add_conflict("A", "B"));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_conflict(&"A".into(), &"B".into()));
        assert!(graph.has_conflict(&"B".into(), &"A".into()));
        assert_eq!(graph.edges(), vec![(0, 1)]);
    }

    #[test]
    fn add_exam_keeps_insertion_order() {
        let mut graph = ConflictGraph::new();
        assert_eq!(graph.add_exam("Physics"), 0);
        assert_eq!(graph.add_exam("Art"), 1);
        assert_eq!(graph.add_exam("Physics"), 0);
        let names: Vec<&str> = graph.exams().iter().map(ExamId::as_str).collect();
        assert_eq!(names, vec!["Physics", "Art"]);
    }

    #[test]
    fn degrees_follow_adjacency() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        graph.add_conflict("A", "C");
        graph.add_exam("D");
        assert_eq!(graph.degree_of(&"A".into()), Some(2));
        assert_eq!(graph.degree_of(&"D".into()), Some(0));
        assert_eq!(graph.degree_of(&"Z".into()), None);
        assert_eq!(graph.max_degree(), 2);
    }

    fn raw(exams: &[&str], adjacency: Vec<Vec<u32>>) -> RawConflictGraph {
        RawConflictGraph {
            exams: exams.iter().map(|&exam| ExamId::new(exam)).collect(),
            adjacency: adjacency
                .into_iter()
                .map(|neighbors| neighbors.into_iter().collect())
                .collect(),
        }
    }

    #[test]
    fn stored_graph_rebuilds_index() {
        let graph = ConflictGraph::try_from(raw(&["A", "B", "C"], vec![vec![1], vec![0], vec![]]))
            .unwrap();
        assert_eq!(graph.index_of(&"C".into()), Some(2));
        assert!(graph.has_conflict(&"B".into(), &"A".into()));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn stored_graph_rejects_out_of_range_neighbor() {
        let err = ConflictGraph::try_from(raw(&["A"], vec![vec![7]])).unwrap_err();
        assert!(matches!(err, SchedulerError::Serialization(_)));
    }

    #[test]
    fn stored_graph_rejects_one_sided_conflict() {
        let err = ConflictGraph::try_from(raw(&["A", "B"], vec![vec![1], vec![]])).unwrap_err();
        assert!(matches!(err, SchedulerError::Serialization(_)));
    }

    #[test]
    fn stored_graph_rejects_mismatched_lengths_and_duplicates() {
        assert!(ConflictGraph::try_from(raw(&["A", "B"], vec![vec![]])).is_err());
        assert!(ConflictGraph::try_from(raw(&["A", "A"], vec![vec![], vec![]])).is_err());
    }

    #[test]
    fn stored_self_loop_survives_for_the_colorer() {
        let graph = ConflictGraph::try_from(raw(&["A"], vec![vec![0]])).unwrap();
        assert_eq!(graph.self_loop(), Some(0));
    }

    #[test]
    fn self_loop_is_reported() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        assert_eq!(graph.self_loop(), None);
        graph.add_conflict("B", "B");
        assert_eq!(graph.self_loop(), Some(1));
        assert_eq!(graph.edge_count(), 2);
    }
}
