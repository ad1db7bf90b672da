use crate::error::{Result, SchedulerError};
use crate::graph::exam::ExamId;
use crate::graph::graph::ConflictGraph;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Assignment of a slot index to every exam of a conflict graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coloring {
    assignments: BTreeMap<ExamId, u32>,
    slot_count: u32,
}

impl Coloring {
    /// Wraps an existing assignment; the slot count is `max slot + 1`.
    pub fn from_assignments(assignments: BTreeMap<ExamId, u32>) -> Self {
        let slot_count = assignments.values().max().map_or(0, |max| max + 1);
        Coloring {
            assignments,
            slot_count,
        }
    }

    pub fn slot_of(&self, exam: &ExamId) -> Option<u32> {
        self.assignments.get(exam).copied()
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assignments in exam identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ExamId, u32)> {
        self.assignments.iter().map(|(exam, &slot)| (exam, slot))
    }

    pub fn assignments(&self) -> &BTreeMap<ExamId, u32> {
        &self.assignments
    }

    /// Exams sharing `slot`, in identifier order.
    pub fn exams_in_slot(&self, slot: u32) -> Vec<&ExamId> {
        self.iter()
            .filter(|&(_, assigned)| assigned == slot)
            .map(|(exam, _)| exam)
            .collect()
    }

    /// Hex blake3 digest of the sorted `(exam, slot)` pairs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (exam, slot) in self.iter() {
            let bytes = exam.as_str().as_bytes();
            hasher.update(&(bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
            hasher.update(&slot.to_be_bytes());
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

/// Welsh-Powell greedy colorer.
///
/// Nodes are visited by descending degree; ties keep the graph's insertion
/// order. Each node takes the lowest slot not used by an already-colored
/// neighbour.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyColorer;

impl GreedyColorer {
    /// Visit order used by [`GreedyColorer::color`].
    pub fn ordering(graph: &ConflictGraph) -> Vec<u32> {
        let mut order: Vec<u32> = (0..graph.node_count() as u32).collect();
        order.sort_by_key(|&idx| (Reverse(graph.degree(idx)), idx));
        order
    }

    pub fn color(graph: &ConflictGraph) -> Result<Coloring> {
        if let Some(idx) = graph.self_loop() {
            return Err(SchedulerError::InvalidGraph {
                exam: graph.exam(idx).to_string(),
            });
        }

        let mut slots: Vec<Option<u32>> = vec![None; graph.node_count()];
        let mut slot_count = 0u32;
        let mut taken: BitVec = BitVec::new();

        for idx in Self::ordering(graph) {
            taken.clear();
            taken.resize(slot_count as usize + 1, false);
            for neighbor in graph.neighbors(idx) {
                if let Some(slot) = slots[neighbor as usize] {
                    taken.set(slot as usize, true);
                }
            }
            // The last bit always stays clear, so a free slot exists.
            let slot = taken.first_zero().unwrap_or(slot_count as usize) as u32;
            if slot == slot_count {
                slot_count += 1;
            }
            slots[idx as usize] = Some(slot);
        }

        let assignments: BTreeMap<ExamId, u32> = graph
            .exams()
            .iter()
            .cloned()
            .zip(slots.into_iter().map(|slot| slot.unwrap_or_default()))
            .collect();
        let coloring = Coloring {
            assignments,
            slot_count,
        };

        debug!(
            exams = graph.node_count(),
            edges = graph.edge_count(),
            max_degree = graph.max_degree(),
            slots = slot_count,
            "colored conflict graph"
        );
        debug_assert!(verify_coloring(graph, &coloring).is_ok());
        Ok(coloring)
    }
}

/// Colors `graph` with [`GreedyColorer`].
pub fn welsh_powell(graph: &ConflictGraph) -> Result<Coloring> {
    GreedyColorer::color(graph)
}

/// Checks that `coloring` assigns exactly the exams of `graph` and is a
/// proper, contiguous coloring, reporting the first violation found.
pub fn verify_coloring(graph: &ConflictGraph, coloring: &Coloring) -> Result<()> {
    for exam in graph.exams() {
        if coloring.slot_of(exam).is_none() {
            return Err(SchedulerError::MissingAssignment {
                exam: exam.to_string(),
            });
        }
    }

    for (exam, _) in coloring.iter() {
        if !graph.contains(exam) {
            return Err(SchedulerError::UnknownExam {
                exam: exam.to_string(),
            });
        }
    }

    for (a, b) in graph.edges() {
        let (a, b) = (graph.exam(a), graph.exam(b));
        if a == b {
            return Err(SchedulerError::InvalidGraph {
                exam: a.to_string(),
            });
        }
        let slot = coloring.slot_of(a);
        if slot == coloring.slot_of(b) {
            return Err(SchedulerError::ImproperColoring {
                a: a.to_string(),
                b: b.to_string(),
                slot: slot.unwrap_or_default(),
            });
        }
    }

    let used: BTreeSet<u32> = coloring.iter().map(|(_, slot)| slot).collect();
    for (expected, found) in used.iter().copied().enumerate() {
        if found != expected as u32 {
            return Err(SchedulerError::NonContiguousSlots {
                expected: expected as u32,
                found,
            });
        }
    }
    if used.len() as u32 != coloring.slot_count() {
        return Err(SchedulerError::NonContiguousSlots {
            expected: coloring.slot_count(),
            found: used.len() as u32,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(coloring: &Coloring, exam: &str) -> u32 {
        coloring.slot_of(&ExamId::new(exam)).unwrap()
    }

    #[test]
    fn ordering_sorts_by_degree_then_insertion() {
        let mut graph = ConflictGraph::new();
        graph.add_exam("Leaf");
        graph.add_conflict("Hub", "X");
        graph.add_conflict("Hub", "Y");
        graph.add_conflict("Hub", "Leaf");
        // degrees: Leaf 1, Hub 3, X 1, Y 1
        assert_eq!(GreedyColorer::ordering(&graph), vec![1, 0, 2, 3]);
    }

    #[test]
    fn star_uses_two_slots() {
        let mut graph = ConflictGraph::new();
        for leaf in ["A", "B", "C", "D"] {
            graph.add_conflict("Hub", leaf);
        }
        let coloring = GreedyColorer::color(&graph).unwrap();
        assert_eq!(coloring.slot_count(), 2);
        assert_eq!(slot(&coloring, "Hub"), 0);
        for leaf in ["A", "B", "C", "D"] {
            assert_eq!(slot(&coloring, leaf), 1);
        }
    }

    #[test]
    fn path_reuses_lowest_free_slot() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        graph.add_conflict("B", "C");
        graph.add_conflict("C", "D");
        // order: B, C (degree 2), A, D
        let coloring = GreedyColorer::color(&graph).unwrap();
        assert_eq!(slot(&coloring, "B"), 0);
        assert_eq!(slot(&coloring, "C"), 1);
        assert_eq!(slot(&coloring, "A"), 1);
        assert_eq!(slot(&coloring, "D"), 0);
        assert_eq!(coloring.slot_count(), 2);
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        graph.add_conflict("B", "B");
        match GreedyColorer::color(&graph) {
            Err(SchedulerError::InvalidGraph { exam }) => assert_eq!(exam, "B"),
            other => panic!("expected InvalidGraph, got {other:?}"),
        }
    }

    #[test]
    fn empty_graph_uses_no_slots() {
        let coloring = welsh_powell(&ConflictGraph::new()).unwrap();
        assert!(coloring.is_empty());
        assert_eq!(coloring.slot_count(), 0);
    }

    #[test]
    fn verify_reports_conflicting_slots() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        let bad = Coloring::from_assignments(
            [(ExamId::new("A"), 0), (ExamId::new("B"), 0)].into_iter().collect(),
        );
        assert!(matches!(
            verify_coloring(&graph, &bad),
            Err(SchedulerError::ImproperColoring { slot: 0, .. })
        ));
    }

    #[test]
    fn verify_reports_missing_and_gapped_slots() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");

        let missing = Coloring::from_assignments([(ExamId::new("A"), 0)].into_iter().collect());
        assert!(matches!(
            verify_coloring(&graph, &missing),
            Err(SchedulerError::MissingAssignment { .. })
        ));

        let gapped = Coloring::from_assignments(
            [(ExamId::new("A"), 0), (ExamId::new("B"), 2)].into_iter().collect(),
        );
        assert!(matches!(
            verify_coloring(&graph, &gapped),
            Err(SchedulerError::NonContiguousSlots {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn verify_reports_exams_outside_the_graph() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        let extra = Coloring::from_assignments(
            [(ExamId::new("A"), 0), (ExamId::new("B"), 1), (ExamId::new("Ghost"), 0)]
                .into_iter()
                .collect(),
        );
        match verify_coloring(&graph, &extra) {
            Err(SchedulerError::UnknownExam { exam }) => assert_eq!(exam, "Ghost"),
            other => panic!("expected UnknownExam, got {other:?}"),
        }
    }

    #[test]
    fn fingerprint_tracks_assignment() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        let first = GreedyColorer::color(&graph).unwrap();
        let second = GreedyColorer::color(&graph).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);

        let swapped = Coloring::from_assignments(
            [(ExamId::new("A"), 1), (ExamId::new("B"), 0)].into_iter().collect(),
        );
        assert_ne!(first.fingerprint(), swapped.fingerprint());
    }

    #[test]
    fn exams_in_slot_groups_assignments() {
        let mut graph = ConflictGraph::new();
        graph.add_conflict("A", "B");
        graph.add_exam("C");
        let coloring = GreedyColorer::color(&graph).unwrap();
        let names: Vec<&str> = coloring.exams_in_slot(0).into_iter().map(ExamId::as_str).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
