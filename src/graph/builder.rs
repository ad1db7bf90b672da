use crate::error::{Result, SchedulerError};
use crate::graph::exam::{Enrollment, ExamId};
use crate::graph::graph::ConflictGraph;
use tracing::debug;

/// Turns an [`Enrollment`] snapshot into a [`ConflictGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictGraphBuilder;

impl ConflictGraphBuilder {
    /// Builds the conflict graph for `enrollment`.
    ///
    /// Nodes are every exam taken by some student plus the enrollment's
    /// exam universe, inserted in identifier order. Two exams are adjacent
    /// iff at least one student takes both. Fails without returning a
    /// partial graph if a student id or exam id is blank.
    pub fn build(enrollment: &Enrollment) -> Result<ConflictGraph> {
        validate(enrollment)?;

        let mut graph = ConflictGraph::new();
        for exam in enrollment.all_exams() {
            graph.add_exam(exam.clone());
        }

        let mut pairs = 0usize;
        for exams in enrollment.records.values() {
            let nodes: Vec<u32> = exams
                .iter()
                .filter_map(|exam| graph.index_of(exam))
                .collect();
            for (i, &a) in nodes.iter().enumerate() {
                for &b in &nodes[i + 1..] {
                    graph.connect(a, b);
                    pairs += 1;
                }
            }
        }

        debug!(
            students = enrollment.student_count(),
            exams = graph.node_count(),
            edges = graph.edge_count(),
            pairs,
            "built conflict graph"
        );
        Ok(graph)
    }
}

/// Convenience wrapper around [`ConflictGraphBuilder::build`].
pub fn build_conflict_graph(enrollment: &Enrollment) -> Result<ConflictGraph> {
    ConflictGraphBuilder::build(enrollment)
}

fn validate(enrollment: &Enrollment) -> Result<()> {
    for (student, exams) in &enrollment.records {
        if student.is_blank() {
            return Err(SchedulerError::MalformedEnrollment {
                student: student.to_string(),
                reason: "student id is empty".to_string(),
            });
        }
        if exams.iter().any(ExamId::is_blank) {
            return Err(SchedulerError::MalformedEnrollment {
                student: student.to_string(),
                reason: "exam entry has an empty identifier".to_string(),
            });
        }
    }
    if enrollment.exams.iter().any(ExamId::is_blank) {
        return Err(SchedulerError::MalformedEnrollment {
            student: String::new(),
            reason: "exam universe contains an empty identifier".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(records: Vec<(&str, Vec<&str>)>) -> Enrollment {
        records.into_iter().collect()
    }

    #[test]
    fn shared_students_produce_one_edge() {
        let enrollment = enrollment(vec![
            ("s1", vec!["A", "B"]),
            ("s2", vec!["A", "B"]),
            ("s3", vec!["B", "A"]),
        ]);
        let graph = ConflictGraphBuilder::build(&enrollment).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn nodes_are_inserted_in_identifier_order() {
        let enrollment = enrollment(vec![("s1", vec!["Physics", "Art"]), ("s2", vec!["Chemistry"])]);
        let graph = ConflictGraphBuilder::build(&enrollment).unwrap();
        let names: Vec<&str> = graph.exams().iter().map(ExamId::as_str).collect();
        assert_eq!(names, vec!["Art", "Chemistry", "Physics"]);
    }

    #[test]
    fn universe_exams_become_isolated_nodes() {
        let enrollment = enrollment(vec![("s1", vec!["A", "B"])]).with_exams(["Z"]);
        let graph = ConflictGraphBuilder::build(&enrollment).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.degree_of(&"Z".into()), Some(0));
    }

    #[test]
    fn empty_enrollment_yields_empty_graph() {
        let graph = ConflictGraphBuilder::build(&Enrollment::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn student_with_single_exam_adds_no_edges() {
        let enrollment = enrollment(vec![("s1", vec!["A"]), ("s2", vec![])]);
        let graph = ConflictGraphBuilder::build(&enrollment).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn blank_student_id_is_rejected() {
        let enrollment = enrollment(vec![("  ", vec!["A", "B"])]);
        let err = ConflictGraphBuilder::build(&enrollment).unwrap_err();
        assert!(matches!(err, SchedulerError::MalformedEnrollment { .. }));
    }

    #[test]
    fn blank_exam_id_is_rejected() {
        let enrollment = enrollment(vec![("s1", vec!["A", ""])]);
        let err = ConflictGraphBuilder::build(&enrollment).unwrap_err();
        match err {
            SchedulerError::MalformedEnrollment { student, .. } => assert_eq!(student, "s1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_universe_exam_is_rejected() {
        let enrollment = Enrollment::new().with_exams([" "]);
        assert!(ConflictGraphBuilder::build(&enrollment).is_err());
    }
}
