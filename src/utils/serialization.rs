use crate::error::Result;
use crate::graph::{Coloring, ConflictGraph, ExamId};
use crate::schedule::{SchedulePlan, Timetable, TimetableConfig};
use crate::utils::synthetic::SyntheticParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// A colored conflict graph as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInstance {
    pub graph: ConflictGraph,
    pub coloring: Coloring,
    pub timetable: TimetableConfig,
    pub metadata: Option<SyntheticParameters>,
}

impl ScheduleInstance {
    pub fn new(plan: &SchedulePlan) -> Self {
        ScheduleInstance {
            graph: plan.graph.clone(),
            coloring: plan.coloring.clone(),
            timetable: plan.timetable.config.clone(),
            metadata: None,
        }
    }

    pub fn with_metadata(plan: &SchedulePlan, metadata: SyntheticParameters) -> Self {
        ScheduleInstance {
            metadata: Some(metadata),
            ..Self::new(plan)
        }
    }

    pub fn to_timetable(&self) -> Result<Timetable> {
        Timetable::from_coloring(&self.coloring, &self.timetable)
    }
}

pub fn save_instance<P: AsRef<Path>>(path: P, instance: &ScheduleInstance) -> Result<()> {
    let bytes = bincode::serialize(instance)?;
    let mut file = fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

pub fn load_instance<P: AsRef<Path>>(path: P) -> Result<ScheduleInstance> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub exams: Vec<ExamId>,
    pub conflicts: Vec<(ExamId, ExamId)>,
    pub max_degree: usize,
}

impl GraphSummary {
    pub fn from_graph(graph: &ConflictGraph) -> Self {
        GraphSummary {
            exams: graph.exams().to_vec(),
            conflicts: graph.edge_list(),
            max_degree: graph.max_degree(),
        }
    }
}

/// JSON-facing view of a schedule run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub graph: GraphSummary,
    pub slots: BTreeMap<ExamId, u32>,
    pub slot_count: u32,
    pub timetable: Timetable,
    pub fingerprint: String,
}

impl ScheduleReport {
    pub fn from_plan(plan: &SchedulePlan) -> Self {
        ScheduleReport {
            graph: GraphSummary::from_graph(&plan.graph),
            slots: plan.coloring.assignments().clone(),
            slot_count: plan.coloring.slot_count(),
            timetable: plan.timetable.clone(),
            fingerprint: plan.coloring.fingerprint(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Enrollment;

    fn plan() -> SchedulePlan {
        let enrollment: Enrollment = [("s1", vec!["A", "B"]), ("s2", vec!["C"])]
            .into_iter()
            .collect();
        SchedulePlan::from_enrollment(&enrollment, &TimetableConfig::default()).unwrap()
    }

    #[test]
    fn instance_survives_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.bin");
        let plan = plan();
        save_instance(&path, &ScheduleInstance::new(&plan)).unwrap();

        let loaded = load_instance(&path).unwrap();
        assert_eq!(loaded.coloring, plan.coloring);
        assert_eq!(loaded.graph.edge_list(), plan.graph.edge_list());
        assert_eq!(loaded.to_timetable().unwrap(), plan.timetable);
        assert!(loaded.metadata.is_none());
    }

    #[test]
    fn corrupt_instance_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert!(matches!(
            load_instance(&path),
            Err(crate::error::SchedulerError::Serialization(_))
        ));
    }

    #[derive(Serialize)]
    struct HandEditedGraph {
        exams: Vec<String>,
        adjacency: Vec<std::collections::BTreeSet<u32>>,
    }

    #[derive(Serialize)]
    struct HandEditedInstance {
        graph: HandEditedGraph,
        coloring: Coloring,
        timetable: TimetableConfig,
        metadata: Option<SyntheticParameters>,
    }

    #[test]
    fn instance_with_dangling_neighbor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited.bin");
        let edited = HandEditedInstance {
            graph: HandEditedGraph {
                exams: vec!["A".to_string()],
                adjacency: vec![[7].into_iter().collect()],
            },
            coloring: Coloring::from_assignments([(ExamId::new("A"), 0)].into_iter().collect()),
            timetable: TimetableConfig::default(),
            metadata: None,
        };
        fs::write(&path, bincode::serialize(&edited).unwrap()).unwrap();

        assert!(matches!(
            load_instance(&path),
            Err(crate::error::SchedulerError::Serialization(_))
        ));
    }

    #[test]
    fn report_lists_conflicts_and_slots() {
        let report = ScheduleReport::from_plan(&plan());
        assert_eq!(report.graph.conflicts, vec![(ExamId::new("A"), ExamId::new("B"))]);
        assert_eq!(report.slot_count, 2);
        assert_eq!(report.slots[&ExamId::new("C")], 0);

        let json = report.to_json_pretty().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["slots"]["B"], 1);
        assert_eq!(parsed["fingerprint"].as_str().map(str::len), Some(64));
    }
}
