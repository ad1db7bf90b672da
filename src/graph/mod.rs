pub mod builder;
pub mod coloring;
pub mod exam;
pub mod graph;

pub use builder::{build_conflict_graph, ConflictGraphBuilder};
pub use coloring::{verify_coloring, welsh_powell, Coloring, GreedyColorer};
pub use exam::{Enrollment, ExamId, StudentId};
pub use graph::ConflictGraph;
