pub mod config;
pub mod error;
pub mod graph;
pub mod schedule;
pub mod ui;
pub mod utils;

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use graph::*;
pub use schedule::{ScheduledExam, SchedulePlan, Timetable, TimetableConfig};
pub use ui::{ScheduleView, Visualizer};
pub use utils::serialization::{ScheduleInstance, ScheduleReport};
