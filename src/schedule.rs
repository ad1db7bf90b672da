//! Turns a slot coloring into a timetable of concrete exam times.

use crate::error::{Result, SchedulerError};
use crate::graph::{Coloring, ConflictGraph, ConflictGraphBuilder, Enrollment, ExamId, GreedyColorer};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::debug;

const GANTT_CELL_WIDTH: usize = 4;

pub const MAX_START_HOUR: u32 = 23;
pub const MAX_SLOT_DURATION: u32 = 8;

/// Output of one build → color → timetable run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub graph: ConflictGraph,
    pub coloring: Coloring,
    pub timetable: Timetable,
}

impl SchedulePlan {
    /// Runs the whole pipeline over an enrollment snapshot.
    pub fn from_enrollment(enrollment: &Enrollment, config: &TimetableConfig) -> Result<Self> {
        let graph = ConflictGraphBuilder::build(enrollment)?;
        Self::from_graph(graph, config)
    }

    /// Colors an already assembled graph and lays out its timetable.
    pub fn from_graph(graph: ConflictGraph, config: &TimetableConfig) -> Result<Self> {
        let coloring = GreedyColorer::color(&graph)?;
        let timetable = Timetable::from_coloring(&coloring, config)?;
        debug!(
            exams = graph.node_count(),
            conflicts = graph.edge_count(),
            slots = coloring.slot_count(),
            "schedule planned"
        );
        Ok(SchedulePlan {
            graph,
            coloring,
            timetable,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    /// Hour of day at which slot 0 begins.
    pub start_hour: u32,
    /// Length of every slot, in hours.
    pub slot_duration: u32,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        TimetableConfig {
            start_hour: 9,
            slot_duration: 2,
        }
    }
}

impl TimetableConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start_hour > MAX_START_HOUR {
            return Err(SchedulerError::Config(format!(
                "timetable.start_hour must be between 0 and {MAX_START_HOUR}, got {}",
                self.start_hour
            )));
        }
        if !(1..=MAX_SLOT_DURATION).contains(&self.slot_duration) {
            return Err(SchedulerError::Config(format!(
                "timetable.slot_duration must be between 1 and {MAX_SLOT_DURATION} hours, got {}",
                self.slot_duration
            )));
        }
        Ok(())
    }

    /// Hour at which `slot` ends, or `None` if it does not fit in a `u32`.
    pub fn checked_slot_end(&self, slot: u32) -> Option<u32> {
        slot.checked_add(1)?
            .checked_mul(self.slot_duration)?
            .checked_add(self.start_hour)
    }

    pub fn slot_start(&self, slot: u32) -> u32 {
        self.start_hour + slot * self.slot_duration
    }

    pub fn slot_label(&self, slot: u32) -> String {
        let start = self.slot_start(slot);
        format!(
            "Slot {} ({:02}:00 - {:02}:00)",
            slot + 1,
            start,
            start + self.slot_duration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledExam {
    pub exam: ExamId,
    /// Zero-based slot index from the coloring.
    pub slot: u32,
    pub start: u32,
    pub duration: u32,
    pub label: String,
}

impl ScheduledExam {
    pub fn end(&self) -> u32 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub config: TimetableConfig,
    /// Rows ordered by `(slot, exam)`.
    pub rows: Vec<ScheduledExam>,
    pub slot_count: u32,
}

impl Timetable {
    pub fn from_coloring(coloring: &Coloring, config: &TimetableConfig) -> Result<Self> {
        config.validate()?;
        if let Some(last) = coloring.slot_count().checked_sub(1) {
            if config.checked_slot_end(last).is_none() {
                return Err(SchedulerError::Config(format!(
                    "{} slots of {} hours do not fit in a timetable",
                    coloring.slot_count(),
                    config.slot_duration
                )));
            }
        }
        let mut rows: Vec<ScheduledExam> = coloring
            .iter()
            .map(|(exam, slot)| ScheduledExam {
                exam: exam.clone(),
                slot,
                start: config.slot_start(slot),
                duration: config.slot_duration,
                label: config.slot_label(slot),
            })
            .collect();
        rows.sort_by(|a, b| (a.slot, &a.exam).cmp(&(b.slot, &b.exam)));

        Ok(Timetable {
            config: config.clone(),
            rows,
            slot_count: coloring.slot_count(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows grouped per slot, in slot order.
    pub fn slots(&self) -> Vec<(u32, Vec<&ScheduledExam>)> {
        let mut grouped: Vec<(u32, Vec<&ScheduledExam>)> = Vec::new();
        for row in &self.rows {
            if let Some((slot, members)) = grouped.last_mut() {
                if *slot == row.slot {
                    members.push(row);
                    continue;
                }
            }
            grouped.push((row.slot, vec![row]));
        }
        grouped
    }

    /// Hour at which the last slot ends, or the start hour when empty.
    pub fn end_hour(&self) -> u32 {
        self.rows
            .iter()
            .map(ScheduledExam::end)
            .max()
            .unwrap_or(self.config.start_hour)
    }

    /// Plain-text Gantt chart, one line per exam.
    pub fn render_gantt(&self) -> String {
        if self.is_empty() {
            return "No schedule.\n".to_string();
        }

        let name_width = self
            .rows
            .iter()
            .map(|row| row.exam.as_str().chars().count())
            .max()
            .unwrap_or(0);
        let first_hour = self.config.start_hour;
        let hours = (self.end_hour() - first_hour) as usize;

        let mut out = String::new();
        let _ = write!(out, "{:name_width$} |", "");
        for hour in (first_hour..self.end_hour()).step_by(self.config.slot_duration as usize) {
            let _ = write!(
                out,
                "{:<width$}",
                format!("{:02}", hour % 24),
                width = GANTT_CELL_WIDTH * self.config.slot_duration as usize
            );
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{}-+{}",
            "-".repeat(name_width),
            "-".repeat(hours * GANTT_CELL_WIDTH)
        );

        for row in &self.rows {
            let offset = (row.start - first_hour) as usize * GANTT_CELL_WIDTH;
            let width = row.duration as usize * GANTT_CELL_WIDTH;
            let _ = writeln!(
                out,
                "{:name_width$} |{}{} {}",
                row.exam.as_str(),
                " ".repeat(offset),
                "#".repeat(width),
                row.label
            );
        }
        out
    }
}
