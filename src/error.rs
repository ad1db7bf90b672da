//! Error types shared by the scheduling core and the application shell.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An enrollment record has an empty student id or an empty exam id.
    #[error("malformed enrollment for student '{student}': {reason}")]
    MalformedEnrollment { student: String, reason: String },

    /// The conflict graph contains a self-loop and cannot be colored.
    #[error("invalid conflict graph: exam '{exam}' conflicts with itself")]
    InvalidGraph { exam: String },

    /// Two conflicting exams share a slot.
    #[error("improper coloring: '{a}' and '{b}' conflict but both use slot {slot}")]
    ImproperColoring { a: String, b: String, slot: u32 },

    /// An exam in the graph has no slot.
    #[error("exam '{exam}' has no slot assignment")]
    MissingAssignment { exam: String },

    /// A slot is assigned to an exam the graph does not contain.
    #[error("exam '{exam}' has a slot but is not in the conflict graph")]
    UnknownExam { exam: String },

    /// Slot indices do not form the range `0..n`.
    #[error("slot indices are not contiguous: expected {expected}, found {found}")]
    NonContiguousSlots { expected: u32, found: u32 },

    #[error("CSV error on line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for SchedulerError {
    fn from(err: bincode::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SchedulerError {
    fn from(err: toml::de::Error) -> Self {
        SchedulerError::Config(err.to_string())
    }
}
