//! File-backed configuration for the `exam-slots` shell.
//!
//! Precedence (highest wins): command-line flags, the TOML file given with
//! `--config`, built-in defaults.
//!
//! ```toml
//! [timetable]
//! start_hour = 8
//! slot_duration = 3
//!
//! [synthetic]
//! exams = ["Math", "Physics", "CS"]
//! students = 120
//! seed = 7
//! ```

use crate::error::{Result, SchedulerError};
use crate::schedule::TimetableConfig;
use crate::utils::synthetic::SyntheticConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub timetable: TimetableConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

impl SchedulerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.timetable.validate()?;
        if self.synthetic.exams.iter().any(|exam| exam.trim().is_empty()) {
            return Err(SchedulerError::Config(
                "synthetic.exams must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}
