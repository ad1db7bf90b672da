use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a schedulable exam.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(String);

impl ExamId {
    pub fn new(id: impl Into<String>) -> Self {
        ExamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExamId {
    fn from(value: &str) -> Self {
        ExamId::new(value)
    }
}

impl From<String> for ExamId {
    fn from(value: String) -> Self {
        ExamId(value)
    }
}

/// Identifier of an enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        StudentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        StudentId::new(value)
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        StudentId(value)
    }
}

/// Snapshot of which students take which exams.
///
/// `exams` is the explicit exam universe. Exams listed there but taken by
/// nobody still become (isolated) nodes of the conflict graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(default)]
    pub records: BTreeMap<StudentId, BTreeSet<ExamId>>,
    #[serde(default)]
    pub exams: BTreeSet<ExamId>,
}

impl Enrollment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `exams` as part of the universe without enrolling anyone.
    pub fn with_exams<I, E>(mut self, exams: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ExamId>,
    {
        for exam in exams {
            self.add_exam(exam);
        }
        self
    }

    pub fn add_exam(&mut self, exam: impl Into<ExamId>) {
        self.exams.insert(exam.into());
    }

    pub fn enroll(&mut self, student: impl Into<StudentId>, exam: impl Into<ExamId>) {
        self.records
            .entry(student.into())
            .or_default()
            .insert(exam.into());
    }

    /// Adds a student with no exams, or leaves an existing one untouched.
    pub fn add_student(&mut self, student: impl Into<StudentId>) {
        self.records.entry(student.into()).or_default();
    }

    pub fn student_count(&self) -> usize {
        self.records.len()
    }

    pub fn registration_count(&self) -> usize {
        self.records.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.exams.is_empty()
    }

    /// Every exam mentioned either by a student or by the universe.
    pub fn all_exams(&self) -> BTreeSet<&ExamId> {
        self.records
            .values()
            .flat_map(|exams| exams.iter())
            .chain(self.exams.iter())
            .collect()
    }
}

impl<S, E, I> FromIterator<(S, I)> for Enrollment
where
    S: Into<StudentId>,
    E: Into<ExamId>,
    I: IntoIterator<Item = E>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut enrollment = Enrollment::new();
        for (student, exams) in iter {
            let student = student.into();
            enrollment.add_student(student.clone());
            for exam in exams {
                enrollment.enroll(student.clone(), exam);
            }
        }
        enrollment
    }
}
