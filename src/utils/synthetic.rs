use crate::graph::{Enrollment, ExamId, StudentId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Probability that a synthetic student takes 1, 2 or 3 exams.
pub const EXAM_LOAD_WEIGHTS: [f64; 3] = [0.65, 0.30, 0.05];

pub const DEFAULT_EXAMS: [&str; 8] = [
    "Math",
    "Physics",
    "Chemistry",
    "Biology",
    "CS",
    "Economics",
    "History",
    "English",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub exams: Vec<String>,
    pub students: u32,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            exams: DEFAULT_EXAMS.iter().map(|exam| exam.to_string()).collect(),
            students: 200,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticParameters {
    pub exams: u32,
    pub students: u32,
    pub seed: u64,
    pub registrations: u32,
    /// Number of students taking 1, 2 and 3 exams.
    pub load_histogram: [u32; 3],
}

/// Generates a reproducible enrollment: student `S{i}` draws an exam load
/// from [`EXAM_LOAD_WEIGHTS`] and takes that many distinct exams.
///
/// Every exam in `exams` is registered in the universe, so exams nobody
/// drew still show up as isolated nodes.
pub fn synthetic_enrollment(
    exams: &[ExamId],
    students: u32,
    seed: u64,
) -> (Enrollment, SyntheticParameters) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut enrollment = Enrollment::new().with_exams(exams.iter().cloned());
    let mut load_histogram = [0u32; 3];
    let mut registrations = 0u32;
    let mut pool: Vec<ExamId> = exams.to_vec();

    for i in 1..=students {
        let student = StudentId::new(format!("S{i}"));
        let load = draw_load(&mut rng).min(pool.len());
        enrollment.add_student(student.clone());
        if load == 0 {
            continue;
        }
        load_histogram[load - 1] += 1;

        let (chosen, _) = pool.partial_shuffle(&mut rng, load);
        for exam in chosen.iter() {
            enrollment.enroll(student.clone(), exam.clone());
            registrations += 1;
        }
    }

    let params = SyntheticParameters {
        exams: exams.len() as u32,
        students,
        seed,
        registrations,
        load_histogram,
    };
    (enrollment, params)
}

/// Same as [`synthetic_enrollment`], driven by a [`SyntheticConfig`].
pub fn synthetic_from_config(config: &SyntheticConfig) -> (Enrollment, SyntheticParameters) {
    let exams: Vec<ExamId> = config
        .exams
        .iter()
        .map(|exam| exam.trim())
        .filter(|exam| !exam.is_empty())
        .map(ExamId::from)
        .collect();
    synthetic_enrollment(&exams, config.students, config.seed)
}

fn draw_load(rng: &mut impl Rng) -> usize {
    let roll = rng.random::<f64>();
    let mut cumulative = 0.0;
    for (idx, weight) in EXAM_LOAD_WEIGHTS.iter().enumerate() {
        cumulative += weight;
        if roll < cumulative {
            return idx + 1;
        }
    }
    EXAM_LOAD_WEIGHTS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exams(names: &[&str]) -> Vec<ExamId> {
        names.iter().copied().map(ExamId::from).collect()
    }

    #[test]
    fn same_seed_gives_same_enrollment() {
        let exams = exams(&DEFAULT_EXAMS);
        let (first, _) = synthetic_enrollment(&exams, 50, 7);
        let (second, _) = synthetic_enrollment(&exams, 50, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn every_student_takes_one_to_three_distinct_exams() {
        let exams = exams(&DEFAULT_EXAMS);
        let (enrollment, params) = synthetic_enrollment(&exams, 300, 42);
        assert_eq!(enrollment.student_count(), 300);
        for taken in enrollment.records.values() {
            assert!((1..=3).contains(&taken.len()));
        }
        assert_eq!(params.load_histogram.iter().sum::<u32>(), 300);
        assert_eq!(params.registrations as usize, enrollment.registration_count());
    }

    #[test]
    fn load_is_capped_by_exam_count() {
        let exams = exams(&["Solo"]);
        let (enrollment, params) = synthetic_enrollment(&exams, 40, 1);
        assert!(enrollment.records.values().all(|taken| taken.len() == 1));
        assert_eq!(params.load_histogram, [40, 0, 0]);
    }

    #[test]
    fn universe_is_registered() {
        let exams = exams(&["A", "B", "C"]);
        let (enrollment, _) = synthetic_enrollment(&exams, 0, 3);
        assert_eq!(enrollment.exams.len(), 3);
        assert_eq!(enrollment.student_count(), 0);
    }

    #[test]
    fn no_exams_means_empty_students() {
        let (enrollment, params) = synthetic_enrollment(&[], 5, 3);
        assert_eq!(enrollment.student_count(), 5);
        assert_eq!(params.registrations, 0);
    }

    #[test]
    fn config_trims_blank_exam_names() {
        let config = SyntheticConfig {
            exams: vec![" Math ".into(), "".into(), "CS".into()],
            students: 4,
            seed: 11,
        };
        let (enrollment, params) = synthetic_from_config(&config);
        assert_eq!(params.exams, 2);
        assert!(enrollment.exams.contains(&ExamId::new("Math")));
    }
}
