//! Per-subject cohort statistics aggregated from historical rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::HistoricalRow;
use crate::grades;

/// Historical outcome of one subject across every student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectCohortStats {
    pub subject_code: String,
    /// First name seen for the subject, falling back to its code.
    pub subject_name: String,
    /// Share of graded rows at C or better.
    pub pass_rate: Option<f64>,
    /// Mean overall percentage over rows that carry one.
    pub avg_score: Option<f64>,
    /// Mean grade points over rows with a known grade.
    pub avg_gpa: Option<f64>,
    /// Number of graded rows.
    pub total_students: usize,
}

#[derive(Default)]
struct Accumulator {
    name: Option<String>,
    graded: usize,
    passed: usize,
    scores: Vec<f64>,
    points: Vec<f64>,
}

/// Cohort statistics for every subject with at least one graded row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    subjects: BTreeMap<String, SubjectCohortStats>,
}

impl CohortStats {
    /// Aggregate in a single pass. Ungraded rows (pass markers, exemptions,
    /// withdrawals, blanks) are excluded entirely.
    pub fn compute<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoricalRow>,
    {
        let mut acc: BTreeMap<&'a str, Accumulator> = BTreeMap::new();
        for row in rows {
            let Some(grade) = row.grade.as_deref() else {
                continue;
            };
            if grades::is_ungraded(grade) {
                continue;
            }
            let entry = acc.entry(row.subject_code.as_str()).or_default();
            if entry.name.is_none() {
                entry.name = row.subject_name.clone().filter(|n| !n.trim().is_empty());
            }
            entry.graded += 1;
            if grades::is_passing(grade) {
                entry.passed += 1;
            }
            if let Some(score) = row.overall_percentage {
                entry.scores.push(score);
            }
            if let Some(points) = grades::grade_points(grade) {
                entry.points.push(points);
            }
        }

        let subjects = acc
            .into_iter()
            .map(|(code, a)| {
                let stats = SubjectCohortStats {
                    subject_code: code.to_string(),
                    subject_name: a.name.unwrap_or_else(|| code.to_string()),
                    pass_rate: Some(a.passed as f64 / a.graded as f64),
                    avg_score: grades::mean(&a.scores),
                    avg_gpa: grades::mean(&a.points),
                    total_students: a.graded,
                };
                (code.to_string(), stats)
            })
            .collect();

        Self { subjects }
    }

    pub fn get(&self, code: &str) -> Option<&SubjectCohortStats> {
        self.subjects.get(code)
    }

    pub fn subject_name(&self, code: &str) -> Option<&str> {
        self.subjects.get(code).map(|s| s.subject_name.as_str())
    }

    /// All subjects ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &SubjectCohortStats> {
        self.subjects.values()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
