//! Classifier feature derivation.
//!
//! Features are derived once per student and once per (student, subject)
//! pair, then shared by the rule-based predictor and any classifier.

use serde::{Deserialize, Serialize};

use crate::grades;
use crate::history::{GradeRecord, StudentRecord};
use crate::prereq::PrerequisiteGraph;
use crate::statistics::SubjectCohortStats;

/// Number of records on each side of the GPA trend window.
const TREND_WINDOW: usize = 3;

/// Column order of the exported feature vector.
pub const FEATURE_COLUMNS: &[&str] = &[
    "num_subjects_completed",
    "current_gpa",
    "gpa_trend_last_3",
    "avg_coursework_percentage",
    "avg_overall_percentage",
    "num_fails",
    "fail_rate",
    "num_prerequisites",
    "num_prerequisites_completed",
    "num_prerequisites_missing",
    "avg_prereq_grade_points",
    "weighted_prereq_gpa",
    "min_prereq_grade",
    "max_prereq_grade",
    "subject_pass_rate",
    "subject_avg_score",
    "subject_avg_gpa",
    "subject_total_students",
    "subject_code_encoded",
];

/// Whole-history indicators for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFeatures {
    pub num_subjects_completed: usize,
    pub current_gpa: f64,
    /// Mean of the last three graded exams minus the three before them.
    pub gpa_trend_last_3: f64,
    pub avg_coursework_percentage: f64,
    pub avg_overall_percentage: f64,
    pub num_fails: usize,
    pub fail_rate: f64,
}

fn window_gpa(records: &[&GradeRecord]) -> f64 {
    let points: Vec<f64> = records.iter().filter_map(|r| r.grade_points()).collect();
    grades::mean(&points).unwrap_or(0.0)
}

impl StudentFeatures {
    pub fn from_record(record: &StudentRecord) -> Self {
        let records = record.records();
        if records.is_empty() {
            return Self::default();
        }

        let chronological = record.chronological();
        let gpa_trend_last_3 = if chronological.len() >= TREND_WINDOW * 2 {
            let n = chronological.len();
            let recent = window_gpa(&chronological[n - TREND_WINDOW..]);
            let previous = window_gpa(&chronological[n - TREND_WINDOW * 2..n - TREND_WINDOW]);
            recent - previous
        } else {
            0.0
        };

        let coursework: Vec<f64> = records
            .iter()
            .filter_map(|r| r.coursework_percentage)
            .collect();
        let overall: Vec<f64> = records.iter().filter_map(|r| r.overall_percentage).collect();
        let num_fails = records.iter().filter(|r| r.is_failing()).count();

        Self {
            num_subjects_completed: records.len(),
            current_gpa: record.current_gpa(),
            gpa_trend_last_3,
            avg_coursework_percentage: grades::mean(&coursework).unwrap_or(0.0),
            avg_overall_percentage: grades::mean(&overall).unwrap_or(0.0),
            num_fails,
            fail_rate: num_fails as f64 / records.len() as f64,
        }
    }
}

/// A graded prerequisite and its contribution to the weighted GPA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrerequisitePerformance {
    pub prereq_code: String,
    pub prereq_name: String,
    pub grade: String,
    pub grade_points: f64,
    pub weight: f64,
    /// `grade_points * weight`.
    pub impact: f64,
}

/// How a student stands against one subject's prerequisites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteAssessment {
    pub total: usize,
    /// Prerequisites present with a numeric grade, in graph order.
    pub performances: Vec<PrerequisitePerformance>,
    /// Prerequisites absent from the record.
    pub missing: Vec<String>,
    pub total_weight: f64,
    /// Weight-averaged grade points, 0.0 when nothing contributed.
    pub weighted_gpa: f64,
}

impl PrerequisiteAssessment {
    /// Split the prerequisites of `subject_code` into graded and missing.
    ///
    /// A prerequisite recorded without a numeric grade counts as neither.
    pub fn assess<F>(
        graph: &PrerequisiteGraph,
        record: &StudentRecord,
        subject_code: &str,
        name_of: F,
    ) -> Self
    where
        F: Fn(&str) -> String,
    {
        let prereqs = graph.prerequisites_of(subject_code);
        let mut assessment = PrerequisiteAssessment {
            total: prereqs.len(),
            ..Default::default()
        };
        let mut weighted_sum = 0.0;

        for prereq in prereqs {
            let Some(entry) = record.get(&prereq.code) else {
                assessment.missing.push(prereq.code.clone());
                continue;
            };
            let (Some(grade), Some(points)) = (entry.grade.as_ref(), entry.grade_points()) else {
                continue;
            };
            weighted_sum += points * prereq.weight;
            assessment.total_weight += prereq.weight;
            assessment.performances.push(PrerequisitePerformance {
                prereq_code: prereq.code.clone(),
                prereq_name: entry
                    .subject_name
                    .clone()
                    .unwrap_or_else(|| name_of(&prereq.code)),
                grade: grade.clone(),
                grade_points: points,
                weight: prereq.weight,
                impact: points * prereq.weight,
            });
        }

        if assessment.total_weight > 0.0 {
            assessment.weighted_gpa = weighted_sum / assessment.total_weight;
        }
        assessment
    }

    pub fn has_contributions(&self) -> bool {
        self.total_weight > 0.0
    }
}

/// Prerequisite indicators for one (student, subject) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteFeatures {
    pub num_prerequisites: usize,
    pub num_prerequisites_completed: usize,
    pub num_prerequisites_missing: usize,
    pub avg_prereq_grade_points: f64,
    pub weighted_prereq_gpa: f64,
    pub min_prereq_grade: f64,
    pub max_prereq_grade: f64,
}

impl From<&PrerequisiteAssessment> for PrerequisiteFeatures {
    fn from(assessment: &PrerequisiteAssessment) -> Self {
        let points: Vec<f64> = assessment
            .performances
            .iter()
            .map(|p| p.grade_points)
            .collect();
        Self {
            num_prerequisites: assessment.total,
            num_prerequisites_completed: points.len(),
            num_prerequisites_missing: assessment.missing.len(),
            avg_prereq_grade_points: grades::mean(&points).unwrap_or(0.0),
            weighted_prereq_gpa: assessment.weighted_gpa,
            min_prereq_grade: points.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max_prereq_grade: points.iter().copied().reduce(f64::max).unwrap_or(0.0),
        }
    }
}

/// Subject-wide indicators; neutral defaults when no history exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortFeatures {
    pub subject_pass_rate: f64,
    pub subject_avg_score: f64,
    pub subject_avg_gpa: f64,
    pub subject_total_students: usize,
}

impl Default for CohortFeatures {
    fn default() -> Self {
        Self {
            subject_pass_rate: 0.5,
            subject_avg_score: 50.0,
            subject_avg_gpa: 2.0,
            subject_total_students: 0,
        }
    }
}

impl CohortFeatures {
    pub fn from_stats(stats: Option<&SubjectCohortStats>) -> Self {
        let defaults = Self::default();
        match stats {
            Some(s) => Self {
                subject_pass_rate: s.pass_rate.unwrap_or(defaults.subject_pass_rate),
                subject_avg_score: s.avg_score.unwrap_or(defaults.subject_avg_score),
                subject_avg_gpa: s.avg_gpa.unwrap_or(defaults.subject_avg_gpa),
                subject_total_students: s.total_students,
            },
            None => defaults,
        }
    }
}

/// Everything a classifier sees for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub subject_code: String,
    pub student: StudentFeatures,
    pub prerequisites: PrerequisiteFeatures,
    pub cohort: CohortFeatures,
}

impl FeatureVector {
    /// Value of a named column. `subject_code_encoded` is adapter-specific
    /// and not resolved here.
    pub fn value(&self, column: &str) -> Option<f64> {
        let s = &self.student;
        let p = &self.prerequisites;
        let c = &self.cohort;
        let v = match column {
            "num_subjects_completed" => s.num_subjects_completed as f64,
            "current_gpa" => s.current_gpa,
            "gpa_trend_last_3" => s.gpa_trend_last_3,
            "avg_coursework_percentage" => s.avg_coursework_percentage,
            "avg_overall_percentage" => s.avg_overall_percentage,
            "num_fails" => s.num_fails as f64,
            "fail_rate" => s.fail_rate,
            "num_prerequisites" => p.num_prerequisites as f64,
            "num_prerequisites_completed" => p.num_prerequisites_completed as f64,
            "num_prerequisites_missing" => p.num_prerequisites_missing as f64,
            "avg_prereq_grade_points" => p.avg_prereq_grade_points,
            "weighted_prereq_gpa" => p.weighted_prereq_gpa,
            "min_prereq_grade" => p.min_prereq_grade,
            "max_prereq_grade" => p.max_prereq_grade,
            "subject_pass_rate" => c.subject_pass_rate,
            "subject_avg_score" => c.subject_avg_score,
            "subject_avg_gpa" => c.subject_avg_gpa,
            "subject_total_students" => c.subject_total_students as f64,
            _ => return None,
        };
        Some(v)
    }
}

/// Display name of a feature column.
pub fn display_name(column: &str) -> String {
    let mapped = match column {
        "current_gpa" => "Current GPA",
        "subject_pass_rate" => "Subject Pass Rate",
        "subject_avg_gpa" => "Subject Difficulty",
        "fail_rate" => "Student Fail Rate",
        "num_fails" => "Number of Fails",
        "avg_overall_percentage" => "Average Score",
        "avg_coursework_percentage" => "Coursework Performance",
        "num_subjects_completed" => "Subjects Completed",
        "gpa_trend_last_3" => "Recent GPA Trend",
        "weighted_prereq_gpa" => "Prerequisite Performance",
        "num_prerequisites_missing" => "Missing Prerequisites",
        _ => {
            return column
                .split('_')
                .filter(|w| !w.is_empty())
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" ")
        }
    };
    mapped.to_string()
}
