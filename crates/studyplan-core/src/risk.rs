//! Heuristic what-if risk simulation over a planned set of courses.
//!
//! Scores here run the opposite way to [`crate::prediction`]: a higher
//! score means a *safer* course. The two scales use distinct types and are
//! never mixed.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Course, ProgrammeVariant};

const PREREQ_WEIGHT: f64 = 0.30;
const CGPA_WEIGHT: f64 = 0.25;
const TREND_WEIGHT: f64 = 0.15;
const ATTENDANCE_WEIGHT: f64 = 0.15;
const WORKLOAD_WEIGHT: f64 = 0.15;

/// Credit load treated as a full, heavy semester.
pub const HEAVY_WORKLOAD_CREDITS: f64 = 24.0;

/// Heuristic risk band for the what-if simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Band for a safety score; higher scores are safer.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.70 {
            RiskBand::Low
        } else if score >= 0.40 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::Low => write!(f, "low"),
            RiskBand::Medium => write!(f, "medium"),
            RiskBand::High => write!(f, "high"),
        }
    }
}

/// Student indicators consumed by the risk heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentMetrics {
    /// Cumulative GPA on a 0–4 scale.
    #[serde(default)]
    pub cgpa: f64,
    /// Attendance percentage, 0–100.
    #[serde(default)]
    pub attendance: f64,
    /// Recent GPA trend in -1..1.
    #[serde(default)]
    pub gpa_trend: f64,
    /// Credits planned for the term. Replaced by `what_if`.
    #[serde(default)]
    pub planned_credits: f64,
}

/// Normalized inputs behind a course score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub prereq_completed_ratio: f64,
    pub cgpa_scaled: f64,
    pub trend_scaled: f64,
    pub attendance_scaled: f64,
    pub workload_penalty: f64,
}

impl RiskFactors {
    fn score(&self) -> f64 {
        PREREQ_WEIGHT * self.prereq_completed_ratio
            + CGPA_WEIGHT * self.cgpa_scaled
            + TREND_WEIGHT * self.trend_scaled
            + ATTENDANCE_WEIGHT * self.attendance_scaled
            + WORKLOAD_WEIGHT * self.workload_penalty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRisk {
    pub subject_code: String,
    pub subject_name: String,
    pub predicted_risk: RiskBand,
    /// Safety score rounded to three decimals.
    pub numeric_score: f64,
    pub factors: RiskFactors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfResult {
    pub selected_subject_codes: Vec<String>,
    pub total_credits: u32,
    pub aggregated_risk_score: f64,
    pub risk_band: RiskBand,
    pub per_course: Vec<CourseRisk>,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// What-if simulator bound to one programme variant.
pub struct RiskEngine<'a> {
    variant: &'a ProgrammeVariant,
}

impl<'a> RiskEngine<'a> {
    pub fn new(variant: &'a ProgrammeVariant) -> Self {
        Self { variant }
    }

    /// Score one course for a student.
    ///
    /// The band is taken from the unrounded score.
    pub fn compute_course_risk(
        &self,
        course: &Course,
        metrics: &StudentMetrics,
        completed: &HashSet<String>,
    ) -> CourseRisk {
        let prereqs = self
            .variant
            .prerequisite_graph
            .get(&course.subject_code)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let prereq_completed_ratio = if prereqs.is_empty() {
            1.0
        } else {
            prereqs.iter().filter(|p| completed.contains(*p)).count() as f64
                / prereqs.len() as f64
        };

        let factors = RiskFactors {
            prereq_completed_ratio,
            cgpa_scaled: metrics.cgpa / 4.0,
            trend_scaled: (metrics.gpa_trend + 1.0) / 2.0,
            attendance_scaled: metrics.attendance / 100.0,
            workload_penalty: (1.0 - metrics.planned_credits / HEAVY_WORKLOAD_CREDITS).max(0.0),
        };
        let score = factors.score();

        CourseRisk {
            subject_code: course.subject_code.clone(),
            subject_name: course.subject_name.clone(),
            predicted_risk: RiskBand::from_score(score),
            numeric_score: round3(score),
            factors,
        }
    }

    /// Simulate taking `planned` together.
    ///
    /// Codes unknown to the variant are ignored. The planned credit total
    /// replaces `metrics.planned_credits` before scoring.
    pub fn what_if(
        &self,
        planned: &[String],
        metrics: &StudentMetrics,
        completed: &HashSet<String>,
    ) -> WhatIfResult {
        let wanted: HashSet<&str> = planned.iter().map(String::as_str).collect();
        let courses: Vec<&Course> = self
            .variant
            .list_all_courses()
            .into_iter()
            .filter(|c| wanted.contains(c.subject_code.as_str()))
            .collect();

        if courses.len() < wanted.len() {
            let unknown: Vec<&str> = wanted
                .iter()
                .filter(|code| !courses.iter().any(|c| c.subject_code == **code))
                .copied()
                .collect();
            debug!(variant = %self.variant.key(), ?unknown, "ignoring unknown planned codes");
        }

        let total_credits: u32 = courses.iter().map(|c| c.credit).sum();
        let metrics = StudentMetrics {
            planned_credits: total_credits as f64,
            ..*metrics
        };

        let per_course: Vec<CourseRisk> = courses
            .iter()
            .map(|c| self.compute_course_risk(c, &metrics, completed))
            .collect();

        let aggregated = if per_course.is_empty() {
            0.0
        } else {
            per_course.iter().map(|r| r.numeric_score).sum::<f64>() / per_course.len() as f64
        };

        WhatIfResult {
            selected_subject_codes: planned.to_vec(),
            total_credits,
            aggregated_risk_score: round3(aggregated),
            risk_band: RiskBand::from_score(aggregated),
            per_course,
        }
    }
}
