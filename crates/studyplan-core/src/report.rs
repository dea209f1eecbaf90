//! Advising report envelope with JSON persistence and drift detection.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prediction::{RiskLevel, StudentPredictionReport, SubjectPrediction};
use crate::progress::ProgressReport;

/// A student's predictions, optionally with progress, as handed to an advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Variant key the progress was computed against.
    #[serde(default)]
    pub variant: Option<String>,
    /// Classifier used for hybrid predictions, if any.
    #[serde(default)]
    pub classifier: Option<String>,
    pub prediction: StudentPredictionReport,
    #[serde(default)]
    pub progress: Option<ProgressReport>,
}

impl AdvisingReport {
    pub fn new(prediction: StudentPredictionReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            variant: None,
            classifier: None,
            prediction,
            progress: None,
        }
    }

    pub fn with_progress(mut self, variant: &str, progress: ProgressReport) -> Self {
        self.variant = Some(variant.to_string());
        self.progress = Some(progress);
        self
    }

    pub fn with_classifier(mut self, name: Option<&str>) -> Self {
        self.classifier = name.map(str::to_string);
        self
    }

    pub fn student_id(&self) -> &str {
        &self.prediction.student_id
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AdvisingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare predicted probabilities against an earlier report.
    ///
    /// A subject moves into `declines` or `gains` when its probability
    /// changed by more than `threshold`.
    pub fn compare(&self, baseline: &AdvisingReport, threshold: f64) -> DriftReport {
        let index = |report: &AdvisingReport| -> HashMap<String, SubjectPrediction> {
            report
                .prediction
                .predictions
                .iter()
                .map(|p| (p.subject_code.clone(), p.clone()))
                .collect()
        };
        let before = index(baseline);

        let mut declines = Vec::new();
        let mut gains = Vec::new();
        let mut unchanged = 0usize;
        let mut new_subjects = Vec::new();

        for current in &self.prediction.predictions {
            let Some(previous) = before.get(&current.subject_code) else {
                new_subjects.push(current.subject_code.clone());
                continue;
            };
            let delta = current.predicted_success_probability - previous.predicted_success_probability;
            let drift = SubjectDrift {
                subject_code: current.subject_code.clone(),
                baseline_probability: previous.predicted_success_probability,
                current_probability: current.predicted_success_probability,
                baseline_risk: previous.risk_level,
                current_risk: current.risk_level,
                delta,
            };
            if delta < -threshold {
                declines.push(drift);
            } else if delta > threshold {
                gains.push(drift);
            } else {
                unchanged += 1;
            }
        }

        let after = index(self);
        let mut removed_subjects: Vec<String> = before
            .keys()
            .filter(|code| !after.contains_key(*code))
            .cloned()
            .collect();
        removed_subjects.sort();

        DriftReport {
            student_id: self.student_id().to_string(),
            gpa_delta: self.prediction.current_gpa - baseline.prediction.current_gpa,
            declines,
            gains,
            unchanged,
            new_subjects,
            removed_subjects,
        }
    }
}

/// Change of one subject's prediction between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDrift {
    pub subject_code: String,
    pub baseline_probability: f64,
    pub current_probability: f64,
    pub baseline_risk: RiskLevel,
    pub current_risk: RiskLevel,
    pub delta: f64,
}

/// Result of comparing two advising reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub student_id: String,
    pub gpa_delta: f64,
    /// Subjects whose success probability went down.
    pub declines: Vec<SubjectDrift>,
    /// Subjects whose success probability went up.
    pub gains: Vec<SubjectDrift>,
    pub unchanged: usize,
    /// Subjects in current but not baseline.
    pub new_subjects: Vec<String>,
    /// Subjects in baseline but not current.
    pub removed_subjects: Vec<String>,
}

impl DriftReport {
    /// Format the drift report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary for {}:** {} declines, {} gains, {} unchanged (GPA {:+.2})\n\n",
            self.student_id,
            self.declines.len(),
            self.gains.len(),
            self.unchanged,
            self.gpa_delta
        ));

        let mut table = |title: &str, rows: &[SubjectDrift]| {
            if rows.is_empty() {
                return;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Subject | Baseline | Current | Delta | Risk |\n");
            md.push_str("|---------|----------|---------|-------|------|\n");
            for d in rows {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% | {} -> {} |\n",
                    d.subject_code,
                    d.baseline_probability * 100.0,
                    d.current_probability * 100.0,
                    d.delta * 100.0,
                    d.baseline_risk,
                    d.current_risk
                ));
            }
            md.push('\n');
        };
        table("Declines", &self.declines);
        table("Gains", &self.gains);

        if !self.new_subjects.is_empty() {
            md.push_str(&format!("New subjects: {}\n", self.new_subjects.join(", ")));
        }
        if !self.removed_subjects.is_empty() {
            md.push_str(&format!(
                "Removed subjects: {}\n",
                self.removed_subjects.join(", ")
            ));
        }

        md
    }

    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::PredictionMethod;

    fn prediction(code: &str, probability: f64, risk: RiskLevel) -> SubjectPrediction {
        SubjectPrediction {
            subject_code: code.into(),
            subject_name: code.into(),
            risk_level: risk,
            predicted_success_probability: probability,
            weighted_prereq_gpa: 0.0,
            prereq_performance: vec![],
            missing_prereqs: vec![],
            recommendation: String::new(),
            cohort_pass_rate: None,
            cohort_avg_score: None,
            classifier_probability: None,
            classifier_confidence: None,
            classifier_top_factors: vec![],
            prediction_method: PredictionMethod::RuleBased,
        }
    }

    fn make_report(predictions: Vec<SubjectPrediction>, gpa: f64) -> AdvisingReport {
        AdvisingReport::new(StudentPredictionReport {
            student_id: "1001".into(),
            current_gpa: gpa,
            recommended_order: predictions.iter().map(|p| p.subject_code.clone()).collect(),
            high_risk_subjects: vec![],
            predictions,
        })
    }

    #[test]
    fn compare_identical_reports() {
        let report = make_report(vec![prediction("CSC2103", 0.8, RiskLevel::Low)], 3.0);
        let drift = report.compare(&report, 0.05);
        assert_eq!(drift.unchanged, 1);
        assert!(!drift.has_declines());
        assert_eq!(drift.gpa_delta, 0.0);
    }

    #[test]
    fn compare_with_decline_and_gain() {
        let baseline = make_report(
            vec![
                prediction("CSC2103", 0.8, RiskLevel::Low),
                prediction("PRG2104", 0.5, RiskLevel::High),
            ],
            3.0,
        );
        let current = make_report(
            vec![
                prediction("CSC2103", 0.6, RiskLevel::Medium),
                prediction("PRG2104", 0.7, RiskLevel::Medium),
            ],
            2.8,
        );
        let drift = current.compare(&baseline, 0.05);
        assert_eq!(drift.declines.len(), 1);
        assert_eq!(drift.declines[0].subject_code, "CSC2103");
        assert_eq!(drift.gains.len(), 1);
        assert!((drift.gpa_delta + 0.2).abs() < 1e-9);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![prediction("OLD1000", 0.5, RiskLevel::High)], 2.0);
        let current = make_report(vec![prediction("NEW1000", 0.5, RiskLevel::High)], 2.0);
        let drift = current.compare(&baseline, 0.05);
        assert_eq!(drift.new_subjects, vec!["NEW1000"]);
        assert_eq!(drift.removed_subjects, vec!["OLD1000"]);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![prediction("CSC2103", 0.8, RiskLevel::Low)], 3.0)
            .with_classifier(Some("logistic"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("advising.json");
        report.save_json(&path).unwrap();
        let loaded = AdvisingReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.classifier.as_deref(), Some("logistic"));
        assert_eq!(loaded.prediction, report.prediction);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![prediction("CSC2103", 0.8, RiskLevel::Low)], 3.0);
        let current = make_report(vec![prediction("CSC2103", 0.4, RiskLevel::VeryHigh)], 2.5);
        let md = current.compare(&baseline, 0.05).to_markdown();
        assert!(md.contains("### Declines"));
        assert!(md.contains("low -> very_high"));
        assert!(md.contains("1 declines"));
    }
}
