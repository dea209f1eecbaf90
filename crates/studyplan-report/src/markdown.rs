//! Markdown advising report.

use std::path::Path;

use anyhow::{Context, Result};

use studyplan_core::prediction::SubjectPrediction;
use studyplan_core::progress::ProgressReport;
use studyplan_core::report::AdvisingReport;

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Escape pipes so free text does not break table rows.
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Render an advising report as markdown.
pub fn generate_markdown(report: &AdvisingReport) -> String {
    let prediction = &report.prediction;
    let mut md = String::new();

    md.push_str(&format!("# Advising report: {}\n\n", report.student_id()));
    md.push_str(&format!(
        "Current GPA: **{:.2}** | {} subjects | {}",
        prediction.current_gpa,
        prediction.predictions.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(classifier) = &report.classifier {
        md.push_str(&format!(" | classifier: {classifier}"));
    }
    md.push_str("\n\n");

    md.push_str("## Predictions\n\n");
    md.push_str("| Subject | Name | Risk | Success | Prereq GPA | Method |\n");
    md.push_str("|---------|------|------|---------|------------|--------|\n");
    for p in &prediction.predictions {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:.2} | {} |\n",
            p.subject_code,
            cell(&p.subject_name),
            p.risk_level,
            percent(p.predicted_success_probability),
            p.weighted_prereq_gpa,
            p.prediction_method
        ));
    }
    md.push('\n');

    if !prediction.high_risk_subjects.is_empty() {
        md.push_str(&format!(
            "**High risk:** {}\n\n",
            prediction.high_risk_subjects.join(", ")
        ));
    }

    if !prediction.recommended_order.is_empty() {
        md.push_str("## Recommended order\n\n");
        for (i, code) in prediction.recommended_order.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, code));
        }
        md.push('\n');
    }

    md.push_str("## Details\n\n");
    for p in &prediction.predictions {
        subject_section(&mut md, p);
    }

    if let (Some(variant), Some(progress)) = (&report.variant, &report.progress) {
        progress_section(&mut md, variant, progress);
    }

    md
}

fn subject_section(md: &mut String, p: &SubjectPrediction) {
    md.push_str(&format!("### {} {}\n\n", p.subject_code, p.subject_name));
    md.push_str(&format!("{}\n\n", p.recommendation));

    if let Some(pass_rate) = p.cohort_pass_rate {
        md.push_str(&format!("- Cohort pass rate: {}\n", percent(pass_rate)));
    }
    if let Some(avg) = p.cohort_avg_score {
        md.push_str(&format!("- Cohort average score: {avg:.1}\n"));
    }
    if let (Some(probability), Some(confidence)) =
        (p.classifier_probability, p.classifier_confidence)
    {
        md.push_str(&format!(
            "- Classifier: {} (confidence {:.2})\n",
            percent(probability),
            confidence
        ));
    }
    if !p.missing_prereqs.is_empty() {
        md.push_str(&format!(
            "- Missing prerequisites: {}\n",
            p.missing_prereqs.join(", ")
        ));
    }

    if !p.prereq_performance.is_empty() {
        md.push_str("\n| Prerequisite | Grade | Points | Weight | Impact |\n");
        md.push_str("|--------------|-------|--------|--------|--------|\n");
        for perf in &p.prereq_performance {
            md.push_str(&format!(
                "| {} {} | {} | {:.2} | {:.2} | {:.2} |\n",
                perf.prereq_code,
                cell(&perf.prereq_name),
                perf.grade,
                perf.grade_points,
                perf.weight,
                perf.impact
            ));
        }
    }

    if !p.classifier_top_factors.is_empty() {
        md.push_str("\nTop factors:\n");
        for factor in &p.classifier_top_factors {
            md.push_str(&format!(
                "- {}: {:.2} (impact {:.3})\n",
                factor.display_name, factor.value, factor.impact
            ));
        }
    }
    md.push('\n');
}

fn progress_section(md: &mut String, variant: &str, progress: &ProgressReport) {
    md.push_str(&format!("## Progress ({variant})\n\n"));
    md.push_str(&format!(
        "{} of {} credits ({:.2}%), {} outstanding\n\n",
        progress.completed_credits,
        progress.total_credits,
        progress.percent_complete,
        progress.outstanding_credits
    ));
    let list = |label: &str, codes: &[String]| -> String {
        if codes.is_empty() {
            String::new()
        } else {
            format!("- {label}: {}\n", codes.join(", "))
        }
    };
    md.push_str(&list("Core remaining", &progress.core_remaining));
    md.push_str(&list(
        "Discipline electives remaining",
        &progress.discipline_elective_placeholders_remaining,
    ));
    md.push_str(&list(
        "Free electives remaining",
        &progress.free_elective_placeholders_remaining,
    ));
    for [first, second] in &progress.either_pairs_remaining {
        md.push_str(&format!("- Either {first} or {second}\n"));
    }
}

/// Write a markdown report to a file.
pub fn write_markdown_report(report: &AdvisingReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn markdown_lists_predictions_and_order() {
        let md = generate_markdown(&sample_report());
        assert!(md.starts_with("# Advising report: 1001"));
        assert!(md.contains("| PRG2104 | Object-Oriented Programming | low | 85.0% |"));
        assert!(md.contains("**High risk:** CSC2103"));
        assert!(md.contains("1. PRG2104\n2. CSC2103\n"));
        assert!(md.contains("Missing prerequisites: CSC1024"));
        assert!(md.contains("classifier: logistic"));
    }

    #[test]
    fn markdown_includes_progress_when_present() {
        let md = generate_markdown(&sample_report());
        assert!(md.contains("## Progress (202301-normal)"));
        assert!(md.contains("- Either MPU3193 or MPU3203"));
    }

    #[test]
    fn pipes_in_names_are_escaped() {
        let mut report = sample_report();
        report.prediction.predictions[0].subject_name = "A|B".into();
        assert!(generate_markdown(&report).contains("A\\|B"));
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("1001.md");
        write_markdown_report(&sample_report(), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("## Details"));
    }
}
