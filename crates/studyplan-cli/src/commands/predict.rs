//! The `studyplan predict` command.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyplan_core::planner::CatalogService;
use studyplan_core::report::{AdvisingReport, DriftReport};
use studyplan_report::html::{generate_html, write_html_report};
use studyplan_report::markdown::{generate_markdown, write_markdown_report};

use super::progress::print_progress;
use super::{load_config, parse_codes, prediction_service, require_dataset};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config_path: Option<PathBuf>,
    student: String,
    subjects: String,
    dataset: Option<PathBuf>,
    variant: Option<String>,
    baseline: Option<PathBuf>,
    format: String,
    output: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let codes = parse_codes(&subjects);
    anyhow::ensure!(!codes.is_empty(), "no subjects given");

    let config = load_config(config_path.as_deref())?;
    let dataset = require_dataset(&config, dataset)?;
    let service = prediction_service(&config, Some(dataset));

    let prediction = service.predict_subjects(&student, &codes)?;
    let mut report = AdvisingReport::new(prediction).with_classifier(service.classifier_name());

    if let Some(key) = &variant {
        let completed = service.profile(&student)?.record.completed_codes();
        let progress = CatalogService::new().compute_progress(key, &completed)?;
        report = report.with_progress(key, progress);
    }

    let drift = match &baseline {
        Some(path) => {
            let baseline = AdvisingReport::load_json(path)?;
            Some(report.compare(&baseline, config.drift_threshold))
        }
        None => None,
    };

    if save {
        let path = saved_report_path(&config.output_dir, &student, &report.id.to_string())?;
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    match (format.as_str(), &output) {
        ("text", None) => {
            print_text(&report);
            if let Some(drift) = &drift {
                println!("\n{}", drift.to_markdown());
            }
            return Ok(());
        }
        ("text", Some(_)) => {
            anyhow::bail!("--output needs --format json, markdown or html");
        }
        ("json", Some(path)) => report.save_json(path)?,
        ("json", None) => println!("{}", serde_json::to_string_pretty(&report)?),
        ("markdown" | "md", Some(path)) => write_markdown_report(&report, path)?,
        ("markdown" | "md", None) => println!("{}", generate_markdown(&report)),
        ("html", Some(path)) => write_html_report(&report, path)?,
        ("html", None) => println!("{}", generate_html(&report)),
        (other, _) => anyhow::bail!("unknown format: {other}"),
    }

    if let Some(path) = &output {
        eprintln!("Report saved to: {}", path.display());
    }
    if let Some(drift) = &drift {
        print_drift_summary(drift);
    }
    Ok(())
}

/// `<output_dir>/<student>/<id>.json`. The student id must be a single
/// plain path component.
fn saved_report_path(output_dir: &Path, student: &str, id: &str) -> Result<PathBuf> {
    let mut components = Path::new(student).components();
    let plain = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !student.contains(['/', '\\']);
    anyhow::ensure!(plain, "student id {student:?} cannot be used as a directory name");
    Ok(output_dir.join(student).join(format!("{id}.json")))
}

fn print_text(report: &AdvisingReport) {
    let prediction = &report.prediction;
    println!(
        "Student {}: GPA {:.2}{}",
        prediction.student_id,
        prediction.current_gpa,
        report
            .classifier
            .as_deref()
            .map(|c| format!(" (classifier: {c})"))
            .unwrap_or_default()
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Code",
        "Name",
        "Risk",
        "Success",
        "Prereq GPA",
        "Method",
        "Missing",
    ]);
    for p in &prediction.predictions {
        table.add_row(vec![
            Cell::new(&p.subject_code),
            Cell::new(&p.subject_name),
            Cell::new(p.risk_level),
            Cell::new(format!("{:.1}%", p.predicted_success_probability * 100.0)),
            Cell::new(format!("{:.2}", p.weighted_prereq_gpa)),
            Cell::new(p.prediction_method),
            Cell::new(p.missing_prereqs.join(", ")),
        ]);
    }
    println!("{table}");

    if !prediction.high_risk_subjects.is_empty() {
        println!("High risk: {}", prediction.high_risk_subjects.join(", "));
    }
    println!("Recommended order: {}", prediction.recommended_order.join(" -> "));
    println!();
    for p in &prediction.predictions {
        println!("{}: {}", p.subject_code, p.recommendation);
    }

    if let (Some(key), Some(progress)) = (&report.variant, &report.progress) {
        println!();
        print_progress(key, progress);
    }
}

/// Summary of declines, on stderr.
fn print_drift_summary(drift: &DriftReport) {
    eprintln!(
        "Compared with baseline: {} declines, {} gains, {} unchanged",
        drift.declines.len(),
        drift.gains.len(),
        drift.unchanged
    );
    for d in &drift.declines {
        eprintln!(
            "  {} {:.1}% -> {:.1}% ({:+.1}%)",
            d.subject_code,
            d.baseline_probability * 100.0,
            d.current_probability * 100.0,
            d.delta * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_reports_stay_under_output_dir() {
        let dir = Path::new("reports");
        assert_eq!(
            saved_report_path(dir, "1001", "abc").unwrap(),
            Path::new("reports/1001/abc.json")
        );
        for student in ["../../x", "..", ".", "a/b", "a\\b", "/etc", ""] {
            assert!(saved_report_path(dir, student, "abc").is_err(), "{student}");
        }
    }
}
