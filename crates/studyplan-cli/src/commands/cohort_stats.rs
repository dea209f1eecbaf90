//! The `studyplan cohort-stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyplan_core::statistics::SubjectCohortStats;

use super::{load_config, prediction_service, print_json, require_dataset};

fn optional(value: Option<f64>, scale: f64, suffix: &str) -> String {
    value
        .map(|v| format!("{:.1}{suffix}", v * scale))
        .unwrap_or_else(|| "-".into())
}

pub fn execute(
    config_path: Option<PathBuf>,
    subject: Option<String>,
    dataset: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let dataset = require_dataset(&config, dataset)?;
    let service = prediction_service(&config, Some(dataset));

    let stats: Vec<SubjectCohortStats> = match &subject {
        Some(code) => vec![service.get_cohort_stats(code)?],
        None => service.all_cohort_stats().iter().cloned().collect(),
    };

    if format == "json" {
        return print_json(&stats);
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Name", "Students", "Pass rate", "Avg score", "Avg GPA"]);
    for s in &stats {
        table.add_row(vec![
            Cell::new(&s.subject_code),
            Cell::new(&s.subject_name),
            Cell::new(s.total_students),
            Cell::new(optional(s.pass_rate, 100.0, "%")),
            Cell::new(optional(s.avg_score, 1.0, "")),
            Cell::new(
                s.avg_gpa
                    .map(|g| format!("{g:.2}"))
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}
