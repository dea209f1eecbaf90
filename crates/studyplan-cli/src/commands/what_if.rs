//! The `studyplan what-if` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyplan_core::planner::CatalogService;
use studyplan_core::risk::StudentMetrics;

use super::{completed_set, load_config, parse_codes, print_json, resolve_variant};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config_path: Option<PathBuf>,
    variant: Option<String>,
    planned: String,
    completed: String,
    cgpa: f64,
    attendance: f64,
    gpa_trend: f64,
    format: String,
) -> Result<()> {
    anyhow::ensure!((0.0..=4.0).contains(&cgpa), "cgpa must be between 0.0 and 4.0");
    anyhow::ensure!(
        (0.0..=100.0).contains(&attendance),
        "attendance must be between 0 and 100"
    );

    let config = load_config(config_path.as_deref())?;
    let key = resolve_variant(&config, variant);
    let planned = parse_codes(&planned);
    anyhow::ensure!(!planned.is_empty(), "no planned subjects given");

    let metrics = StudentMetrics {
        cgpa,
        attendance,
        gpa_trend,
        ..Default::default()
    };
    let result = CatalogService::new().what_if(&key, &planned, &completed_set(&completed), &metrics)?;

    if format == "json" {
        return print_json(&result);
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Name", "Risk", "Score", "Prereqs done"]);
    for course in &result.per_course {
        table.add_row(vec![
            Cell::new(&course.subject_code),
            Cell::new(&course.subject_name),
            Cell::new(course.predicted_risk),
            Cell::new(format!("{:.3}", course.numeric_score)),
            Cell::new(format!("{:.0}%", course.factors.prereq_completed_ratio * 100.0)),
        ]);
    }
    println!("{table}");
    println!(
        "{} credits, aggregated score {:.3}: {} risk",
        result.total_credits, result.aggregated_risk_score, result.risk_band
    );
    Ok(())
}
