//! The `studyplan progress` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::planner::CatalogService;
use studyplan_core::progress::ProgressReport;

use super::{completed_set, load_config, prediction_service, print_json, require_dataset, resolve_variant};

pub fn execute(
    config_path: Option<PathBuf>,
    variant: Option<String>,
    completed: Option<String>,
    student: Option<String>,
    dataset: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let key = resolve_variant(&config, variant);

    let mut codes: HashSet<String> = completed.as_deref().map(completed_set).unwrap_or_default();
    if let Some(student) = &student {
        let dataset = require_dataset(&config, dataset)?;
        let service = prediction_service(&config, Some(dataset));
        codes.extend(service.profile(student)?.record.completed_codes());
    }

    let report = CatalogService::new().compute_progress(&key, &codes)?;

    if format == "json" {
        return print_json(&report);
    }
    print_progress(&key, &report);
    Ok(())
}

pub fn print_progress(key: &str, report: &ProgressReport) {
    println!(
        "{key}: {}/{} credits ({:.2}%), {} outstanding",
        report.completed_credits,
        report.total_credits,
        report.percent_complete,
        report.outstanding_credits
    );
    let section = |label: &str, codes: &[String]| {
        if !codes.is_empty() {
            println!("{label}: {}", codes.join(", "));
        }
    };
    section("Core remaining", &report.core_remaining);
    section(
        "Discipline electives remaining",
        &report.discipline_elective_placeholders_remaining,
    );
    section(
        "Free electives remaining",
        &report.free_elective_placeholders_remaining,
    );
    for [first, second] in &report.either_pairs_remaining {
        println!("Either {first} or {second}");
    }
    if report.is_complete() {
        println!("All requirements complete.");
    }
}
