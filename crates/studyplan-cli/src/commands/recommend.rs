//! The `studyplan recommend` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyplan_core::planner::CatalogService;

use super::{completed_set, load_config, print_json, resolve_variant};

pub fn execute(
    config_path: Option<PathBuf>,
    variant: Option<String>,
    completed: String,
    limit: usize,
    format: String,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let key = resolve_variant(&config, variant);
    let courses = CatalogService::new().recommend_courses(&key, &completed_set(&completed), limit)?;

    if format == "json" {
        return print_json(&courses);
    }

    if courses.is_empty() {
        println!("No courses available with completed prerequisites.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Name", "Credits", "Semester"]);
    for c in &courses {
        table.add_row(vec![
            Cell::new(&c.subject_code),
            Cell::new(&c.subject_name),
            Cell::new(c.credit),
            Cell::new(
                c.semester_offering
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}
