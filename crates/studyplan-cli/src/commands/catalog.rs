//! The `studyplan variants`, `courses` and `electives` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studyplan_core::planner::CatalogService;

use super::{load_config, print_json, resolve_variant};

pub fn variants(format: String) -> Result<()> {
    let variants = CatalogService::new().list_variants();

    if format == "json" {
        return print_json(&variants);
    }

    let mut table = Table::new();
    table.set_header(vec!["Variant", "Programme", "Intake", "Entry"]);
    for v in &variants {
        table.add_row(vec![
            Cell::new(&v.key),
            Cell::new(&v.programme_code),
            Cell::new(&v.intake_code),
            Cell::new(v.entry_type),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn courses(config_path: Option<PathBuf>, variant: Option<String>, format: String) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let key = resolve_variant(&config, variant);
    let courses = CatalogService::new().get_variant_courses(&key)?;

    if format == "json" {
        return print_json(&courses);
    }

    let mut table = Table::new();
    table.set_header(vec!["Code", "Name", "Credits", "Semester", "Category", "Prerequisites"]);
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
            Cell::new(c.category),
            Cell::new(c.prerequisites.join(", ")),
        ]);
    }
    println!("{key}: {} courses", courses.len());
    println!("{table}");
    Ok(())
}

pub fn electives(config_path: Option<PathBuf>, variant: Option<String>, format: String) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let key = resolve_variant(&config, variant);
    let groups = CatalogService::new().get_variant_electives(&key)?;

    if format == "json" {
        return print_json(&groups);
    }

    let mut table = Table::new();
    table.set_header(vec!["Group", "Year", "Code", "Name", "Credits"]);
    for group in &groups {
        for option in &group.options {
            table.add_row(vec![
                Cell::new(&group.group_code),
                Cell::new(
                    group
                        .year_level
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "-".into()),
                ),
                Cell::new(&option.subject_code),
                Cell::new(&option.subject_name),
                Cell::new(option.credit),
            ]);
        }
    }
    println!("{key}: {} elective groups", groups.len());
    println!("{table}");
    Ok(())
}
