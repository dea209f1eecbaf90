//! The `studyplan chain` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{load_config, load_dataset, prediction_service, print_json};

pub fn execute(
    config_path: Option<PathBuf>,
    subject: String,
    dataset: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let dataset = load_dataset(&config, dataset)?;
    let chain = prediction_service(&config, dataset).get_prerequisite_chain(&subject)?;

    if format == "json" {
        return print_json(&chain);
    }

    println!("{} {}", chain.subject_code, chain.subject_name);
    if chain.direct_prerequisites.is_empty() {
        println!("  no prerequisites");
        return Ok(());
    }
    println!("Direct prerequisites:");
    for p in &chain.direct_prerequisites {
        println!("  {} {} (weight {:.2})", p.code, p.name, p.weight);
    }
    println!("Full chain:");
    for entry in &chain.full_chain {
        println!(
            "  {}{} {}",
            "  ".repeat(entry.depth.saturating_sub(1)),
            entry.code,
            entry.name
        );
    }
    Ok(())
}
