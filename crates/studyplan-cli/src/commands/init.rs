//! The `studyplan init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("studyplan.toml").exists() {
        println!("studyplan.toml already exists, skipping.");
    } else {
        std::fs::write("studyplan.toml", SAMPLE_CONFIG)?;
        println!("Created studyplan.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point `dataset` in studyplan.toml at your grade history CSV");
    println!("  2. Run: studyplan progress --completed CSC1024,PRG1203");
    println!("  3. Run: studyplan predict --student <ID> --subjects CSC2103,PRG2104");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyplan configuration

# Flattened grade history: student_id, subject_code, subject_name, grade,
# overall_percentage, coursework_percentage, exam_year, exam_month
dataset = "${HOME}/studyplan/history.csv"

default_variant = "202301-normal"
output_dir = "./studyplan-reports"
profile_cache_size = 500
drift_threshold = 0.05

# Optional classifier fused with the rule-based estimate.
# [classifier]
# type = "logistic"
# model_path = "models/pass_fail.json"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_classifier::StudyplanConfig;

    #[test]
    fn sample_config_parses() {
        let config: StudyplanConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_variant, "202301-normal");
        assert!(config.classifier.is_none());
    }
}
