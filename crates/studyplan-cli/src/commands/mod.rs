pub mod catalog;
pub mod chain;
pub mod cohort_stats;
pub mod init;
pub mod predict;
pub mod progress;
pub mod recommend;
pub mod what_if;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use studyplan_classifier::{create_classifier, StudyplanConfig};
use studyplan_core::cache::BoundedCache;
use studyplan_core::dataset::HistoricalDataset;
use studyplan_core::history::RawHistory;
use studyplan_core::prediction::SubjectPredictionService;

pub fn load_config(path: Option<&Path>) -> Result<StudyplanConfig> {
    studyplan_classifier::config::load_config_from(path)
}

/// Split a comma-separated code list, dropping blanks.
pub fn parse_codes(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn completed_set(list: &str) -> HashSet<String> {
    parse_codes(list).into_iter().collect()
}

pub fn resolve_variant(config: &StudyplanConfig, variant: Option<String>) -> String {
    variant.unwrap_or_else(|| config.default_variant.clone())
}

/// The dataset named on the command line, else the configured one.
pub fn load_dataset(
    config: &StudyplanConfig,
    dataset: Option<PathBuf>,
) -> Result<Option<Arc<HistoricalDataset>>> {
    let Some(path) = dataset.or_else(|| config.dataset.clone()) else {
        return Ok(None);
    };
    let dataset = HistoricalDataset::load_csv(&path)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        students = dataset.student_count(),
        skipped = dataset.skipped().len(),
        "loaded historical dataset"
    );
    Ok(Some(Arc::new(dataset)))
}

pub fn require_dataset(
    config: &StudyplanConfig,
    dataset: Option<PathBuf>,
) -> Result<Arc<HistoricalDataset>> {
    load_dataset(config, dataset)?.ok_or_else(|| {
        anyhow::anyhow!("no historical dataset configured; pass --dataset or set STUDYPLAN_DATASET")
    })
}

/// Prediction service over `dataset`, with the configured classifier when
/// one can be loaded.
pub fn prediction_service(
    config: &StudyplanConfig,
    dataset: Option<Arc<HistoricalDataset>>,
) -> SubjectPredictionService {
    let service = match dataset {
        Some(dataset) => SubjectPredictionService::from_dataset(dataset),
        None => SubjectPredictionService::new(Arc::new(
            std::collections::HashMap::<String, RawHistory>::new(),
        )),
    }
    .with_profile_cache(BoundedCache::new(config.profile_cache_size));

    match &config.classifier {
        Some(classifier_config) => match create_classifier(classifier_config) {
            Ok(classifier) => service.with_classifier(classifier),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(%error, "classifier unavailable, using rule-based predictions");
                service
            }
        },
        None => service,
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codes_trims_and_skips_blanks() {
        assert_eq!(parse_codes(" CSC1024, ,PRG1203,"), vec!["CSC1024", "PRG1203"]);
        assert!(parse_codes("").is_empty());
    }

    #[test]
    fn variant_defaults_to_config() {
        let config = StudyplanConfig::default();
        assert_eq!(resolve_variant(&config, None), "202301-normal");
        assert_eq!(
            resolve_variant(&config, Some("202304-direct".into())),
            "202304-direct"
        );
    }

    #[test]
    fn missing_dataset_is_none_unless_required() {
        let config = StudyplanConfig::default();
        assert!(load_dataset(&config, None).unwrap().is_none());
        assert!(require_dataset(&config, None).is_err());
    }
}
