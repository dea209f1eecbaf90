//! studyplan configuration and classifier factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyplan_core::cache::DEFAULT_MAX_ENTRIES;
use studyplan_core::traits::Classifier;

use crate::logistic::LogisticClassifier;
use crate::mock::FixedClassifier;

/// Which classifier, if any, is fused with the rule-based estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassifierConfig {
    /// Exported logistic model metadata (JSON).
    Logistic { model_path: PathBuf },
    /// Constant pass probability, for demos and dry runs.
    Fixed { probability: f64 },
}

/// Top-level studyplan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyplanConfig {
    /// Flattened historical grade CSV.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
    /// Classifier used for hybrid predictions.
    #[serde(default)]
    pub classifier: Option<ClassifierConfig>,
    /// Variant used when a command is not given one.
    #[serde(default = "default_variant")]
    pub default_variant: String,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum number of cached student profiles.
    #[serde(default = "default_profile_cache_size")]
    pub profile_cache_size: usize,
    /// Probability change treated as drift when comparing reports.
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
}

fn default_variant() -> String {
    "202301-normal".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./studyplan-reports")
}
fn default_profile_cache_size() -> usize {
    DEFAULT_MAX_ENTRIES
}
fn default_drift_threshold() -> f64 {
    0.05
}

impl Default for StudyplanConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            classifier: None,
            default_variant: default_variant(),
            output_dir: default_output_dir(),
            profile_cache_size: default_profile_cache_size(),
            drift_threshold: default_drift_threshold(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_classifier_config(config: &ClassifierConfig) -> ClassifierConfig {
    match config {
        ClassifierConfig::Logistic { model_path } => ClassifierConfig::Logistic {
            model_path: resolve_path(model_path),
        },
        ClassifierConfig::Fixed { probability } => ClassifierConfig::Fixed {
            probability: *probability,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyplan.toml` in the current directory
/// 2. `~/.config/studyplan/config.toml`
///
/// Environment variable overrides: `STUDYPLAN_DATASET`, `STUDYPLAN_MODEL`.
pub fn load_config() -> Result<StudyplanConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyplanConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studyplan.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudyplanConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudyplanConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dataset) = std::env::var("STUDYPLAN_DATASET") {
        config.dataset = Some(PathBuf::from(dataset));
    }
    if let Ok(model) = std::env::var("STUDYPLAN_MODEL") {
        config.classifier = Some(ClassifierConfig::Logistic {
            model_path: PathBuf::from(model),
        });
    }

    config.dataset = config.dataset.as_deref().map(resolve_path);
    config.classifier = config.classifier.as_ref().map(resolve_classifier_config);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyplan"))
}

/// Create a classifier instance from its configuration.
pub fn create_classifier(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    match config {
        ClassifierConfig::Logistic { model_path } => {
            Ok(Arc::new(LogisticClassifier::load(model_path)?))
        }
        ClassifierConfig::Fixed { probability } => {
            if !(0.0..=1.0).contains(probability) {
                anyhow::bail!("fixed classifier probability must be within 0..=1, got {probability}");
            }
            Ok(Arc::new(FixedClassifier::new(*probability)))
        }
    }
}
