//! Logistic-regression classifier loaded from exported model metadata.
//!
//! The model file is JSON:
//!
//! ```json
//! {
//!   "feature_columns": ["current_gpa", "weighted_prereq_gpa", "subject_code_encoded"],
//!   "coefficients": [0.9, 1.2, 0.0],
//!   "intercept": -3.1,
//!   "feature_importance": [{"feature": "current_gpa", "importance": 0.31}],
//!   "subject_encoding": {"CSC1024": 0, "PRG1203": 1}
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use studyplan_core::features::{display_name, FeatureVector, FEATURE_COLUMNS};
use studyplan_core::traits::{Classifier, ClassifierOutput, TopFactor};

use crate::error::ClassifierError;

/// Column filled from the subject label encoding.
pub const SUBJECT_CODE_COLUMN: &str = "subject_code_encoded";

/// Encoding used for subjects missing from the label encoding.
pub const UNKNOWN_SUBJECT_CODE: f64 = -1.0;

const TOP_FACTOR_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Exported model metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_columns: Vec<String>,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
    #[serde(default)]
    pub subject_encoding: HashMap<String, i64>,
}

/// Pass probability = sigmoid(intercept + Σ coefficient · feature).
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    model: LogisticModel,
    importance: HashMap<String, f64>,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticClassifier {
    pub fn from_model(model: LogisticModel) -> Result<Self, ClassifierError> {
        if model.feature_columns.len() != model.coefficients.len() {
            return Err(ClassifierError::FeatureMismatch {
                columns: model.feature_columns.len(),
                coefficients: model.coefficients.len(),
            });
        }
        if model.feature_columns.is_empty() {
            return Err(ClassifierError::InvalidModel("no feature columns".into()));
        }
        if let Some(unknown) = model
            .feature_columns
            .iter()
            .find(|c| !FEATURE_COLUMNS.contains(&c.as_str()))
        {
            return Err(ClassifierError::UnknownFeature(unknown.clone()));
        }
        if model
            .coefficients
            .iter()
            .chain(std::iter::once(&model.intercept))
            .any(|c| !c.is_finite())
        {
            return Err(ClassifierError::InvalidModel(
                "non-finite coefficient".into(),
            ));
        }

        let importance = model
            .feature_importance
            .iter()
            .map(|f| (f.feature.clone(), f.importance))
            .collect();
        Ok(Self { model, importance })
    }

    /// Load model metadata from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(ClassifierError::ModelNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model {}", path.display()))?;
        let model: LogisticModel = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse model {}", path.display()))?;
        let classifier = Self::from_model(model)
            .with_context(|| format!("invalid model {}", path.display()))?;
        debug!(
            path = %path.display(),
            features = classifier.model.feature_columns.len(),
            "loaded logistic model"
        );
        Ok(classifier)
    }

    fn feature_value(&self, features: &FeatureVector, column: &str) -> f64 {
        if column == SUBJECT_CODE_COLUMN {
            return self
                .model
                .subject_encoding
                .get(&features.subject_code)
                .map(|&code| code as f64)
                .unwrap_or(UNKNOWN_SUBJECT_CODE);
        }
        features.value(column).unwrap_or(0.0)
    }

    fn top_factors(&self, values: &[(&str, f64)]) -> Vec<TopFactor> {
        let mut factors: Vec<TopFactor> = values
            .iter()
            .map(|(column, value)| {
                let importance = self.importance.get(*column).copied().unwrap_or(0.0);
                TopFactor {
                    feature: column.to_string(),
                    display_name: display_name(column),
                    value: *value,
                    importance,
                    impact: value.abs() * importance,
                }
            })
            .collect();
        factors.sort_by(|a, b| b.impact.total_cmp(&a.impact));
        factors.truncate(TOP_FACTOR_COUNT);
        factors
    }
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        "logistic"
    }

    fn predict(&self, features: &FeatureVector) -> anyhow::Result<ClassifierOutput> {
        let values: Vec<(&str, f64)> = self
            .model
            .feature_columns
            .iter()
            .map(|c| (c.as_str(), self.feature_value(features, c)))
            .collect();
        let z = self.model.intercept
            + values
                .iter()
                .zip(&self.model.coefficients)
                .map(|((_, v), coef)| v * coef)
                .sum::<f64>();
        Ok(ClassifierOutput::from_probability(
            sigmoid(z),
            self.top_factors(&values),
        ))
    }
}
