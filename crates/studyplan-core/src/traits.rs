//! Classifier seam used by the prediction service.
//!
//! Implemented by the adapters in `studyplan-classifier`.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::prediction::RiskLevel;

/// A pass/fail classifier scoring one (student, subject) pair at a time.
pub trait Classifier: Send + Sync {
    /// Human-readable adapter name (e.g. "logistic").
    fn name(&self) -> &str;

    /// Score a single feature vector.
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<ClassifierOutput>;

    /// Score several vectors. Must equal per-item [`Classifier::predict`]
    /// calls in input order.
    fn predict_batch(&self, features: &[FeatureVector]) -> anyhow::Result<Vec<ClassifierOutput>> {
        features.iter().map(|f| self.predict(f)).collect()
    }
}

/// One feature's contribution to a classifier decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    /// Feature column name.
    pub feature: String,
    /// Human-readable label.
    pub display_name: String,
    pub value: f64,
    pub importance: f64,
    /// `|value| * importance`.
    pub impact: f64,
}

/// Classifier result for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    /// Probability of passing, in [0, 1].
    pub probability: f64,
    /// Distance from an undecided 0.5, scaled to [0, 1].
    pub confidence: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub top_factors: Vec<TopFactor>,
}

impl ClassifierOutput {
    /// Derive confidence and band from a raw probability.
    pub fn from_probability(probability: f64, top_factors: Vec<TopFactor>) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        Self {
            probability,
            confidence: (probability - 0.5).abs() * 2.0,
            risk_level: RiskLevel::from_classifier_probability(probability),
            top_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_and_band() {
        let out = ClassifierOutput::from_probability(0.9, vec![]);
        assert!((out.confidence - 0.8).abs() < 1e-9);
        assert_eq!(out.risk_level, RiskLevel::Low);

        let undecided = ClassifierOutput::from_probability(0.5, vec![]);
        assert_eq!(undecided.confidence, 0.0);
        assert_eq!(undecided.risk_level, RiskLevel::High);

        let clamped = ClassifierOutput::from_probability(1.7, vec![]);
        assert_eq!(clamped.probability, 1.0);
        assert_eq!(clamped.confidence, 1.0);
    }
}
