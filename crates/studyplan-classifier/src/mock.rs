//! Fixed-score classifier for testing and demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use studyplan_core::features::FeatureVector;
use studyplan_core::traits::{Classifier, ClassifierOutput};

/// A classifier that returns configured probabilities without a model.
///
/// Per-subject overrides take precedence over the default probability.
pub struct FixedClassifier {
    probability: f64,
    per_subject: HashMap<String, f64>,
    /// Number of single predictions made.
    call_count: AtomicU32,
}

impl FixedClassifier {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            per_subject: HashMap::new(),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn with_subject(mut self, subject_code: &str, probability: f64) -> Self {
        self.per_subject.insert(subject_code.to_string(), probability);
        self
    }

    /// Get the number of calls made to this classifier.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    fn predict(&self, features: &FeatureVector) -> anyhow::Result<ClassifierOutput> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let probability = self
            .per_subject
            .get(&features.subject_code)
            .copied()
            .unwrap_or(self.probability);
        Ok(ClassifierOutput::from_probability(probability, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use studyplan_core::features::{CohortFeatures, PrerequisiteFeatures, StudentFeatures};
    use studyplan_core::history::RawHistory;
    use studyplan_core::prediction::{PredictionMethod, RiskLevel, SubjectPredictionService};

    fn vector(code: &str) -> FeatureVector {
        FeatureVector {
            subject_code: code.into(),
            student: StudentFeatures::default(),
            prerequisites: PrerequisiteFeatures::default(),
            cohort: CohortFeatures::default(),
        }
    }

    #[test]
    fn fixed_and_overridden_probabilities() {
        let classifier = FixedClassifier::new(0.9).with_subject("CSC2103", 0.3);
        assert_eq!(classifier.predict(&vector("PRG2104")).unwrap().probability, 0.9);
        let hard = classifier.predict(&vector("CSC2103")).unwrap();
        assert_eq!(hard.risk_level, RiskLevel::VeryHigh);
        assert_eq!(classifier.call_count(), 2);
    }

    #[test]
    fn batch_counts_every_item() {
        let classifier = FixedClassifier::new(0.7);
        let out = classifier
            .predict_batch(&[vector("A"), vector("B"), vector("C")])
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(classifier.call_count(), 3);
    }

    #[test]
    fn drives_hybrid_predictions() {
        let mut histories = HashMap::new();
        histories.insert(
            "1001".to_string(),
            RawHistory::Encoded("CSC1024:B,PRG1203:B+".into()),
        );
        let classifier = Arc::new(FixedClassifier::new(0.9));
        let service = SubjectPredictionService::new(Arc::new(histories))
            .with_classifier(classifier.clone());
        let report = service
            .predict_subjects("1001", &["PRG2104".to_string(), "CSC2103".to_string()])
            .unwrap();
        assert!(report
            .predictions
            .iter()
            .all(|p| p.prediction_method == PredictionMethod::Hybrid));
        assert_eq!(classifier.call_count(), 2);
    }
}
