//! studyplan-classifier: pass/fail classifier adapters.
//!
//! Implements the `Classifier` trait for an exported logistic model and a
//! fixed-score mock, and loads the studyplan configuration that selects
//! between them.

pub mod config;
pub mod error;
pub mod logistic;
pub mod mock;

pub use config::{create_classifier, load_config, ClassifierConfig, StudyplanConfig};
pub use error::ClassifierError;
pub use logistic::{LogisticClassifier, LogisticModel};
pub use mock::FixedClassifier;
