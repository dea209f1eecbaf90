//! Classifier error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or running a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model file does not exist.
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The model metadata is inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The model references a feature the feature vector does not provide.
    #[error("unknown feature column: {0}")]
    UnknownFeature(String),

    /// Coefficient and feature column counts differ.
    #[error("feature mismatch: {columns} columns but {coefficients} coefficients")]
    FeatureMismatch { columns: usize, coefficients: usize },
}
