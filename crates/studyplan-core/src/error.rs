//! Planner error types.
//!
//! Every library operation in `studyplan-core` reports failures through
//! [`PlannerError`]. Callers can tell a hard lookup failure apart from a
//! degraded-data condition without string matching.

use thiserror::Error;

/// Errors produced by the catalog, progress, risk and prediction engines.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// An unknown variant key, subject code or student identifier.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Historical data, cohort statistics or a classifier could not be used.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A malformed history record, dataset row or graph edge.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PlannerError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        PlannerError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Returns `true` if the failure is fatal to the call that produced it.
    ///
    /// Lookup misses and malformed input abort the call. Unavailable data
    /// only ever degrades a prediction.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlannerError::DataUnavailable(_))
    }

    /// Returns `true` for a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlannerError::NotFound { .. })
    }
}

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = PlannerError::not_found("variant", "209901-normal");
        assert_eq!(err.to_string(), "variant not found: 209901-normal");
        assert!(err.is_fatal());
        assert!(err.is_not_found());
    }

    #[test]
    fn only_unavailable_data_is_recoverable() {
        let unavailable = PlannerError::DataUnavailable("no dataset".into());
        assert!(!unavailable.is_fatal());
        assert!(!unavailable.is_not_found());

        let invalid = PlannerError::InvalidInput("bad row".into());
        assert!(invalid.is_fatal());
        assert!(!invalid.is_not_found());
    }
}
