//! studyplan-core: curriculum progress and subject success prediction.
//!
//! This crate defines the curriculum model, the progress and what-if risk
//! engines, grade-history parsing, the weighted prerequisite graph, cohort
//! statistics and the prediction service that the rest of studyplan builds on.

pub mod cache;
pub mod catalog;
pub mod dataset;
pub mod error;
pub mod features;
pub mod grades;
pub mod history;
pub mod model;
pub mod planner;
pub mod prediction;
pub mod prereq;
pub mod progress;
pub mod report;
pub mod risk;
pub mod statistics;
pub mod traits;

pub use error::{PlannerError, Result};
