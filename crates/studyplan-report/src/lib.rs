//! studyplan-report: human-readable renderings of advising reports.

pub mod html;
pub mod markdown;
