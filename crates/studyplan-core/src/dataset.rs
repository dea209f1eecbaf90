//! Flattened historical grade data and the history-source seam.
//!
//! The dataset is a CSV file with one row per (student, subject) attempt:
//!
//! ```text
//! student_id,subject_code,subject_name,grade,overall_percentage,coursework_percentage,exam_year,exam_month
//! 1001,CSC1024,Programming Principles,A,86.5,90,2023,1
//! ```
//!
//! Malformed rows are skipped and counted; a bad row never aborts a load.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::history::RawHistory;

/// Supplies a student's raw grade history.
pub trait HistorySource: Send + Sync {
    /// `None` when the student is unknown to the source.
    fn history(&self, student_id: &str) -> Option<RawHistory>;
}

impl HistorySource for HashMap<String, RawHistory> {
    fn history(&self, student_id: &str) -> Option<RawHistory> {
        self.get(student_id).cloned()
    }
}

/// One row of the flattened dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    pub student_id: String,
    pub subject_code: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub overall_percentage: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub coursework_percentage: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub exam_year: Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub exam_month: Option<u32>,
}

impl HistoricalRow {
    fn validate(self) -> std::result::Result<Self, PlannerError> {
        if self.student_id.trim().is_empty() {
            return Err(PlannerError::InvalidInput("empty student_id".into()));
        }
        if self.subject_code.trim().is_empty() {
            return Err(PlannerError::InvalidInput("empty subject_code".into()));
        }
        Ok(self)
    }

    fn to_entry(&self) -> Map<String, Value> {
        let value = json!({
            "subjectCode": self.subject_code,
            "subjectName": self.subject_name,
            "grade": self.grade,
            "overallPercentage": self.overall_percentage,
            "courseworkPercentage": self.coursework_percentage,
            "examYear": self.exam_year,
            "examMonth": self.exam_month,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// A row that was dropped during loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based data row number, excluding the header.
    pub row: usize,
    pub reason: String,
}

/// All historical rows, indexed by student.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    rows: Vec<HistoricalRow>,
    by_student: HashMap<String, Vec<usize>>,
    skipped: Vec<SkippedRow>,
}

impl HistoricalDataset {
    /// Load a dataset from a CSV file.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        let dataset = Self::from_reader(file)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        debug!(
            path = %path.display(),
            rows = dataset.len(),
            students = dataset.student_count(),
            "loaded historical dataset"
        );
        Ok(dataset)
    }

    /// Read CSV from any reader. Only a missing or unreadable header is an
    /// error; bad data rows are recorded in [`Self::skipped`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        reader.headers().context("dataset has no header row")?;

        let mut skipped = Vec::new();
        let mut rows = Vec::new();
        for (idx, result) in reader.deserialize::<HistoricalRow>().enumerate() {
            let parsed = result
                .map_err(|e| PlannerError::InvalidInput(e.to_string()))
                .and_then(HistoricalRow::validate);
            match parsed {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(row = idx + 1, error = %e, "skipping malformed dataset row");
                    skipped.push(SkippedRow {
                        row: idx + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut dataset = Self::from_rows(rows);
        dataset.skipped = skipped;
        Ok(dataset)
    }

    pub fn from_rows(rows: Vec<HistoricalRow>) -> Self {
        let mut by_student: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            by_student.entry(row.student_id.clone()).or_default().push(i);
        }
        Self {
            rows,
            by_student,
            skipped: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn student_count(&self) -> usize {
        self.by_student.len()
    }

    /// Student ids in ascending order.
    pub fn student_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_student.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn student_rows(&self, student_id: &str) -> impl Iterator<Item = &HistoricalRow> {
        self.by_student
            .get(student_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.rows[i])
    }
}

impl HistorySource for HistoricalDataset {
    fn history(&self, student_id: &str) -> Option<RawHistory> {
        let indices = self.by_student.get(student_id)?;
        Some(RawHistory::Entries(
            indices.iter().map(|&i| self.rows[i].to_entry()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StudentRecord;

    const CSV: &str = "\
student_id,subject_code,subject_name,grade,overall_percentage,coursework_percentage,exam_year,exam_month
1001,CSC1024,Programming Principles,A,86.5,90,2023,1
1001,PRG1203,Object-Oriented Programming Fundamentals,B+,71,,2023,4
1002,CSC1024,Programming Principles,F,31,40,2023,1
,CSC1024,Programming Principles,A,80,80,2023,1
1003,,Nameless,B,60,60,2023,1
1003,MTH1114,Computer Mathematics,C,n/a,55,2023,9
";

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let dataset = HistoricalDataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.skipped().len(), 2);
        assert_eq!(dataset.skipped()[0].row, 4);
        assert_eq!(dataset.student_ids(), vec!["1001", "1002", "1003"]);
    }

    #[test]
    fn unparseable_numbers_become_absent() {
        let dataset = HistoricalDataset::from_reader(CSV.as_bytes()).unwrap();
        let row = dataset.student_rows("1003").next().unwrap();
        assert_eq!(row.overall_percentage, None);
        assert_eq!(row.coursework_percentage, Some(55.0));
    }

    #[test]
    fn history_round_trips_into_student_record() {
        let dataset = HistoricalDataset::from_reader(CSV.as_bytes()).unwrap();
        let raw = dataset.history("1001").unwrap();
        let record = StudentRecord::from_raw("1001", &raw);
        assert_eq!(record.len(), 2);
        let prg = record.get("PRG1203").unwrap();
        assert_eq!(prg.grade.as_deref(), Some("B+"));
        assert_eq!(prg.coursework_percentage, None);
        assert_eq!(prg.exam_month, Some(4));
        assert!(record.unparsable.is_empty());
    }

    #[test]
    fn unknown_student_has_no_history() {
        let dataset = HistoricalDataset::from_reader(CSV.as_bytes()).unwrap();
        assert!(dataset.history("9999").is_none());
    }

    #[test]
    fn map_source() {
        let mut source = HashMap::new();
        source.insert("s1".to_string(), RawHistory::Encoded("CSC1024:A".into()));
        assert!(source.history("s1").is_some());
        assert!(source.history("s2").is_none());
    }

    #[test]
    fn load_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, CSV).unwrap();
        let dataset = HistoricalDataset::load_csv(&path).unwrap();
        assert_eq!(dataset.student_count(), 3);
        assert!(HistoricalDataset::load_csv(&dir.path().join("missing.csv")).is_err());
    }
}
