//! Student grade-history normalization.
//!
//! Stored histories come in several shapes: structured entries, JSON array
//! strings, brace-map strings such as
//! `[{subjectCode=CSC1024, grade=A}, {subjectCode=PRG1203, grade=B+}]` and
//! plain delimiter strings such as `CSC1024:A,PRG1203`. [`parse_history`]
//! turns every shape into [`GradeRecord`]s and reports entries it cannot
//! read instead of failing the whole history.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::grades;

/// One normalized history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub subject_code: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    /// Upper-cased letter grade, absent when not recorded.
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub overall_percentage: Option<f64>,
    #[serde(default)]
    pub coursework_percentage: Option<f64>,
    #[serde(default)]
    pub exam_year: Option<i32>,
    #[serde(default)]
    pub exam_month: Option<u32>,
}

impl GradeRecord {
    pub fn new(code: &str, grade: Option<&str>) -> Self {
        Self {
            subject_code: code.to_string(),
            subject_name: None,
            grade: grade.map(|g| g.trim().to_uppercase()),
            overall_percentage: None,
            coursework_percentage: None,
            exam_year: None,
            exam_month: None,
        }
    }

    /// Grade points, `None` for ungraded or missing grades.
    pub fn grade_points(&self) -> Option<f64> {
        self.grade.as_deref().and_then(grades::grade_points)
    }

    pub fn is_failing(&self) -> bool {
        self.grade.as_deref().map(grades::is_failing).unwrap_or(false)
    }

    fn exam_order(&self) -> (i32, u32) {
        (self.exam_year.unwrap_or(0), self.exam_month.unwrap_or(0))
    }
}

/// A raw history as handed over by the history source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHistory {
    /// Already structured key/value entries.
    Entries(Vec<Map<String, Value>>),
    /// Any of the encoded string forms.
    Encoded(String),
}

/// An entry that could not be turned into a [`GradeRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnparsableEntry {
    pub raw: String,
    pub reason: String,
}

/// Outcome of parsing a single entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEntry {
    Parsed(GradeRecord),
    Unparsable(UnparsableEntry),
}

impl ParsedEntry {
    fn unparsable(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ParsedEntry::Unparsable(UnparsableEntry {
            raw: raw.into(),
            reason: reason.into(),
        })
    }
}

/// All entries of a history, split into readable and unreadable ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedHistory {
    pub records: Vec<GradeRecord>,
    pub unparsable: Vec<UnparsableEntry>,
}

impl FromIterator<ParsedEntry> for ParsedHistory {
    fn from_iter<I: IntoIterator<Item = ParsedEntry>>(iter: I) -> Self {
        let mut history = ParsedHistory::default();
        for entry in iter {
            match entry {
                ParsedEntry::Parsed(record) => history.records.push(record),
                ParsedEntry::Unparsable(bad) => history.unparsable.push(bad),
            }
        }
        history
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Code,
    Name,
    Grade,
    Overall,
    Coursework,
    Year,
    Month,
}

/// Canonical (lower-case, underscore-free) aliases per field, in priority order.
const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Code, &["subjectcode", "code", "subcode"]),
    (Field::Name, &["subjectname", "name"]),
    (Field::Grade, &["grade", "result", "finalgrade"]),
    (Field::Overall, &["overallpercentage", "overall", "percentage"]),
    (
        Field::Coursework,
        &["courseworkpercentage", "coursework", "courseworkrate"],
    ),
    (Field::Year, &["examyear", "year"]),
    (Field::Month, &["exammonth", "month"]),
];

fn canonical_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "")
}

fn aliases(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Fields of one entry keyed by canonical name.
struct Fields(HashMap<String, Value>);

impl Fields {
    fn from_map(map: &Map<String, Value>) -> Self {
        Fields(
            map.iter()
                .map(|(k, v)| (canonical_key(k), v.clone()))
                .collect(),
        )
    }

    fn lookup<T>(&self, field: Field, convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
        aliases(field)
            .iter()
            .filter_map(|alias| self.0.get(*alias))
            .find_map(convert)
    }

    fn text(&self, field: Field) -> Option<String> {
        self.lookup(field, value_text)
    }

    fn number(&self, field: Field) -> Option<f64> {
        self.lookup(field, value_number)
    }

    fn into_entry(self, raw: impl FnOnce() -> String) -> ParsedEntry {
        let Some(code) = self.text(Field::Code) else {
            return ParsedEntry::unparsable(raw(), "no subject code");
        };
        ParsedEntry::Parsed(GradeRecord {
            subject_code: code,
            subject_name: self.text(Field::Name),
            grade: self.text(Field::Grade).map(|g| g.to_uppercase()),
            overall_percentage: self.number(Field::Overall),
            coursework_percentage: self.number(Field::Coursework),
            exam_year: self
                .number(Field::Year)
                .filter(|y| y.fract() == 0.0)
                .map(|y| y as i32),
            exam_month: self
                .number(Field::Month)
                .filter(|m| m.fract() == 0.0 && (1.0..=12.0).contains(m))
                .map(|m| m as u32),
        })
    }
}

fn parse_object(map: &Map<String, Value>) -> ParsedEntry {
    Fields::from_map(map).into_entry(|| Value::Object(map.clone()).to_string())
}

fn parse_json_value(value: Value) -> Vec<ParsedEntry> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => parse_object(&map),
                other => ParsedEntry::unparsable(other.to_string(), "entry is not an object"),
            })
            .collect(),
        Value::Object(map) => vec![parse_object(&map)],
        other => vec![ParsedEntry::unparsable(
            other.to_string(),
            "history is not a list of entries",
        )],
    }
}

/// Parse `[{key=value, ...}, {...}]`.
fn parse_brace_maps(text: &str) -> Vec<ParsedEntry> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    let mut entries = Vec::new();
    let mut rest = inner;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            entries.push(ParsedEntry::unparsable(&rest[start..], "unterminated entry"));
            break;
        };
        let body = &rest[start + 1..start + len];
        entries.push(parse_brace_body(body));
        rest = &rest[start + len + 1..];
    }
    entries
}

fn parse_brace_body(body: &str) -> ParsedEntry {
    let mut map = Map::new();
    for pair in body.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
            }
            None => return ParsedEntry::unparsable(format!("{{{body}}}"), "field without '='"),
        }
    }
    Fields::from_map(&map).into_entry(|| format!("{{{body}}}"))
}

/// Parse `CODE:GRADE,CODE,...`.
fn parse_delimited(text: &str) -> Vec<ParsedEntry> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(':') {
            Some((code, grade)) => {
                let code = code.trim();
                if code.is_empty() {
                    ParsedEntry::unparsable(part, "empty subject code")
                } else {
                    let grade = grade.trim();
                    ParsedEntry::Parsed(GradeRecord::new(
                        code,
                        (!grade.is_empty()).then_some(grade),
                    ))
                }
            }
            None => ParsedEntry::Parsed(GradeRecord::new(part, None)),
        })
        .collect()
}

fn parse_encoded(text: &str) -> Vec<ParsedEntry> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Vec::new();
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => return parse_json_value(value),
            Err(e) if trimmed.contains('=') => {
                debug!(error = %e, "history is not JSON, reading as brace maps");
                return parse_brace_maps(trimmed);
            }
            Err(e) => {
                return vec![ParsedEntry::unparsable(
                    trimmed,
                    format!("malformed JSON history: {e}"),
                )]
            }
        }
    }
    parse_delimited(trimmed)
}

/// Normalize any supported history shape.
pub fn parse_history(raw: &RawHistory) -> ParsedHistory {
    let parsed: ParsedHistory = match raw {
        RawHistory::Entries(entries) => entries.iter().map(parse_object).collect(),
        RawHistory::Encoded(text) => parse_encoded(text).into_iter().collect(),
    };
    if !parsed.unparsable.is_empty() {
        debug!(
            parsed = parsed.records.len(),
            skipped = parsed.unparsable.len(),
            "history contained unparsable entries"
        );
    }
    parsed
}

/// A student's history indexed by subject code.
///
/// Later entries for a code replace earlier ones but keep the earlier
/// position.
#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    pub student_id: String,
    records: Vec<GradeRecord>,
    index: HashMap<String, usize>,
    pub unparsable: Vec<UnparsableEntry>,
}

impl StudentRecord {
    pub fn new(student_id: &str, history: ParsedHistory) -> Self {
        let mut record = StudentRecord {
            student_id: student_id.to_string(),
            records: Vec::new(),
            index: HashMap::new(),
            unparsable: history.unparsable,
        };
        for entry in history.records {
            match record.index.get(&entry.subject_code) {
                Some(&pos) => record.records[pos] = entry,
                None => {
                    record
                        .index
                        .insert(entry.subject_code.clone(), record.records.len());
                    record.records.push(entry);
                }
            }
        }
        record
    }

    pub fn from_raw(student_id: &str, raw: &RawHistory) -> Self {
        Self::new(student_id, parse_history(raw))
    }

    pub fn get(&self, code: &str) -> Option<&GradeRecord> {
        self.index.get(code).map(|&i| &self.records[i])
    }

    /// Deduplicated records in first-appearance order.
    pub fn records(&self) -> &[GradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by exam year and month; undated entries sort first.
    pub fn chronological(&self) -> Vec<&GradeRecord> {
        let mut sorted: Vec<&GradeRecord> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.exam_order());
        sorted
    }

    /// Mean grade points over graded subjects, 0.0 when none are graded.
    pub fn current_gpa(&self) -> f64 {
        let points: Vec<f64> = self.records.iter().filter_map(|r| r.grade_points()).collect();
        grades::mean(&points).unwrap_or(0.0)
    }

    /// Codes of subjects not recorded with a failing grade.
    pub fn completed_codes(&self) -> HashSet<String> {
        self.records
            .iter()
            .filter(|r| !r.is_failing())
            .map(|r| r.subject_code.clone())
            .collect()
    }
}
