//! HTML advising report.
//!
//! One static page per student: risk bands, the suggested study order, a
//! card per subject with its prerequisite breakdown, and the progress panel
//! when the report carries one. No scripts, no external assets.

use std::fmt::{self, Display, Write};
use std::path::Path;

use anyhow::{Context, Result};

use studyplan_core::prediction::{RiskLevel, SubjectPrediction};
use studyplan_core::progress::ProgressReport;
use studyplan_core::report::AdvisingReport;

/// Text escaped for element content and attribute values.
struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#x27;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

const BANDS: [RiskLevel; 5] = [
    RiskLevel::Low,
    RiskLevel::Medium,
    RiskLevel::High,
    RiskLevel::VeryHigh,
    RiskLevel::Unknown,
];

fn band_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Low risk",
        RiskLevel::Medium => "Medium risk",
        RiskLevel::High => "High risk",
        RiskLevel::VeryHigh => "Very high risk",
        RiskLevel::Unknown => "Not enough data",
    }
}

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Render an advising report as a standalone HTML page.
pub fn generate_html(report: &AdvisingReport) -> String {
    let mut page = String::new();
    // Writing into a String cannot fail.
    let _ = render_page(&mut page, report);
    page
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AdvisingReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, generate_html(report))
        .with_context(|| format!("failed to write report to {}", path.display()))
}

fn render_page(out: &mut String, report: &AdvisingReport) -> fmt::Result {
    let prediction = &report.prediction;
    let student = Escaped(report.student_id());

    writeln!(out, "<!DOCTYPE html>\n<html lang=\"en\">\n<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Advising report: {student}</title>")?;
    writeln!(out, "<style>{STYLE}</style>\n</head>\n<body>")?;

    writeln!(out, "<h1>Advising report: {student}</h1>")?;
    write!(
        out,
        "<p class=\"meta\">Current GPA {:.2} &middot; {}",
        prediction.current_gpa,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    match &report.classifier {
        Some(name) => writeln!(out, " &middot; classifier: {}</p>", Escaped(name))?,
        None => writeln!(out, " &middot; rule-based</p>")?,
    }

    render_bands(out, &prediction.predictions)?;

    if !prediction.recommended_order.is_empty() {
        writeln!(out, "<h2>Suggested study order</h2>\n<ol class=\"order\">")?;
        for code in &prediction.recommended_order {
            match prediction.predictions.iter().find(|p| &p.subject_code == code) {
                Some(p) => writeln!(
                    out,
                    "<li><b>{}</b> {} <span class=\"tag {}\">{}</span></li>",
                    Escaped(code),
                    Escaped(&p.subject_name),
                    p.risk_level,
                    pct(p.predicted_success_probability)
                )?,
                None => writeln!(out, "<li><b>{}</b></li>", Escaped(code))?,
            }
        }
        writeln!(out, "</ol>")?;
    }

    writeln!(out, "<h2>Subjects</h2>")?;
    for p in &prediction.predictions {
        render_subject(out, p)?;
    }

    if let (Some(variant), Some(progress)) = (&report.variant, &report.progress) {
        render_progress(out, variant, progress)?;
    }

    writeln!(out, "</body>\n</html>")
}

fn render_bands(out: &mut String, predictions: &[SubjectPrediction]) -> fmt::Result {
    writeln!(out, "<section class=\"bands\">")?;
    for level in BANDS {
        let codes: Vec<&str> = predictions
            .iter()
            .filter(|p| p.risk_level == level)
            .map(|p| p.subject_code.as_str())
            .collect();
        if codes.is_empty() {
            continue;
        }
        writeln!(
            out,
            "<div class=\"band {level}\"><strong>{}</strong> {}<br><small>{}</small></div>",
            codes.len(),
            band_label(level),
            Escaped(&codes.join(", "))
        )?;
    }
    writeln!(out, "</section>")
}

fn render_subject(out: &mut String, p: &SubjectPrediction) -> fmt::Result {
    writeln!(out, "<article class=\"subject {}\">", p.risk_level)?;
    writeln!(
        out,
        "<h3>{} &middot; {}</h3>",
        Escaped(&p.subject_code),
        Escaped(&p.subject_name)
    )?;
    writeln!(out, "<p>{}</p>", Escaped(&p.recommendation))?;

    writeln!(out, "<dl>")?;
    writeln!(
        out,
        "<dt>Success</dt><dd>{} ({})</dd>",
        pct(p.predicted_success_probability),
        p.prediction_method
    )?;
    writeln!(out, "<dt>Weighted prerequisite GPA</dt><dd>{:.2}</dd>", p.weighted_prereq_gpa)?;
    if let Some(rate) = p.cohort_pass_rate {
        write!(out, "<dt>Cohort pass rate</dt><dd>{}", pct(rate))?;
        if let Some(avg) = p.cohort_avg_score {
            write!(out, ", mean score {avg:.1}")?;
        }
        writeln!(out, "</dd>")?;
    }
    if let Some(probability) = p.classifier_probability {
        write!(out, "<dt>Classifier</dt><dd>{}", pct(probability))?;
        if let Some(confidence) = p.classifier_confidence {
            write!(out, ", confidence {}", pct(confidence))?;
        }
        writeln!(out, "</dd>")?;
    }
    writeln!(out, "</dl>")?;

    if !p.prereq_performance.is_empty() {
        writeln!(
            out,
            "<table class=\"prereqs\">\n<tr><th>Prerequisite</th><th>Grade</th><th>Points</th><th>Weight</th><th>Impact</th></tr>"
        )?;
        for perf in &p.prereq_performance {
            writeln!(
                out,
                "<tr><td>{} {}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
                Escaped(&perf.prereq_code),
                Escaped(&perf.prereq_name),
                Escaped(&perf.grade),
                perf.grade_points,
                perf.weight,
                perf.impact
            )?;
        }
        writeln!(out, "</table>")?;
    }
    if !p.missing_prereqs.is_empty() {
        writeln!(
            out,
            "<p class=\"missing\">Not yet taken: {}</p>",
            Escaped(&p.missing_prereqs.join(", "))
        )?;
    }
    if !p.classifier_top_factors.is_empty() {
        writeln!(out, "<p class=\"factors\">Top factors:</p>\n<ul>")?;
        for factor in &p.classifier_top_factors {
            writeln!(
                out,
                "<li>{} = {:.2} (impact {:.2})</li>",
                Escaped(&factor.display_name),
                factor.value,
                factor.impact
            )?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</article>")
}

fn render_progress(out: &mut String, variant: &str, progress: &ProgressReport) -> fmt::Result {
    writeln!(out, "<section class=\"progress\">")?;
    writeln!(out, "<h2>Progress: {}</h2>", Escaped(variant))?;
    writeln!(
        out,
        "<p><meter min=\"0\" max=\"100\" value=\"{:.2}\"></meter> {} of {} credits ({:.2}%), {} outstanding</p>",
        progress.percent_complete,
        progress.completed_credits,
        progress.total_credits,
        progress.percent_complete,
        progress.outstanding_credits
    )?;

    let pairs: Vec<String> = progress
        .either_pairs_remaining
        .iter()
        .map(|[a, b]| format!("{a} or {b}"))
        .collect();
    let rows = [
        ("Core remaining", &progress.core_remaining),
        (
            "Discipline electives open",
            &progress.discipline_elective_placeholders_remaining,
        ),
        ("Free electives open", &progress.free_elective_placeholders_remaining),
        ("Either-pairs open", &pairs),
    ];
    writeln!(out, "<dl>")?;
    for (label, codes) in rows {
        if !codes.is_empty() {
            writeln!(out, "<dt>{label}</dt><dd>{}</dd>", Escaped(&codes.join(", ")))?;
        }
    }
    writeln!(out, "</dl>\n</section>")
}

const STYLE: &str = "
body { font: 15px/1.5 system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
.meta { color: #666; }
.bands { display: flex; gap: .75rem; flex-wrap: wrap; }
.band { padding: .5rem 1rem; border-radius: 6px; }
.subject { border-left: 5px solid #bbb; padding: .25rem 1rem; margin: 1rem 0; }
.low { background: #e3f6e8; border-color: #2e9e55; }
.medium { background: #fdf5d6; border-color: #c99a06; }
.high, .very_high { background: #fbe4e4; border-color: #c53030; }
.tag { padding: 0 .4rem; border-radius: 4px; font-size: .85em; }
dl { display: grid; grid-template-columns: max-content 1fr; gap: .2rem 1rem; }
dt { font-weight: 600; }
dd { margin: 0; }
.prereqs { border-collapse: collapse; }
.prereqs td, .prereqs th { border-bottom: 1px solid #ddd; padding: .2rem .6rem; text-align: left; }
.missing { color: #c53030; }
meter { width: 16rem; }
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn groups_subjects_into_risk_bands() {
        let html = generate_html(&sample_report());
        assert!(html.contains("<div class=\"band low\"><strong>1</strong> Low risk<br><small>PRG2104</small>"));
        assert!(html.contains("<strong>1</strong> Very high risk<br><small>CSC2103</small>"));
        assert!(!html.contains("Medium risk"));
    }

    #[test]
    fn subject_cards_show_prerequisite_breakdown() {
        let html = generate_html(&sample_report());
        assert!(html.contains("<article class=\"subject very_high\">"));
        assert!(html.contains(
            "<td>PRG1203 Object-Oriented Programming Fundamentals</td><td>A-</td><td>3.67</td><td>0.90</td><td>3.30</td>"
        ));
        assert!(html.contains("Not yet taken: CSC1024"));
        assert!(html.contains("<dt>Cohort pass rate</dt><dd>82.0%, mean score 68.5</dd>"));
        assert!(html.contains("<li>Current GPA = 3.50 (impact 1.40)</li>"));
    }

    #[test]
    fn study_order_follows_the_report() {
        let html = generate_html(&sample_report());
        let first = html.find("<li><b>PRG2104</b>").unwrap();
        let second = html.find("<li><b>CSC2103</b>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn progress_panel_lists_open_requirements() {
        let html = generate_html(&sample_report());
        assert!(html.contains("<h2>Progress: 202301-normal</h2>"));
        assert!(html.contains("value=\"33.33\""));
        assert!(html.contains("40 of 120 credits"));
        assert!(html.contains("<dd>MPU3193 or MPU3203</dd>"));
        assert!(!html.contains("Free electives open"));
    }

    #[test]
    fn progress_panel_is_omitted_without_progress() {
        let mut report = sample_report();
        report.progress = None;
        assert!(!generate_html(&report).contains("Progress:"));
    }

    #[test]
    fn free_text_is_escaped() {
        let html = generate_html(&sample_report());
        assert!(html.contains("Data Structures &amp; Algorithms"));
        assert!(!html.contains("Data Structures & Algorithms"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("1001.html");
        write_html_report(&sample_report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("Advising report: 1001"));
    }
}
