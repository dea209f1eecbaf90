//! Completion status of a student against a programme variant.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Course, ProgrammeVariant};

/// Default number of future courses considered for recommendations.
pub const DEFAULT_RECOMMENDATION_WINDOW: usize = 20;

/// Completion status derived from a variant and a completed-code set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub completed_credits: u32,
    pub total_credits: u32,
    pub outstanding_credits: u32,
    /// Incomplete core, compulsory, capstone and internship codes.
    pub core_remaining: Vec<String>,
    pub discipline_elective_placeholders_remaining: Vec<String>,
    pub free_elective_placeholders_remaining: Vec<String>,
    /// Either-pairs with neither option completed.
    pub either_pairs_remaining: Vec<[String; 2]>,
    /// Percentage of credits completed, rounded to two decimals.
    pub percent_complete: f64,
}

impl ProgressReport {
    pub fn is_complete(&self) -> bool {
        self.outstanding_credits == 0
            && self.core_remaining.is_empty()
            && self.either_pairs_remaining.is_empty()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Compute completion status. Never mutates the variant.
///
/// Placeholder slots count as satisfied only when their own code appears
/// in `completed`; taking a real elective does not clear a slot.
pub fn compute_progress(variant: &ProgrammeVariant, completed: &HashSet<String>) -> ProgressReport {
    let courses: Vec<&Course> = variant
        .list_all_courses()
        .into_iter()
        .filter(|c| !c.is_placeholder)
        .collect();

    let total_credits: u32 = courses.iter().map(|c| c.credit).sum();
    let completed_credits: u32 = courses
        .iter()
        .filter(|c| completed.contains(&c.subject_code))
        .map(|c| c.credit)
        .sum();

    let core_remaining = courses
        .iter()
        .filter(|c| c.category.is_core() && !completed.contains(&c.subject_code))
        .map(|c| c.subject_code.clone())
        .collect();

    let remaining = |slots: &[String]| -> Vec<String> {
        slots
            .iter()
            .filter(|slot| !completed.contains(*slot))
            .cloned()
            .collect()
    };

    let either_pairs_remaining = variant
        .choice_pairs
        .iter()
        .filter(|pair| !pair.satisfied(completed))
        .map(|pair| pair.option_codes.clone())
        .collect();

    let percent_complete = if total_credits == 0 {
        0.0
    } else {
        round_to(
            completed_credits as f64 / total_credits as f64 * 100.0,
            2,
        )
    };

    ProgressReport {
        completed_credits,
        total_credits,
        outstanding_credits: total_credits - completed_credits,
        core_remaining,
        discipline_elective_placeholders_remaining: remaining(
            &variant.discipline_elective_placeholders,
        ),
        free_elective_placeholders_remaining: remaining(&variant.free_elective_placeholders),
        either_pairs_remaining,
        percent_complete,
    }
}

/// Future courses whose prerequisites are all completed.
///
/// Only the first `window` future courses, in listing order, are considered.
pub fn recommend_next_courses<'a>(
    variant: &'a ProgrammeVariant,
    completed: &HashSet<String>,
    window: usize,
) -> Vec<&'a Course> {
    variant
        .future_courses_for_student(completed)
        .into_iter()
        .take(window)
        .filter(|course| {
            variant
                .prerequisite_graph
                .get(&course.subject_code)
                .map(|prereqs| prereqs.iter().all(|p| completed.contains(p)))
                .unwrap_or(true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_variant, variant_keys};

    fn set(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn variant(key: &str) -> ProgrammeVariant {
        build_variant(&key.parse().unwrap()).unwrap()
    }

    #[test]
    fn empty_completion() {
        let v = variant("202301-normal");
        let report = compute_progress(&v, &HashSet::new());
        assert_eq!(report.completed_credits, 0);
        assert_eq!(report.percent_complete, 0.0);
        assert_eq!(report.outstanding_credits, report.total_credits);
        assert_eq!(report.either_pairs_remaining.len(), 2);
        assert_eq!(report.discipline_elective_placeholders_remaining.len(), 4);
        assert_eq!(report.free_elective_placeholders_remaining.len(), 3);
    }

    #[test]
    fn total_credits_match_listing_and_are_stable() {
        for key in variant_keys() {
            let v = build_variant(&key).unwrap();
            let expected: u32 = v
                .list_all_courses()
                .iter()
                .filter(|c| !c.is_placeholder)
                .map(|c| c.credit)
                .sum();
            let first = compute_progress(&v, &HashSet::new());
            let second = compute_progress(&v, &HashSet::new());
            assert_eq!(first.total_credits, expected, "{key}");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn all_non_placeholder_codes_complete_everything() {
        for key in variant_keys() {
            let v = build_variant(&key).unwrap();
            let all: HashSet<String> = v.non_placeholder_codes().into_iter().collect();
            let report = compute_progress(&v, &all);
            assert_eq!(report.completed_credits, report.total_credits);
            assert_eq!(report.percent_complete, 100.0);
            assert!(report.core_remaining.is_empty());
            assert!(report.either_pairs_remaining.is_empty());
            // Placeholders are only cleared by their literal code.
            assert_eq!(report.discipline_elective_placeholders_remaining.len(), 4);
        }
    }

    #[test]
    fn percent_is_monotonic() {
        let v = variant("202309-precalc");
        let codes = v.non_placeholder_codes();
        let mut completed = HashSet::new();
        let mut last = 0.0;
        for code in codes {
            completed.insert(code);
            let pct = compute_progress(&v, &completed).percent_complete;
            assert!(pct >= last, "{pct} < {last}");
            last = pct;
        }
    }

    #[test]
    fn placeholder_cleared_by_literal_code() {
        let v = variant("202304-normal");
        let report = compute_progress(&v, &set(&["D1Y2", "*F2", "PRG2214"]));
        assert_eq!(
            report.discipline_elective_placeholders_remaining,
            vec!["D2Y2", "D4Y3", "D5Y3"]
        );
        assert_eq!(report.free_elective_placeholders_remaining, vec!["*F1", "*F3"]);
    }

    #[test]
    fn one_option_satisfies_pair() {
        let v = variant("202301-precalc");
        let report = compute_progress(&v, &set(&["MPU3203"]));
        assert_eq!(report.either_pairs_remaining.len(), 1);
        assert_eq!(report.either_pairs_remaining[0][0], "MPU3183");
    }

    #[test]
    fn unused_pair_options_stay_outstanding() {
        let v = variant("202301-normal");
        let completed: HashSet<String> = v
            .non_placeholder_codes()
            .into_iter()
            .filter(|code| code != "MPU3203" && code != "MPU3213")
            .collect();
        let report = compute_progress(&v, &completed);
        assert!(report.either_pairs_remaining.is_empty());
        assert!(report.core_remaining.is_empty());
        // Both options of each pair are listed courses, so the untaken ones
        // still count toward total credits.
        assert_eq!(report.outstanding_credits, 6);
        assert!(report.percent_complete < 100.0);
        assert!(!report.is_complete());
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        let v = variant("202301-normal");
        let report = compute_progress(&v, &set(&["CSC1024"]));
        let scaled = report.percent_complete * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
        assert!(report.core_remaining.iter().all(|c| c != "CSC1024"));
    }

    #[test]
    fn recommendations_require_completed_prerequisites() {
        let v = variant("202301-normal");
        let recs = recommend_next_courses(&v, &set(&["CSC1024"]), DEFAULT_RECOMMENDATION_WINDOW);
        let codes: Vec<&str> = recs.iter().map(|c| c.subject_code.as_str()).collect();
        assert!(codes.contains(&"PRG1203"));
        assert!(codes.contains(&"ENG1044"));
        assert!(!codes.contains(&"PRG2104"));
        assert!(!codes.contains(&"CSC1024"));
    }

    #[test]
    fn recommendation_window_limits_candidates() {
        let v = variant("202301-normal");
        let recs = recommend_next_courses(&v, &HashSet::new(), 3);
        assert!(recs.len() <= 3);
    }
}
