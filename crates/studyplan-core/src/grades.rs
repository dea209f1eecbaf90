//! Letter-grade normalization and grade points.

/// Grades that carry no grade-point value.
pub const UNGRADED_MARKERS: &[&str] = &["P", "EX", "INC", "W", "-"];

/// Grades that count as a pass for cohort pass rates.
pub const PASSING_GRADES: &[&str] = &["A+", "A", "A-", "B+", "B", "B-", "C+", "C"];

/// Grades that count as a fail for student features.
pub const FAILING_GRADES: &[&str] = &["D+", "D", "D-", "E", "F", "F*"];

const GRADE_POINTS: &[(&str, f64)] = &[
    ("A+", 4.0),
    ("A", 4.0),
    ("A-", 3.7),
    ("B+", 3.3),
    ("B", 3.0),
    ("B-", 2.7),
    ("C+", 2.3),
    ("C", 2.0),
    ("C-", 1.7),
    ("D+", 1.3),
    ("D", 1.0),
    ("D-", 0.7),
    ("E", 0.5),
    ("F", 0.0),
    ("F*", 0.0),
];

fn lookup(grade: &str) -> Option<f64> {
    GRADE_POINTS
        .iter()
        .find(|(g, _)| *g == grade)
        .map(|(_, points)| *points)
}

/// Grade points for a letter grade.
///
/// Lookup is case-insensitive and ignores surrounding whitespace. Trailing
/// `*` markers are stripped first, falling back to the literal grade.
/// Ungraded markers and unknown grades yield `None`.
pub fn grade_points(grade: &str) -> Option<f64> {
    let normalized = grade.trim().to_uppercase();
    if normalized.is_empty() {
        return None;
    }
    let stripped = normalized.trim_end_matches('*');
    lookup(stripped).or_else(|| lookup(&normalized))
}

/// True for ungraded markers and blank grades.
pub fn is_ungraded(grade: &str) -> bool {
    let normalized = grade.trim().to_uppercase();
    normalized.is_empty() || UNGRADED_MARKERS.contains(&normalized.as_str())
}

pub fn is_passing(grade: &str) -> bool {
    PASSING_GRADES.contains(&grade.trim().to_uppercase().as_str())
}

pub fn is_failing(grade: &str) -> bool {
    FAILING_GRADES.contains(&grade.trim().to_uppercase().as_str())
}

/// Mean of the given grade points, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_point_table() {
        assert_eq!(grade_points("A+"), Some(4.0));
        assert_eq!(grade_points("A"), Some(4.0));
        assert_eq!(grade_points("b+"), Some(3.3));
        assert_eq!(grade_points(" C- "), Some(1.7));
        assert_eq!(grade_points("E"), Some(0.5));
        assert_eq!(grade_points("F*"), Some(0.0));
    }

    #[test]
    fn trailing_markers_are_stripped() {
        assert_eq!(grade_points("B*"), Some(3.0));
        assert_eq!(grade_points("A-**"), Some(3.7));
    }

    #[test]
    fn ungraded_have_no_points() {
        for marker in ["P", "EX", "INC", "W", "", "-", "XYZ"] {
            assert_eq!(grade_points(marker), None, "{marker}");
        }
        assert!(is_ungraded("ex"));
        assert!(is_ungraded("  "));
        assert!(!is_ungraded("A"));
    }

    #[test]
    fn pass_and_fail_sets() {
        assert!(is_passing("C"));
        assert!(!is_passing("C-"));
        assert!(is_failing("D+"));
        assert!(is_failing("f*"));
        assert!(!is_failing("C-"));
    }

    #[test]
    fn mean_of_points() {
        assert_eq!(mean(&[]), None);
        let m = mean(&[4.0, 3.0]).unwrap();
        assert!((m - 3.5).abs() < f64::EPSILON);
    }
}
