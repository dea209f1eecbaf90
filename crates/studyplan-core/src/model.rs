//! Curriculum data model.
//!
//! A [`ProgrammeVariant`] is the immutable description of one
//! programme / intake / entry-type curriculum: its semesters, elective
//! groups, either-pairs and placeholder slots. Everything the progress and
//! risk engines compute is derived from it without mutation.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Curriculum category of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Core,
    Compulsory,
    ChoiceCore,
    ElectiveDiscipline,
    ElectiveFree,
    Capstone,
    Internship,
    Placeholder,
}

impl Category {
    /// Categories that must be completed individually to graduate.
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Category::Core | Category::Compulsory | Category::Capstone | Category::Internship
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Core => "core",
            Category::Compulsory => "compulsory",
            Category::ChoiceCore => "choice-core",
            Category::ElectiveDiscipline => "elective-discipline",
            Category::ElectiveFree => "elective-free",
            Category::Capstone => "capstone",
            Category::Internship => "internship",
            Category::Placeholder => "placeholder",
        };
        f.write_str(s)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "core" => Ok(Category::Core),
            "compulsory" => Ok(Category::Compulsory),
            "choice-core" => Ok(Category::ChoiceCore),
            "elective-discipline" => Ok(Category::ElectiveDiscipline),
            "elective-free" => Ok(Category::ElectiveFree),
            "capstone" => Ok(Category::Capstone),
            "internship" => Ok(Category::Internship),
            "placeholder" => Ok(Category::Placeholder),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A single subject in a curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Subject code, unique within a variant (e.g. "CSC1024").
    pub subject_code: String,
    /// Display name.
    pub subject_name: String,
    /// Credit weight.
    pub credit: u32,
    /// Semester in which the course is normally taken.
    #[serde(default)]
    pub semester_offering: Option<u32>,
    #[serde(default = "default_category")]
    pub category: Category,
    /// Elective group tag for elective options (e.g. "D1Y2").
    #[serde(default)]
    pub elective_group: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub corequisites: Vec<String>,
    /// Synthetic slot standing in for an unresolved elective.
    #[serde(default)]
    pub is_placeholder: bool,
}

fn default_category() -> Category {
    Category::Core
}

impl Course {
    pub fn new(code: &str, name: &str, credit: u32) -> Self {
        Self {
            subject_code: code.to_string(),
            subject_name: name.to_string(),
            credit,
            semester_offering: None,
            category: Category::Core,
            elective_group: None,
            prerequisites: Vec::new(),
            corequisites: Vec::new(),
            is_placeholder: false,
        }
    }

    pub fn in_semester(mut self, semester: u32) -> Self {
        self.semester_offering = Some(semester);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_prerequisites(mut self, prerequisites: Vec<String>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.elective_group = Some(group.to_string());
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.is_placeholder = true;
        self
    }
}

/// An either/or requirement over exactly two subject codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePair {
    pub option_codes: [String; 2],
}

impl ChoicePair {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            option_codes: [first.to_string(), second.to_string()],
        }
    }

    /// True when at least one option is in the completed set.
    pub fn satisfied(&self, completed: &HashSet<String>) -> bool {
        self.option_codes.iter().any(|code| completed.contains(code))
    }
}

/// A named set of interchangeable elective options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectiveGroup {
    /// Group code (e.g. "D4Y3").
    pub group_code: String,
    #[serde(default)]
    pub year_level: Option<u32>,
    #[serde(default)]
    pub options: Vec<Course>,
}

/// Requirement to pick `count` options from an elective group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectiveSlot {
    pub group_code: String,
    #[serde(default = "default_slot_count")]
    pub count: u32,
}

fn default_slot_count() -> u32 {
    1
}

/// Courses scheduled for one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterPlan {
    pub semester_number: u32,
    #[serde(default)]
    pub required_courses: Vec<Course>,
    #[serde(default)]
    pub elective_slots: Vec<ElectiveSlot>,
}

impl SemesterPlan {
    pub fn new(semester_number: u32) -> Self {
        Self {
            semester_number,
            required_courses: Vec::new(),
            elective_slots: Vec::new(),
        }
    }
}

/// How a student entered the programme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Normal,
    Direct,
    Precalc,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Normal => write!(f, "normal"),
            EntryType::Direct => write!(f, "direct"),
            EntryType::Precalc => write!(f, "precalc"),
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(EntryType::Normal),
            "direct" => Ok(EntryType::Direct),
            "precalc" => Ok(EntryType::Precalc),
            other => Err(format!("unknown entry type: {other}")),
        }
    }
}

/// Identifies one curriculum variant, rendered as `"{intake}-{entry_type}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub intake_code: String,
    pub entry_type: EntryType,
}

impl VariantKey {
    pub fn new(intake_code: &str, entry_type: EntryType) -> Self {
        Self {
            intake_code: intake_code.to_string(),
            entry_type,
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.intake_code, self.entry_type)
    }
}

impl FromStr for VariantKey {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (intake, entry) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| PlannerError::not_found("variant", s))?;
        if intake.is_empty() || !intake.chars().all(|c| c.is_ascii_digit()) {
            return Err(PlannerError::not_found("variant", s));
        }
        let entry_type = entry
            .parse::<EntryType>()
            .map_err(|_| PlannerError::not_found("variant", s))?;
        Ok(VariantKey::new(intake, entry_type))
    }
}

/// A fully assembled curriculum for one intake and entry type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeVariant {
    /// Programme code (e.g. "BCS").
    pub programme_code: String,
    pub intake_code: String,
    pub entry_type: EntryType,
    /// Semesters in ascending order.
    pub semesters: Vec<SemesterPlan>,
    /// Elective groups in insertion order.
    pub elective_groups: Vec<ElectiveGroup>,
    /// Subject code to prerequisite codes, consulted by the risk engine.
    pub prerequisite_graph: BTreeMap<String, Vec<String>>,
    pub choice_pairs: Vec<ChoicePair>,
    pub discipline_elective_placeholders: Vec<String>,
    pub free_elective_placeholders: Vec<String>,
    /// Elective store attached at build time (e.g. "2023").
    pub elective_store: String,
    /// True when the intake had no store of its own and the default was used.
    #[serde(default)]
    pub elective_store_fallback: bool,
}

impl ProgrammeVariant {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(&self.intake_code, self.entry_type)
    }

    /// Every course in the variant, deduplicated by subject code.
    ///
    /// Required courses come first in semester order, followed by elective
    /// options in group insertion order. The first occurrence of a code wins.
    pub fn list_all_courses(&self) -> Vec<&Course> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut courses = Vec::new();
        let required = self.semesters.iter().flat_map(|s| s.required_courses.iter());
        let options = self.elective_groups.iter().flat_map(|g| g.options.iter());
        for course in required.chain(options) {
            if seen.insert(course.subject_code.as_str()) {
                courses.push(course);
            }
        }
        courses
    }

    /// Non-placeholder courses the student has not completed yet.
    pub fn future_courses_for_student(&self, completed: &HashSet<String>) -> Vec<&Course> {
        self.list_all_courses()
            .into_iter()
            .filter(|c| !c.is_placeholder && !completed.contains(&c.subject_code))
            .collect()
    }

    pub fn find_course(&self, code: &str) -> Option<&Course> {
        self.list_all_courses()
            .into_iter()
            .find(|c| c.subject_code == code)
    }

    pub fn elective_group(&self, group_code: &str) -> Option<&ElectiveGroup> {
        self.elective_groups
            .iter()
            .find(|g| g.group_code == group_code)
    }

    /// Codes of every non-placeholder course in listing order.
    pub fn non_placeholder_codes(&self) -> Vec<String> {
        self.list_all_courses()
            .into_iter()
            .filter(|c| !c.is_placeholder)
            .map(|c| c.subject_code.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn small_variant() -> ProgrammeVariant {
        let mut sem1 = SemesterPlan::new(1);
        sem1.required_courses
            .push(Course::new("CSC1024", "Programming Principles", 4).in_semester(1));
        sem1.required_courses
            .push(Course::new("NET1014", "Networking Principles", 4).in_semester(1));
        let mut sem4 = SemesterPlan::new(4);
        sem4.required_courses.push(
            Course::new("D1Y2", "Discipline Elective Y2 Slot 1", 4)
                .with_category(Category::ElectiveDiscipline)
                .placeholder(),
        );
        ProgrammeVariant {
            programme_code: "BCS".into(),
            intake_code: "202301".into(),
            entry_type: EntryType::Normal,
            semesters: vec![sem1, sem4],
            elective_groups: vec![ElectiveGroup {
                group_code: "D1Y2".into(),
                year_level: Some(2),
                options: vec![
                    Course::new("NET1014", "Networking Principles", 4)
                        .with_category(Category::ElectiveDiscipline)
                        .in_group("D1Y2"),
                    Course::new("PRG2214", "Functional Programming Principles", 4)
                        .with_category(Category::ElectiveDiscipline)
                        .in_group("D1Y2"),
                ],
            }],
            prerequisite_graph: BTreeMap::new(),
            choice_pairs: vec![],
            discipline_elective_placeholders: vec!["D1Y2".into()],
            free_elective_placeholders: vec![],
            elective_store: "2023".into(),
            elective_store_fallback: false,
        }
    }

    #[test]
    fn choice_pair_satisfaction() {
        let pair = ChoicePair::new("MPU3193", "MPU3203");
        assert!(pair.satisfied(&completed(&["MPU3193"])));
        assert!(pair.satisfied(&completed(&["MPU3203", "CSC1024"])));
        assert!(!pair.satisfied(&completed(&[])));
        assert!(!pair.satisfied(&completed(&["MPU3183"])));
    }

    #[test]
    fn listing_dedupes_first_seen() {
        let variant = small_variant();
        let codes: Vec<&str> = variant
            .list_all_courses()
            .iter()
            .map(|c| c.subject_code.as_str())
            .collect();
        assert_eq!(codes, vec!["CSC1024", "NET1014", "D1Y2", "PRG2214"]);
        // The required course wins over the elective option with the same code.
        assert_eq!(
            variant.find_course("NET1014").unwrap().category,
            Category::Core
        );
    }

    #[test]
    fn future_courses_skip_placeholders_and_completed() {
        let variant = small_variant();
        let future: Vec<&str> = variant
            .future_courses_for_student(&completed(&["CSC1024"]))
            .iter()
            .map(|c| c.subject_code.as_str())
            .collect();
        assert_eq!(future, vec!["NET1014", "PRG2214"]);
    }

    #[test]
    fn variant_key_display_and_parse() {
        let key: VariantKey = "202301-precalc".parse().unwrap();
        assert_eq!(key.intake_code, "202301");
        assert_eq!(key.entry_type, EntryType::Precalc);
        assert_eq!(key.to_string(), "202301-precalc");

        assert!("202301".parse::<VariantKey>().unwrap_err().is_not_found());
        assert!("202301-evening".parse::<VariantKey>().is_err());
        assert!("abc-normal".parse::<VariantKey>().is_err());
    }

    #[test]
    fn category_display_and_parse() {
        assert_eq!(Category::ChoiceCore.to_string(), "choice-core");
        assert_eq!(
            "elective_free".parse::<Category>().unwrap(),
            Category::ElectiveFree
        );
        assert!(Category::Capstone.is_core());
        assert!(!Category::ElectiveDiscipline.is_core());
        assert!("minor".parse::<Category>().is_err());
    }

    #[test]
    fn course_serde_defaults() {
        let json = r#"{"subject_code":"CSC1024","subject_name":"Programming Principles","credit":4}"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.category, Category::Core);
        assert!(!course.is_placeholder);
        assert!(course.prerequisites.is_empty());
    }
}
