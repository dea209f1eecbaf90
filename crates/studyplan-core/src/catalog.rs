//! Static BCS curriculum definitions and variant assembly.
//!
//! Variants are assembled from a shared course pool, a per-variant semester
//! layout, category overrides, elective placeholder slots, either-pairs and
//! the elective store registered for the intake.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::model::{
    Category, ChoicePair, Course, ElectiveGroup, ElectiveSlot, EntryType, ProgrammeVariant,
    SemesterPlan, VariantKey,
};
use crate::prereq::PrerequisiteGraph;

pub const PROGRAMME_CODE: &str = "BCS";

/// Store attached to intakes without a registered elective set.
pub const DEFAULT_ELECTIVE_STORE: &str = "2023";

/// Semester that receives the elective placeholder slots.
const PLACEHOLDER_SEMESTER: u32 = 4;
const PLACEHOLDER_CREDIT: u32 = 4;

const COURSE_POOL: &[(&str, &str, u32)] = &[
    ("ENG1044", "English for Computer Technology Studies", 4),
    ("CSC1202", "Computer Organisation", 4),
    ("MTH1114", "Computer Mathematics", 4),
    ("CSC1024", "Programming Principles", 4),
    ("PRG1203", "Object-Oriented Programming Fundamentals", 4),
    ("SEG1201", "Database Fundamentals", 4),
    ("NET1014", "Networking Principles", 4),
    ("WEB1201", "Web Fundamentals", 4),
    ("CSC2104", "Operating System Fundamentals", 4),
    ("SEG2202", "Software Engineering", 4),
    ("CSC2103", "Data Structures & Algorithms", 4),
    ("PRG2104", "Object-Oriented Programming", 4),
    ("ENG2042", "Communication Skills", 2),
    ("ENG2044", "Communication Skills", 4),
    ("CSC2014", "Digital Image Processing", 4),
    ("NET2201", "Computer Networks", 4),
    ("CSC3024", "Human Computer Interaction", 4),
    ("SEG3203", "Internship", 6),
    ("CSC3206", "Artificial Intelligence", 4),
    ("PRJ3213", "Capstone Project 1", 3),
    ("PRJ3223", "Capstone Project 2", 3),
    ("NET3204", "Distributed Systems", 4),
    ("MAT1013", "Micro-credential in Computer Mathematics Fundamentals", 4),
    ("OSS1014", "Operating System Fundamentals", 4),
    ("BIS2212(MU32422)", "Social and Professional Responsibilities", 2),
    ("ENG2042(MU22812)", "Communication Skills", 2),
    ("MU42422", "Community Service", 2),
    ("MPU2012", "Entrepreneurial Mindset and Skills", 2),
    ("MPU3422", "Community Service for Planetary Health", 2),
    ("MPU3332", "Integrity and Anti-Corruption (KIAR)", 2),
];

const CATEGORY_OVERRIDES: &[(&str, Category)] = &[
    ("PRJ3213", Category::Capstone),
    ("PRJ3223", Category::Capstone),
    ("SEG3203", Category::Internship),
    ("BIS2212(MU32422)", Category::Compulsory),
    ("ENG2042(MU22812)", Category::Compulsory),
    ("ENG2044", Category::Compulsory),
    ("MU42422", Category::Compulsory),
    ("MPU2012", Category::Compulsory),
    ("MPU3422", Category::Compulsory),
    ("MPU3332", Category::Compulsory),
];

/// Either/or requirements; each option is `(code, name, credit)`.
const EITHER_PAIRS: &[[(&str, &str, u32); 2]] = &[
    [
        ("MPU3193", "Falsafah dan Isu Semasa", 3),
        ("MPU3203", "Appreciation of Ethics and Civilisation", 3),
    ],
    [
        ("MPU3183", "Penghayatan Etika dan Peradaban", 3),
        ("MPU3213", "Bahasa Melayu Komunikasi", 3),
    ],
];

const DISCIPLINE_PLACEHOLDERS: &[(&str, &str)] = &[
    ("D1Y2", "Discipline Elective Y2 Slot 1"),
    ("D2Y2", "Discipline Elective Y2 Slot 2"),
    ("D4Y3", "Discipline Elective Y3 Slot 1"),
    ("D5Y3", "Discipline Elective Y3 Slot 2"),
];

const FREE_PLACEHOLDERS: &[(&str, &str)] = &[
    ("*F1", "Free Elective 1"),
    ("*F2", "Free Elective 2"),
    ("*F3", "Free Elective 3"),
];

struct VariantLayout {
    intake: &'static str,
    entry_type: EntryType,
    /// Semester hosting the either-pairs, when the variant has them.
    pair_semester: Option<u32>,
    semesters: &'static [(&'static str, u32)],
}

const VARIANT_LAYOUTS: &[VariantLayout] = &[
    VariantLayout {
        intake: "202301",
        entry_type: EntryType::Normal,
        pair_semester: Some(1),
        semesters: &[
            ("ENG1044", 2), ("CSC1202", 2), ("MTH1114", 2), ("CSC1024", 2),
            ("PRG1203", 3), ("SEG1201", 3), ("NET1014", 3), ("WEB1201", 3),
            ("CSC2104", 5), ("SEG2202", 5), ("CSC2103", 5), ("PRG2104", 5),
            ("ENG2042(MU22812)", 5),
            ("CSC2014", 6), ("NET2201", 6), ("CSC3024", 6),
            ("CSC3206", 8), ("PRJ3213", 8), ("MU42422", 8),
            ("PRJ3223", 9), ("NET3204", 9), ("SEG3203", 7),
            ("BIS2212(MU32422)", 4),
        ],
    },
    VariantLayout {
        intake: "202301",
        entry_type: EntryType::Precalc,
        pair_semester: Some(1),
        semesters: &[
            ("MAT1013", 1),
            ("ENG1044", 2), ("CSC1202", 2), ("CSC1024", 2), ("NET1014", 2),
            ("MTH1114", 3), ("PRG1203", 3), ("SEG1201", 3), ("WEB1201", 3),
            ("CSC2104", 5), ("SEG2202", 5), ("CSC2103", 5), ("PRG2104", 5),
            ("ENG2042(MU22812)", 5),
            ("CSC2014", 6), ("NET2201", 6), ("CSC3024", 6),
            ("CSC3206", 8), ("PRJ3213", 8), ("MU42422", 8),
            ("PRJ3223", 9), ("NET3204", 9), ("SEG3203", 7),
            ("BIS2212(MU32422)", 4),
        ],
    },
    VariantLayout {
        intake: "202301",
        entry_type: EntryType::Direct,
        pair_semester: None,
        semesters: &[
            ("ENG1044", 2), ("CSC1202", 2), ("MTH1114", 2), ("CSC1024", 2),
            ("PRG1203", 3), ("SEG1201", 3), ("NET1014", 3), ("WEB1201", 3),
            ("CSC2104", 4), ("SEG2202", 5), ("CSC2103", 5), ("PRG2104", 5),
            ("ENG2042(MU22812)", 5),
            ("CSC2014", 6), ("NET2201", 5), ("CSC3024", 5),
            ("CSC3206", 8), ("PRJ3213", 8), ("MU42422", 4),
            ("PRJ3223", 8), ("NET3204", 8), ("SEG3203", 9),
            ("BIS2212(MU32422)", 4),
        ],
    },
    VariantLayout {
        intake: "202304",
        entry_type: EntryType::Normal,
        pair_semester: Some(3),
        semesters: &[
            ("ENG1044", 1), ("CSC1202", 1), ("MTH1114", 1), ("CSC1024", 1),
            ("PRG1203", 2), ("SEG1201", 2), ("WEB1201", 2), ("OSS1014", 2),
            ("NET1014", 3),
            ("CSC2014", 4), ("CSC2103", 4), ("PRG2104", 4), ("ENG2044", 4),
            ("CSC3206", 7), ("PRJ3213", 7), ("PRJ3223", 8), ("NET3204", 8),
            ("SEG3203", 9),
        ],
    },
    VariantLayout {
        intake: "202304",
        entry_type: EntryType::Precalc,
        pair_semester: Some(3),
        semesters: &[
            ("MAT1013", 1), ("ENG1044", 1), ("CSC1202", 1), ("CSC1024", 1), ("WEB1201", 1),
            ("MTH1114", 2), ("PRG1203", 2), ("SEG1201", 2), ("OSS1014", 2),
            ("NET1014", 3),
            ("CSC2014", 4), ("CSC2103", 4), ("PRG2104", 4), ("ENG2044", 4),
            ("CSC3206", 7), ("PRJ3213", 7), ("PRJ3223", 8), ("NET3204", 8),
            ("SEG3203", 9),
        ],
    },
    VariantLayout {
        intake: "202304",
        entry_type: EntryType::Direct,
        pair_semester: None,
        semesters: &[
            ("ENG1044", 2), ("CSC1202", 2), ("MTH1114", 2), ("CSC1024", 2),
            ("PRG1203", 3), ("SEG1201", 3), ("WEB1201", 3), ("OSS1014", 3),
            ("NET1014", 6),
            ("CSC2014", 5), ("CSC2103", 4), ("PRG2104", 4), ("ENG2042(MU22812)", 4),
            ("CSC3024", 5), ("NET2201", 5),
            ("CSC3206", 7), ("PRJ3213", 7), ("PRJ3223", 8), ("NET3204", 8),
            ("SEG3203", 9),
        ],
    },
    VariantLayout {
        intake: "202309",
        entry_type: EntryType::Normal,
        pair_semester: Some(2),
        semesters: &[
            ("ENG1044", 1), ("CSC1202", 1), ("MTH1114", 1), ("CSC1024", 1),
            ("NET1014", 2),
            ("PRG1203", 3), ("SEG1201", 3), ("WEB1201", 3), ("OSS1014", 3),
            ("CSC2103", 9), ("CSC2014", 6), ("PRG2104", 6), ("ENG2044", 6), ("CSC3206", 6),
            ("PRJ3213", 7), ("CSC3024", 7), ("NET3204", 7), ("SEG3203", 8), ("PRJ3223", 9),
        ],
    },
    VariantLayout {
        intake: "202309",
        entry_type: EntryType::Precalc,
        pair_semester: Some(2),
        semesters: &[
            ("MAT1013", 1), ("ENG1044", 1), ("CSC1202", 1), ("CSC1024", 1), ("WEB1201", 1),
            ("NET1014", 2),
            ("MTH1114", 3), ("PRG1203", 3), ("SEG1201", 3), ("OSS1014", 3),
            ("CSC2103", 9), ("CSC2014", 6), ("PRG2104", 6), ("ENG2044", 6), ("CSC3206", 6),
            ("PRJ3213", 7), ("CSC3024", 7), ("NET3204", 7), ("SEG3203", 8), ("PRJ3223", 9),
        ],
    },
];

type StoreGroups = &'static [(&'static str, u32, &'static [(&'static str, &'static str)])];

struct ElectiveStore {
    id: &'static str,
    /// `(group code, year level, options)` in insertion order.
    groups: StoreGroups,
}

const FUNCTIONAL: (&str, &str) = ("PRG2214", "Functional Programming Principles");
const DATA_COMMS: (&str, &str) = ("NET2102", "Data Communications");
const PROG_LANGS: (&str, &str) = ("PRG2205", "Programming Languages");
const DBMS: (&str, &str) = ("SEG2102", "Database Management Systems");
const NETWORKS: (&str, &str) = ("NET2201", "Computer Networks");
const CONCURRENT: (&str, &str) = ("CSC2044", "Concurrent Programming");
const DATA_MINING: (&str, &str) = ("BIS2216", "Data Mining and Knowledge Discovery Fundamentals");
const WEB_ANALYTICS: (&str, &str) = ("SWA2124", "Social and Web Analytics");
const IMAGE_PROC: (&str, &str) = ("CSC2014", "Digital Image Processing");
const IS_ANALYSIS: (&str, &str) = ("BIS2102", "Information System Analysis & Design");
const MOBILE: (&str, &str) = ("CSC2074", "Mobile Application Development");
const IOT: (&str, &str) = ("NET3054", "IoT Networking and Security");
const SECURITY: (&str, &str) = ("CSC3044", "Computer Security");
const VISION: (&str, &str) = ("CSC3014", "Computer Vision");
const ARCHITECTURE: (&str, &str) = ("CSC3209", "Software Architecture and Design Patterns");
const COMP_INTEL: (&str, &str) = ("CSC3034", "Computational Intelligence");
const DB_ENGINEERING: (&str, &str) = ("CSC3064", "Database Engineering");
const UX: (&str, &str) = ("PRG3014", "UI/UX Design and Development");
const CLOUD: (&str, &str) = ("CSC3074", "Cloud Computing");

const ELECTIVE_STORES: &[ElectiveStore] = &[
    ElectiveStore {
        id: "2023",
        groups: &[
            ("D1Y2", 2, &[FUNCTIONAL, DATA_COMMS, PROG_LANGS, DBMS, NETWORKS]),
            ("D2Y2", 2, &[CONCURRENT, DBMS, DATA_MINING, WEB_ANALYTICS]),
            ("D4Y3", 3, &[SECURITY, VISION, ARCHITECTURE]),
            ("D5Y3", 3, &[COMP_INTEL, DB_ENGINEERING, UX]),
        ],
    },
    ElectiveStore {
        id: "2024",
        groups: &[
            ("D1Y2", 2, &[IMAGE_PROC, WEB_ANALYTICS, IS_ANALYSIS]),
            ("D2Y2", 2, &[FUNCTIONAL, DATA_COMMS, PROG_LANGS, DBMS]),
            ("D3Y2", 2, &[CONCURRENT, DATA_MINING, NETWORKS, MOBILE]),
            ("D4Y3", 3, &[SECURITY, VISION, ARCHITECTURE]),
            ("D5Y3", 3, &[COMP_INTEL, DB_ENGINEERING, UX, CLOUD]),
        ],
    },
    ElectiveStore {
        id: "2025",
        groups: &[
            ("D1Y2", 2, &[IMAGE_PROC, WEB_ANALYTICS, IS_ANALYSIS]),
            ("D2Y2", 2, &[FUNCTIONAL, DATA_COMMS, PROG_LANGS, DBMS, IOT]),
            ("D3Y2", 2, &[CONCURRENT, DATA_MINING, NETWORKS, MOBILE]),
            ("D4Y3", 3, &[SECURITY, VISION, ARCHITECTURE]),
            ("D5Y3", 3, &[COMP_INTEL, DB_ENGINEERING, UX, CLOUD]),
        ],
    },
];

const ELECTIVE_OPTION_CREDIT: u32 = 4;

/// Intake code → elective store id.
const INTAKE_STORES: &[(&str, &str)] = &[
    ("202301", "2023"),
    ("202304", "2023"),
    ("202309", "2023"),
    ("202401", "2024"),
    ("202404", "2024"),
    ("202409", "2024"),
    ("202501", "2025"),
];

/// Elective groups attached to a variant, with their provenance.
#[derive(Debug, Clone)]
pub struct AttachedElectives {
    pub groups: Vec<ElectiveGroup>,
    pub store_id: &'static str,
    /// True when the intake had no registered store.
    pub fallback: bool,
}

/// Keys of every variant with a static definition, in catalog order.
pub fn variant_keys() -> Vec<VariantKey> {
    VARIANT_LAYOUTS
        .iter()
        .map(|l| VariantKey::new(l.intake, l.entry_type))
        .collect()
}

/// Build the elective groups registered for `intake_code`.
///
/// Intakes without a registered store receive the default store. The
/// substitution is logged and reported on the result.
pub fn build_elective_groups(intake_code: &str) -> AttachedElectives {
    let registered = INTAKE_STORES
        .iter()
        .find(|(intake, _)| *intake == intake_code)
        .map(|(_, store)| *store);
    let fallback = registered.is_none();
    if fallback {
        warn!(
            intake = intake_code,
            store = DEFAULT_ELECTIVE_STORE,
            "no elective store registered for intake, using default"
        );
    }
    let store_id = registered.unwrap_or(DEFAULT_ELECTIVE_STORE);
    let groups = ELECTIVE_STORES
        .iter()
        .find(|s| s.id == store_id)
        .map(|store| {
            store
                .groups
                .iter()
                .map(|(group_code, year, options)| ElectiveGroup {
                    group_code: group_code.to_string(),
                    year_level: Some(*year),
                    options: options
                        .iter()
                        .map(|(code, name)| {
                            Course::new(code, name, ELECTIVE_OPTION_CREDIT)
                                .with_category(Category::ElectiveDiscipline)
                                .in_group(group_code)
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    AttachedElectives {
        groups,
        store_id,
        fallback,
    }
}

fn pool_course(code: &str) -> Option<&'static (&'static str, &'static str, u32)> {
    COURSE_POOL.iter().find(|(c, _, _)| *c == code)
}

/// Display name of any subject the catalog knows about.
pub fn course_name(code: &str) -> Option<&'static str> {
    pool_course(code)
        .map(|(_, name, _)| *name)
        .or_else(|| {
            EITHER_PAIRS
                .iter()
                .flatten()
                .find(|(c, _, _)| *c == code)
                .map(|(_, name, _)| *name)
        })
        .or_else(|| {
            ELECTIVE_STORES
                .iter()
                .flat_map(|store| store.groups.iter())
                .flat_map(|(_, _, options)| options.iter())
                .find(|(c, _)| *c == code)
                .map(|(_, name)| *name)
        })
}

fn category_for(code: &str) -> Category {
    CATEGORY_OVERRIDES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, category)| *category)
        .unwrap_or(Category::Core)
}

/// Assemble the variant identified by `key`.
///
/// Unknown keys are a hard `NotFound`; only the elective store lookup falls
/// back to a default.
pub fn build_variant(key: &VariantKey) -> Result<ProgrammeVariant> {
    let layout = VARIANT_LAYOUTS
        .iter()
        .find(|l| l.intake == key.intake_code && l.entry_type == key.entry_type)
        .ok_or_else(|| PlannerError::not_found("variant", key.to_string()))?;

    let mut semesters: BTreeMap<u32, SemesterPlan> = BTreeMap::new();
    for (code, semester) in layout.semesters {
        let (_, name, credit) = pool_course(code).ok_or_else(|| {
            PlannerError::InvalidInput(format!("{code} is missing from the course pool"))
        })?;
        let course = Course::new(code, name, *credit)
            .in_semester(*semester)
            .with_category(category_for(code));
        semesters
            .entry(*semester)
            .or_insert_with(|| SemesterPlan::new(*semester))
            .required_courses
            .push(course);
    }

    let mut choice_pairs = Vec::new();
    if let Some(pair_semester) = layout.pair_semester {
        let plan = semesters
            .entry(pair_semester)
            .or_insert_with(|| SemesterPlan::new(pair_semester));
        for pair in EITHER_PAIRS {
            for (code, name, credit) in pair {
                plan.required_courses.push(
                    Course::new(code, name, *credit)
                        .in_semester(pair_semester)
                        .with_category(Category::ChoiceCore),
                );
            }
            choice_pairs.push(ChoicePair::new(pair[0].0, pair[1].0));
        }
    }

    let placeholder_plan = semesters
        .entry(PLACEHOLDER_SEMESTER)
        .or_insert_with(|| SemesterPlan::new(PLACEHOLDER_SEMESTER));
    let slots = DISCIPLINE_PLACEHOLDERS
        .iter()
        .map(|p| (p, Category::ElectiveDiscipline))
        .chain(FREE_PLACEHOLDERS.iter().map(|p| (p, Category::ElectiveFree)));
    for ((code, name), category) in slots {
        placeholder_plan.required_courses.push(
            Course::new(code, name, PLACEHOLDER_CREDIT)
                .in_semester(PLACEHOLDER_SEMESTER)
                .with_category(category)
                .placeholder(),
        );
    }

    let electives = build_elective_groups(&key.intake_code);
    let group_codes: HashSet<&str> = electives
        .groups
        .iter()
        .map(|g| g.group_code.as_str())
        .collect();
    for (code, _) in DISCIPLINE_PLACEHOLDERS {
        if group_codes.contains(code) {
            placeholder_plan.elective_slots.push(ElectiveSlot {
                group_code: code.to_string(),
                count: 1,
            });
        }
    }

    let mut variant = ProgrammeVariant {
        programme_code: PROGRAMME_CODE.to_string(),
        intake_code: key.intake_code.clone(),
        entry_type: key.entry_type,
        semesters: semesters.into_values().collect(),
        elective_groups: electives.groups,
        prerequisite_graph: BTreeMap::new(),
        choice_pairs,
        discipline_elective_placeholders: DISCIPLINE_PLACEHOLDERS
            .iter()
            .map(|(code, _)| code.to_string())
            .collect(),
        free_elective_placeholders: FREE_PLACEHOLDERS
            .iter()
            .map(|(code, _)| code.to_string())
            .collect(),
        elective_store: electives.store_id.to_string(),
        elective_store_fallback: electives.fallback,
    };
    attach_prerequisites(&mut variant, &PrerequisiteGraph::curated());

    debug!(
        variant = %key,
        semesters = variant.semesters.len(),
        store = %variant.elective_store,
        "built programme variant"
    );
    Ok(variant)
}

/// Copy curated prerequisite edges onto the courses the variant contains.
fn attach_prerequisites(variant: &mut ProgrammeVariant, graph: &PrerequisiteGraph) {
    let codes: HashSet<String> = variant
        .list_all_courses()
        .iter()
        .map(|c| c.subject_code.clone())
        .collect();
    variant.prerequisite_graph = graph.unweighted(|code| codes.contains(code));

    let prereqs = &variant.prerequisite_graph;
    let courses = variant
        .semesters
        .iter_mut()
        .flat_map(|s| s.required_courses.iter_mut())
        .chain(
            variant
                .elective_groups
                .iter_mut()
                .flat_map(|g| g.options.iter_mut()),
        );
    for course in courses {
        if let Some(list) = prereqs.get(&course.subject_code) {
            course.prerequisites = list.clone();
        }
    }
}
