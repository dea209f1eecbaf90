//! Curated, weighted prerequisite graph.
//!
//! Each edge says how strongly performance in one subject predicts
//! performance in another. Weights lie in `(0, 1]`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Depth limit for transitive chain expansion.
pub const MAX_CHAIN_DEPTH: usize = 5;

/// Curated `(target, [(prerequisite, weight)])` table.
pub const CURATED_PREREQUISITES: &[(&str, &[(&str, f64)])] = &[
    // Database track
    ("SEG2102", &[("SEG1201", 0.9)]),
    ("CSC3064", &[("SEG2102", 0.8), ("SEG1201", 0.5)]),
    ("BIS2216", &[("SEG1201", 0.6)]),
    ("BIS3216", &[("BIS2216", 0.8), ("SEG1201", 0.4)]),
    // Programming track
    ("PRG1203", &[("CSC1024", 0.9)]),
    ("PRG2104", &[("PRG1203", 0.9), ("CSC1024", 0.4)]),
    ("CSC2103", &[("PRG1203", 0.8), ("CSC1024", 0.5)]),
    ("CSC2044", &[("PRG2104", 0.7), ("PRG1203", 0.5)]),
    ("PRG2205", &[("PRG2104", 0.7), ("CSC2103", 0.5)]),
    ("PRG2214", &[("PRG1203", 0.7), ("CSC1024", 0.5)]),
    // Software engineering
    ("SEG2202", &[("PRG1203", 0.6), ("SEG1201", 0.5)]),
    ("CSC3209", &[("SEG2202", 0.8), ("PRG2104", 0.6)]),
    ("PRG3014", &[("SEG2202", 0.5), ("CSC3024", 0.6)]),
    // AI and vision
    ("CSC3206", &[("CSC2103", 0.7), ("MTH1114", 0.5)]),
    ("CSC3034", &[("CSC3206", 0.8), ("CSC2103", 0.4)]),
    ("CSC3014", &[("CSC2014", 0.7), ("CSC3206", 0.5)]),
    ("CSC2014", &[("MTH1114", 0.5), ("CSC1024", 0.4)]),
    // Networking
    ("NET2201", &[("NET1014", 0.9)]),
    ("NET2102", &[("NET1014", 0.8)]),
    ("NET2103", &[("NET2201", 0.7), ("CSC2104", 0.5)]),
    ("NET3014", &[("NET2201", 0.8), ("NET2102", 0.5)]),
    ("NET3106", &[("NET2201", 0.7), ("CSC3044", 0.6)]),
    ("NET3204", &[("NET2201", 0.7), ("CSC2104", 0.5)]),
    ("NET3207", &[("NET2201", 0.8), ("NET2103", 0.6)]),
    ("MMD3105", &[("NET2201", 0.6)]),
    // Security
    ("CSC3044", &[("NET2201", 0.6), ("CSC2104", 0.5)]),
    ("SEC3024", &[("CSC3044", 0.8), ("NET2201", 0.5)]),
    ("SEC3014", &[("NET3106", 0.8), ("CSC3044", 0.5)]),
    ("SEC3034", &[("SEC3024", 0.7), ("CSC3044", 0.6)]),
    ("SEC3044", &[("CSC3044", 0.8), ("SEC3024", 0.6)]),
    // Systems
    ("CSC2104", &[("CSC1202", 0.7), ("CSC1024", 0.5)]),
    ("OSS1014", &[("CSC1202", 0.7), ("CSC1024", 0.5)]),
    ("WEB2202", &[("WEB1201", 0.9), ("PRG1203", 0.5)]),
    // Information systems and analytics
    ("MTH2103", &[("MTH1114", 0.8), ("IST1024", 0.5)]),
    ("IST2024", &[("IST1024", 0.7), ("MTH1114", 0.4)]),
    ("IST2334", &[("SEG1201", 0.5), ("NET1014", 0.4)]),
    ("IST2134", &[("IST1024", 0.5)]),
    ("IST2234", &[("IST1024", 0.6), ("IST2034", 0.5)]),
    ("IST3134", &[("SEG2102", 0.6), ("IST2024", 0.5)]),
    ("IST3144", &[("IST2024", 0.7)]),
    ("IST3244", &[("IST2024", 0.8), ("IST2234", 0.5)]),
    ("BIS3218", &[("BIS2216", 0.7), ("SEG2102", 0.5)]),
    // Projects
    ("PRJ3213", &[("SEG2202", 0.6), ("PRG2104", 0.5)]),
    ("PRJ3223", &[("PRJ3213", 0.9)]),
    ("CSC3024", &[("SEG2202", 0.4), ("PRG1203", 0.4)]),
];

/// One weighted prerequisite edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPrerequisite {
    pub code: String,
    pub weight: f64,
}

/// A direct prerequisite with its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectPrerequisite {
    pub code: String,
    pub name: String,
    pub weight: f64,
}

/// A transitive prerequisite annotated with its distance from the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub code: String,
    pub name: String,
    pub depth: usize,
}

/// Direct and transitive prerequisites of a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisiteChain {
    pub subject_code: String,
    pub subject_name: String,
    pub direct_prerequisites: Vec<DirectPrerequisite>,
    pub full_chain: Vec<ChainEntry>,
}

/// Weighted subject → prerequisites graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrerequisiteGraph {
    edges: BTreeMap<String, Vec<WeightedPrerequisite>>,
}

impl PrerequisiteGraph {
    /// The built-in curated graph.
    pub fn curated() -> Self {
        let edges = CURATED_PREREQUISITES
            .iter()
            .map(|(target, prereqs)| {
                let list = prereqs
                    .iter()
                    .map(|(code, weight)| WeightedPrerequisite {
                        code: code.to_string(),
                        weight: *weight,
                    })
                    .collect();
                (target.to_string(), list)
            })
            .collect();
        Self { edges }
    }

    /// Build a graph from `(target, prerequisite, weight)` triples.
    ///
    /// Edge order per target follows input order.
    pub fn from_edges<'a, I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let mut graph = Self::default();
        for (target, prereq, weight) in edges {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(PlannerError::InvalidInput(format!(
                    "prerequisite weight {weight} for {prereq} -> {target} is outside (0, 1]"
                )));
            }
            if target.trim().is_empty() || prereq.trim().is_empty() {
                return Err(PlannerError::InvalidInput(
                    "prerequisite edge with empty subject code".into(),
                ));
            }
            graph
                .edges
                .entry(target.to_string())
                .or_default()
                .push(WeightedPrerequisite {
                    code: prereq.to_string(),
                    weight,
                });
        }
        Ok(graph)
    }

    /// Weighted prerequisites of `code`, empty when it has none.
    pub fn prerequisites_of(&self, code: &str) -> &[WeightedPrerequisite] {
        self.edges.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `code` appears as a target or as a prerequisite.
    pub fn contains_subject(&self, code: &str) -> bool {
        self.edges.contains_key(code)
            || self
                .edges
                .values()
                .any(|list| list.iter().any(|p| p.code == code))
    }

    /// Subjects with at least one prerequisite, in code order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Unweighted projection restricted to targets accepted by `keep`.
    pub fn unweighted<F>(&self, keep: F) -> BTreeMap<String, Vec<String>>
    where
        F: Fn(&str) -> bool,
    {
        self.edges
            .iter()
            .filter(|(target, _)| keep(target))
            .map(|(target, list)| {
                (
                    target.clone(),
                    list.iter().map(|p| p.code.clone()).collect(),
                )
            })
            .collect()
    }

    /// Expand the prerequisite closure of `code`.
    ///
    /// Every subject is expanded at most once and expansion stops below
    /// [`MAX_CHAIN_DEPTH`], so cyclic graphs terminate.
    pub fn chain<F>(&self, code: &str, name_of: F) -> PrerequisiteChain
    where
        F: Fn(&str) -> String,
    {
        let mut chain = PrerequisiteChain {
            subject_code: code.to_string(),
            subject_name: name_of(code),
            direct_prerequisites: Vec::new(),
            full_chain: Vec::new(),
        };
        let mut visited: HashSet<String> = HashSet::new();
        self.traverse(code, 0, &name_of, &mut visited, &mut chain);
        chain
    }

    fn traverse<F>(
        &self,
        code: &str,
        depth: usize,
        name_of: &F,
        visited: &mut HashSet<String>,
        chain: &mut PrerequisiteChain,
    ) where
        F: Fn(&str) -> String,
    {
        if depth > MAX_CHAIN_DEPTH || !visited.insert(code.to_string()) {
            return;
        }
        for prereq in self.prerequisites_of(code) {
            let name = name_of(&prereq.code);
            if depth == 0 {
                chain.direct_prerequisites.push(DirectPrerequisite {
                    code: prereq.code.clone(),
                    name: name.clone(),
                    weight: prereq.weight,
                });
            }
            chain.full_chain.push(ChainEntry {
                code: prereq.code.clone(),
                name,
                depth: depth + 1,
            });
            self.traverse(&prereq.code, depth + 1, name_of, visited, chain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_name(code: &str) -> String {
        code.to_string()
    }

    #[test]
    fn curated_weights_in_range() {
        let graph = PrerequisiteGraph::curated();
        for target in graph.targets() {
            for p in graph.prerequisites_of(target) {
                assert!(p.weight > 0.0 && p.weight <= 1.0, "{target} <- {}", p.code);
            }
        }
        assert_eq!(graph.prerequisites_of("PRG2104").len(), 2);
        assert!(graph.prerequisites_of("CSC1024").is_empty());
    }

    #[test]
    fn contains_subject_as_prerequisite_only() {
        let graph = PrerequisiteGraph::curated();
        assert!(graph.contains_subject("CSC1024"));
        assert!(graph.contains_subject("PRJ3223"));
        assert!(!graph.contains_subject("ZZZ9999"));
    }

    #[test]
    fn rejects_out_of_range_weights() {
        assert!(PrerequisiteGraph::from_edges([("A", "B", 0.0)]).is_err());
        assert!(PrerequisiteGraph::from_edges([("A", "B", 1.2)]).is_err());
        assert!(PrerequisiteGraph::from_edges([("A", "B", f64::NAN)]).is_err());
        assert!(PrerequisiteGraph::from_edges([("A", "B", 1.0)]).is_ok());
    }

    #[test]
    fn chain_of_capstone() {
        let graph = PrerequisiteGraph::curated();
        let chain = graph.chain("PRJ3223", code_name);
        assert_eq!(chain.direct_prerequisites.len(), 1);
        assert_eq!(chain.direct_prerequisites[0].code, "PRJ3213");
        assert!((chain.direct_prerequisites[0].weight - 0.9).abs() < f64::EPSILON);
        assert_eq!(chain.full_chain[0].depth, 1);
        assert!(chain
            .full_chain
            .iter()
            .any(|e| e.code == "CSC1024" && e.depth > 2));
    }

    #[test]
    fn chain_terminates_on_cycle() {
        let graph =
            PrerequisiteGraph::from_edges([("A", "B", 0.5), ("B", "C", 0.5), ("C", "A", 0.5)])
                .unwrap();
        let chain = graph.chain("A", code_name);
        let codes: Vec<&str> = chain.full_chain.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "C", "A"]);
    }

    #[test]
    fn chain_respects_depth_cap() {
        let codes: Vec<String> = (0..12).map(|i| format!("S{i}")).collect();
        let edges: Vec<(&str, &str, f64)> = codes
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str(), 0.5))
            .collect();
        let graph = PrerequisiteGraph::from_edges(edges).unwrap();
        let chain = graph.chain("S0", code_name);
        let max_depth = chain.full_chain.iter().map(|e| e.depth).max().unwrap();
        assert_eq!(max_depth, MAX_CHAIN_DEPTH + 1);
        assert_eq!(chain.full_chain.len(), MAX_CHAIN_DEPTH + 1);
    }

    #[test]
    fn unweighted_projection_filters_targets() {
        let graph = PrerequisiteGraph::curated();
        let projected = graph.unweighted(|code| code == "PRG2104");
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["PRG2104"], vec!["PRG1203", "CSC1024"]);
    }
}
