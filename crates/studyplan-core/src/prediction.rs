//! Prerequisite-weighted success prediction.
//!
//! A rule-based estimate is derived from the student's grades in weighted
//! prerequisites and the subject's cohort pass rate. When a [`Classifier`]
//! is attached its probability is fused with the rule estimate. Higher
//! probabilities mean a *lower* risk, the opposite of [`crate::risk`].

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{BoundedCache, CacheStats, DEFAULT_MAX_ENTRIES};
use crate::catalog;
use crate::dataset::{HistoricalDataset, HistorySource};
use crate::error::{PlannerError, Result};
use crate::features::{
    CohortFeatures, FeatureVector, PrerequisiteAssessment, PrerequisiteFeatures,
    PrerequisitePerformance, StudentFeatures,
};
use crate::history::StudentRecord;
use crate::prereq::{PrerequisiteChain, PrerequisiteGraph};
use crate::statistics::{CohortStats, SubjectCohortStats};
use crate::traits::{Classifier, ClassifierOutput, TopFactor};

/// Probability used when neither prerequisites nor cohort data exist.
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.7;

/// Multiplier applied when any prerequisite is missing.
const MISSING_PREREQ_PENALTY: f64 = 0.8;

const CLASSIFIER_WEIGHT: f64 = 0.7;
const RULE_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
    Unknown,
}

impl RiskLevel {
    /// Band for a weighted prerequisite GPA.
    pub fn from_weighted_gpa(gpa: f64) -> Self {
        if gpa >= 3.3 {
            RiskLevel::Low
        } else if gpa >= 2.7 {
            RiskLevel::Medium
        } else if gpa >= 2.0 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    /// Band for a classifier pass probability.
    pub fn from_classifier_probability(probability: f64) -> Self {
        if probability >= 0.80 {
            RiskLevel::Low
        } else if probability >= 0.65 {
            RiskLevel::Medium
        } else if probability >= 0.50 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    /// One step worse; high, very high and unknown are unchanged.
    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::High,
            other => other,
        }
    }

    /// Sort key for recommended study order. Unknown ranks with medium.
    pub fn severity(self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium | RiskLevel::Unknown => 1,
            RiskLevel::High => 2,
            RiskLevel::VeryHigh => 3,
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::VeryHigh)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::VeryHigh => write!(f, "very_high"),
            RiskLevel::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredictionMethod {
    RuleBased,
    Hybrid,
}

impl fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionMethod::RuleBased => write!(f, "rule-based"),
            PredictionMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Success estimate for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectPrediction {
    pub subject_code: String,
    pub subject_name: String,
    pub risk_level: RiskLevel,
    /// Probability of passing, in [0, 1].
    pub predicted_success_probability: f64,
    pub weighted_prereq_gpa: f64,
    pub prereq_performance: Vec<PrerequisitePerformance>,
    pub missing_prereqs: Vec<String>,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_pass_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_avg_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifier_top_factors: Vec<TopFactor>,
    pub prediction_method: PredictionMethod,
}

/// Predictions for several subjects of one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPredictionReport {
    pub student_id: String,
    /// Mean grade points over graded subjects, 0.0 when none.
    pub current_gpa: f64,
    pub predictions: Vec<SubjectPrediction>,
    /// Codes predicted high or very high risk, in request order.
    pub high_risk_subjects: Vec<String>,
    /// Requested codes, least risky first; ties keep request order.
    pub recommended_order: Vec<String>,
}

/// Rule-based probability and band for one assessment.
pub fn rule_estimate(
    assessment: &PrerequisiteAssessment,
    cohort_pass_rate: Option<f64>,
) -> (f64, RiskLevel) {
    let (mut probability, mut level) = if !assessment.has_contributions() {
        (
            cohort_pass_rate.unwrap_or(DEFAULT_SUCCESS_PROBABILITY),
            RiskLevel::Unknown,
        )
    } else {
        let base = 0.2 + (assessment.weighted_gpa / 4.0) * 0.75;
        let blended = match cohort_pass_rate {
            Some(pass_rate) => base * 0.7 + pass_rate * 0.3,
            None => base,
        };
        (blended, RiskLevel::from_weighted_gpa(assessment.weighted_gpa))
    };

    if !assessment.missing.is_empty() {
        probability *= MISSING_PREREQ_PENALTY;
        level = level.escalate();
    }
    (probability.clamp(0.0, 1.0), level)
}

/// Fuse a rule estimate with a classifier result.
///
/// The band comes from the classifier's own thresholds.
pub fn fuse(rule_probability: f64, classifier: &ClassifierOutput) -> (f64, RiskLevel) {
    let fused = classifier.probability * CLASSIFIER_WEIGHT + rule_probability * RULE_WEIGHT;
    (fused.clamp(0.0, 1.0), classifier.risk_level)
}

fn first_two_names<'a, I>(performances: I) -> String
where
    I: Iterator<Item = &'a PrerequisitePerformance>,
{
    performances
        .take(2)
        .map(|p| p.prereq_name.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}

/// Advice text for a final risk level.
pub fn recommendation(
    level: RiskLevel,
    assessment: &PrerequisiteAssessment,
    subject_name: &str,
) -> String {
    let performances = &assessment.performances;
    match level {
        RiskLevel::VeryHigh => {
            let weak = first_two_names(performances.iter().filter(|p| p.grade_points < 2.0));
            if weak.is_empty() {
                format!("High risk. Consider strengthening your foundation before attempting {subject_name}.")
            } else {
                format!(
                    "High risk. Your performance in {weak} suggests you may struggle. \
                     Consider reviewing fundamental concepts or seeking tutoring before taking {subject_name}."
                )
            }
        }
        RiskLevel::High => {
            let weak = first_two_names(performances.iter().filter(|p| p.grade_points < 2.5));
            if !weak.is_empty() {
                format!(
                    "Moderate-high risk. Your {weak} grade(s) indicate potential challenges. \
                     Extra study effort recommended for {subject_name}."
                )
            } else if !assessment.missing.is_empty() {
                format!(
                    "Some prerequisite subjects not yet taken. Ensure you complete them before {subject_name}."
                )
            } else {
                format!("Moderate-high risk. Plan extra study time for {subject_name}.")
            }
        }
        RiskLevel::Medium => format!(
            "Moderate risk. You have adequate preparation but should maintain consistent effort in {subject_name}."
        ),
        RiskLevel::Low => {
            if performances.iter().any(|p| p.grade_points >= 3.3) {
                format!(
                    "Good preparation. Your strong performance in prerequisites suggests you're well-prepared for {subject_name}."
                )
            } else {
                format!("Low risk. You should do well in {subject_name} based on your background.")
            }
        }
        RiskLevel::Unknown => {
            if assessment.missing.is_empty() {
                "Limited data to make a prediction. This may be an entry-level subject.".to_string()
            } else {
                format!(
                    "No prerequisite data available. Complete prerequisites first: {}",
                    assessment.missing.join(", ")
                )
            }
        }
    }
}

/// Parsed record and derived whole-history features of one student.
#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub record: StudentRecord,
    pub features: StudentFeatures,
}

impl StudentProfile {
    pub fn new(record: StudentRecord) -> Self {
        let features = StudentFeatures::from_record(&record);
        Self { record, features }
    }
}

struct Draft {
    code: String,
    name: String,
    assessment: PrerequisiteAssessment,
    cohort_pass_rate: Option<f64>,
    cohort_avg_score: Option<f64>,
    vector: FeatureVector,
}

/// Per-subject and multi-subject success predictions for students.
pub struct SubjectPredictionService {
    graph: PrerequisiteGraph,
    history: Arc<dyn HistorySource>,
    cohort: RwLock<Arc<CohortStats>>,
    classifier: Option<Arc<dyn Classifier>>,
    profiles: BoundedCache<String, Arc<StudentProfile>>,
}

impl SubjectPredictionService {
    /// A service over the curated graph with no cohort statistics.
    pub fn new(history: Arc<dyn HistorySource>) -> Self {
        Self {
            graph: PrerequisiteGraph::curated(),
            history,
            cohort: RwLock::new(Arc::new(CohortStats::default())),
            classifier: None,
            profiles: BoundedCache::new(DEFAULT_MAX_ENTRIES),
        }
    }

    /// Histories and cohort statistics both taken from one dataset.
    pub fn from_dataset(dataset: Arc<HistoricalDataset>) -> Self {
        let stats = CohortStats::compute(dataset.rows());
        Self::new(dataset).with_cohort_stats(stats)
    }

    pub fn with_cohort_stats(self, stats: CohortStats) -> Self {
        *self.cohort.write() = Arc::new(stats);
        self
    }

    pub fn with_graph(mut self, graph: PrerequisiteGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_profile_cache(mut self, cache: BoundedCache<String, Arc<StudentProfile>>) -> Self {
        self.profiles = cache;
        self
    }

    pub fn graph(&self) -> &PrerequisiteGraph {
        &self.graph
    }

    pub fn classifier_name(&self) -> Option<&str> {
        self.classifier.as_deref().map(|c| c.name())
    }

    fn cohort(&self) -> Arc<CohortStats> {
        self.cohort.read().clone()
    }

    fn subject_name(cohort: &CohortStats, code: &str) -> String {
        cohort
            .subject_name(code)
            .or_else(|| catalog::course_name(code))
            .unwrap_or(code)
            .to_string()
    }

    /// Parsed record and features for `student_id`, cached.
    pub fn profile(&self, student_id: &str) -> Result<Arc<StudentProfile>> {
        self.profiles
            .get_or_try_insert_with(&student_id.to_string(), || {
                let raw = self
                    .history
                    .history(student_id)
                    .ok_or_else(|| PlannerError::not_found("student", student_id))?;
                let record = StudentRecord::from_raw(student_id, &raw);
                if !record.unparsable.is_empty() {
                    warn!(
                        student = student_id,
                        skipped = record.unparsable.len(),
                        "skipped unparsable history entries"
                    );
                }
                debug!(student = student_id, subjects = record.len(), "built student profile");
                Ok(Arc::new(StudentProfile::new(record)))
            })
    }

    fn draft(&self, profile: &StudentProfile, cohort: &CohortStats, code: &str) -> Draft {
        let name_of = |c: &str| Self::subject_name(cohort, c);
        let assessment = PrerequisiteAssessment::assess(&self.graph, &profile.record, code, name_of);
        let stats: Option<&SubjectCohortStats> = cohort.get(code);
        Draft {
            code: code.to_string(),
            name: Self::subject_name(cohort, code),
            cohort_pass_rate: stats.and_then(|s| s.pass_rate),
            cohort_avg_score: stats.and_then(|s| s.avg_score),
            vector: FeatureVector {
                subject_code: code.to_string(),
                student: profile.features.clone(),
                prerequisites: PrerequisiteFeatures::from(&assessment),
                cohort: CohortFeatures::from_stats(stats),
            },
            assessment,
        }
    }

    /// Classifier outputs aligned with `vectors`; `None` wherever the
    /// classifier is absent or failed.
    fn classify(&self, vectors: &[FeatureVector]) -> Vec<Option<ClassifierOutput>> {
        let Some(classifier) = self.classifier.as_deref() else {
            return vec![None; vectors.len()];
        };
        let outcome = match vectors {
            [single] => classifier.predict(single).map(|out| vec![out]),
            _ => classifier.predict_batch(vectors),
        };
        match outcome {
            Ok(outputs) if outputs.len() == vectors.len() => outputs.into_iter().map(Some).collect(),
            Ok(outputs) => {
                warn!(
                    classifier = classifier.name(),
                    expected = vectors.len(),
                    got = outputs.len(),
                    "classifier returned a mismatched batch, using rule-based predictions"
                );
                vec![None; vectors.len()]
            }
            Err(e) => {
                let error = format!("{e:#}");
                warn!(
                    classifier = classifier.name(),
                    %error,
                    "classifier failed, using rule-based predictions"
                );
                vec![None; vectors.len()]
            }
        }
    }

    fn finish(draft: Draft, classified: Option<ClassifierOutput>) -> SubjectPrediction {
        let (rule_probability, rule_level) = rule_estimate(&draft.assessment, draft.cohort_pass_rate);
        let (probability, level, method) = match &classified {
            Some(output) => {
                let (p, l) = fuse(rule_probability, output);
                (p, l, PredictionMethod::Hybrid)
            }
            None => (rule_probability, rule_level, PredictionMethod::RuleBased),
        };

        SubjectPrediction {
            recommendation: recommendation(level, &draft.assessment, &draft.name),
            subject_code: draft.code,
            subject_name: draft.name,
            risk_level: level,
            predicted_success_probability: probability,
            weighted_prereq_gpa: draft.assessment.weighted_gpa,
            prereq_performance: draft.assessment.performances,
            missing_prereqs: draft.assessment.missing,
            cohort_pass_rate: draft.cohort_pass_rate,
            cohort_avg_score: draft.cohort_avg_score,
            classifier_probability: classified.as_ref().map(|o| o.probability),
            classifier_confidence: classified.as_ref().map(|o| o.confidence),
            classifier_top_factors: classified.map(|o| o.top_factors).unwrap_or_default(),
            prediction_method: method,
        }
    }

    fn predict_for(&self, profile: &StudentProfile, codes: &[String]) -> Vec<SubjectPrediction> {
        let cohort = self.cohort();
        let drafts: Vec<Draft> = codes
            .iter()
            .map(|code| self.draft(profile, &cohort, code))
            .collect();
        let vectors: Vec<FeatureVector> = drafts.iter().map(|d| d.vector.clone()).collect();
        let classified = self.classify(&vectors);
        drafts
            .into_iter()
            .zip(classified)
            .map(|(draft, output)| Self::finish(draft, output))
            .collect()
    }

    /// Predict success in one subject.
    pub fn predict_subject(&self, student_id: &str, subject_code: &str) -> Result<SubjectPrediction> {
        let profile = self.profile(student_id)?;
        let mut predictions = self.predict_for(&profile, &[subject_code.to_string()]);
        predictions
            .pop()
            .ok_or_else(|| PlannerError::InvalidInput("empty prediction batch".into()))
    }

    /// Predict success in several subjects and order them for study.
    pub fn predict_subjects(
        &self,
        student_id: &str,
        subject_codes: &[String],
    ) -> Result<StudentPredictionReport> {
        let profile = self.profile(student_id)?;
        let predictions = self.predict_for(&profile, subject_codes);

        let high_risk_subjects = predictions
            .iter()
            .filter(|p| p.risk_level.is_high())
            .map(|p| p.subject_code.clone())
            .collect();

        let mut ordered: Vec<&SubjectPrediction> = predictions.iter().collect();
        ordered.sort_by_key(|p| p.risk_level.severity());
        let recommended_order = ordered.iter().map(|p| p.subject_code.clone()).collect();

        Ok(StudentPredictionReport {
            student_id: student_id.to_string(),
            current_gpa: profile.record.current_gpa(),
            predictions,
            high_risk_subjects,
            recommended_order,
        })
    }

    /// Transitive prerequisites of `subject_code`.
    pub fn get_prerequisite_chain(&self, subject_code: &str) -> Result<PrerequisiteChain> {
        let cohort = self.cohort();
        if !self.graph.contains_subject(subject_code) && cohort.get(subject_code).is_none() {
            return Err(PlannerError::not_found("subject", subject_code));
        }
        Ok(self
            .graph
            .chain(subject_code, |c| Self::subject_name(&cohort, c)))
    }

    pub fn get_cohort_stats(&self, subject_code: &str) -> Result<SubjectCohortStats> {
        let cohort = self.cohort();
        if cohort.is_empty() {
            return Err(PlannerError::DataUnavailable(
                "no cohort statistics loaded".into(),
            ));
        }
        cohort
            .get(subject_code)
            .cloned()
            .ok_or_else(|| PlannerError::not_found("subject", subject_code))
    }

    pub fn all_cohort_stats(&self) -> Arc<CohortStats> {
        self.cohort()
    }

    /// Recompute cohort statistics and swap them in atomically.
    pub fn reload_cohort_stats(&self, dataset: &HistoricalDataset) {
        let stats = Arc::new(CohortStats::compute(dataset.rows()));
        debug!(subjects = stats.len(), "reloaded cohort statistics");
        *self.cohort.write() = stats;
    }

    /// Drop the cached profile of one student.
    pub fn invalidate_student(&self, student_id: &str) -> bool {
        self.profiles.invalidate(&student_id.to_string())
    }

    pub fn profile_cache_stats(&self) -> CacheStats {
        self.profiles.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::dataset::HistoricalRow;
    use crate::history::RawHistory;

    struct ConstantClassifier {
        probability: f64,
        calls: AtomicUsize,
        fail: bool,
    }

    impl ConstantClassifier {
        fn new(probability: f64) -> Self {
            Self {
                probability,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    impl Classifier for ConstantClassifier {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<ClassifierOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model offline");
            }
            Ok(ClassifierOutput::from_probability(self.probability, vec![]))
        }
    }

    fn source(entries: &[(&str, &str)]) -> Arc<dyn HistorySource> {
        let map: HashMap<String, RawHistory> = entries
            .iter()
            .map(|(id, history)| (id.to_string(), RawHistory::Encoded(history.to_string())))
            .collect();
        Arc::new(map)
    }

    fn two_prereq_graph() -> PrerequisiteGraph {
        PrerequisiteGraph::from_edges([("T100", "A100", 0.9), ("T100", "B100", 0.4)]).unwrap()
    }

    fn row(student: &str, code: &str, grade: &str) -> HistoricalRow {
        HistoricalRow {
            student_id: student.into(),
            subject_code: code.into(),
            subject_name: Some(format!("Subject {code}")),
            grade: Some(grade.into()),
            overall_percentage: Some(60.0),
            coursework_percentage: None,
            exam_year: Some(2023),
            exam_month: Some(1),
        }
    }

    #[test]
    fn missing_prerequisite_penalizes_and_escalates() {
        let service = SubjectPredictionService::new(source(&[("s1", "A100:B+")]))
            .with_graph(two_prereq_graph());
        let p = service.predict_subject("s1", "T100").unwrap();
        assert!((p.weighted_prereq_gpa - 3.3).abs() < 1e-9);
        assert_eq!(p.missing_prereqs, vec!["B100"]);
        assert_eq!(p.risk_level, RiskLevel::Medium);
        let expected = (0.2 + 3.3 / 4.0 * 0.75) * 0.8;
        assert!((p.predicted_success_probability - expected).abs() < 1e-9);
        assert_eq!(p.prediction_method, PredictionMethod::RuleBased);
    }

    #[test]
    fn subject_without_prerequisites_or_cohort() {
        let service = SubjectPredictionService::new(source(&[("s1", "A100:A")]))
            .with_graph(two_prereq_graph());
        let p = service.predict_subject("s1", "ZZZ999").unwrap();
        assert_eq!(p.predicted_success_probability, 0.7);
        assert_eq!(p.risk_level, RiskLevel::Unknown);
        assert!(p.recommendation.contains("entry-level"));
    }

    #[test]
    fn cohort_pass_rate_blends_and_substitutes() {
        let rows = vec![
            row("x", "T100", "A"),
            row("y", "T100", "F"),
            row("x", "Q200", "A"),
            row("y", "Q200", "B"),
        ];
        let service = SubjectPredictionService::new(source(&[("s1", "A100:A,B100:A")]))
            .with_graph(two_prereq_graph())
            .with_cohort_stats(CohortStats::compute(&rows));

        let blended = service.predict_subject("s1", "T100").unwrap();
        let base = 0.2 + 0.75;
        assert!((blended.predicted_success_probability - (base * 0.7 + 0.5 * 0.3)).abs() < 1e-9);
        assert_eq!(blended.cohort_pass_rate, Some(0.5));
        assert_eq!(blended.risk_level, RiskLevel::Low);
        assert_eq!(blended.subject_name, "Subject T100");

        let fallback = service.predict_subject("s1", "Q200").unwrap();
        assert_eq!(fallback.predicted_success_probability, 1.0);
        assert_eq!(fallback.risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn ungraded_prerequisite_is_neither_present_nor_missing() {
        let service = SubjectPredictionService::new(source(&[("s1", "A100:EX,B100:C")]))
            .with_graph(two_prereq_graph());
        let p = service.predict_subject("s1", "T100").unwrap();
        assert!(p.missing_prereqs.is_empty());
        assert_eq!(p.prereq_performance.len(), 1);
        assert!((p.weighted_prereq_gpa - 2.0).abs() < 1e-9);
        assert_eq!(p.risk_level, RiskLevel::High);
    }

    #[test]
    fn fusion_with_classifier() {
        let output = ClassifierOutput::from_probability(0.9, vec![]);
        let (p, level) = fuse(0.6, &output);
        assert!((p - 0.81).abs() < 1e-9);
        assert_eq!(level, RiskLevel::Low);
    }

    #[test]
    fn hybrid_prediction_carries_classifier_fields() {
        let classifier = Arc::new(ConstantClassifier::new(0.55));
        let service = SubjectPredictionService::new(source(&[("s1", "A100:A,B100:A")]))
            .with_graph(two_prereq_graph())
            .with_classifier(classifier.clone());
        let p = service.predict_subject("s1", "T100").unwrap();
        assert_eq!(p.prediction_method, PredictionMethod::Hybrid);
        assert_eq!(p.risk_level, RiskLevel::High);
        assert_eq!(p.classifier_probability, Some(0.55));
        assert!((p.classifier_confidence.unwrap() - 0.1).abs() < 1e-9);
        assert!((p.predicted_success_probability - (0.55 * 0.7 + 0.95 * 0.3)).abs() < 1e-9);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_classifier_degrades_to_rule_based() {
        let classifier = Arc::new(ConstantClassifier {
            fail: true,
            ..ConstantClassifier::new(0.9)
        });
        let service = SubjectPredictionService::new(source(&[("s1", "A100:A")]))
            .with_graph(two_prereq_graph())
            .with_classifier(classifier);
        let report = service
            .predict_subjects("s1", &["T100".to_string(), "A100".to_string()])
            .unwrap();
        assert!(report
            .predictions
            .iter()
            .all(|p| p.prediction_method == PredictionMethod::RuleBased));
    }

    #[test]
    fn batch_matches_single_predictions() {
        let classifier = Arc::new(ConstantClassifier::new(0.7));
        let service = SubjectPredictionService::new(source(&[("s1", "A100:C,B100:D")]))
            .with_graph(two_prereq_graph())
            .with_classifier(classifier);
        let codes = vec!["T100".to_string(), "B100".to_string()];
        let report = service.predict_subjects("s1", &codes).unwrap();
        for (code, batched) in codes.iter().zip(&report.predictions) {
            let single = service.predict_subject("s1", code).unwrap();
            assert_eq!(&single, batched);
        }
    }

    #[test]
    fn report_orders_by_severity() {
        let graph = PrerequisiteGraph::from_edges([
            ("EASY", "P1", 1.0),
            ("HARD", "P2", 1.0),
            ("MID", "P3", 1.0),
        ])
        .unwrap();
        let service = SubjectPredictionService::new(source(&[("s1", "P1:A,P2:F,P3:B")]))
            .with_graph(graph);
        let codes: Vec<String> = ["HARD", "NEW", "MID", "EASY"].iter().map(|s| s.to_string()).collect();
        let report = service.predict_subjects("s1", &codes).unwrap();
        assert_eq!(report.recommended_order, vec!["EASY", "NEW", "MID", "HARD"]);
        assert_eq!(report.high_risk_subjects, vec!["HARD"]);
        assert!((report.current_gpa - (4.0 + 0.0 + 3.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_student_is_not_found() {
        let service = SubjectPredictionService::new(source(&[]));
        let err = service.predict_subject("ghost", "CSC1024").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn cache_hits_return_identical_results() {
        let service = SubjectPredictionService::new(source(&[("s1", "CSC1024:A,PRG1203:B")]));
        let first = service.predict_subject("s1", "PRG2104").unwrap();
        let second = service.predict_subject("s1", "PRG2104").unwrap();
        assert_eq!(first, second);
        let stats = service.profile_cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        assert!(service.invalidate_student("s1"));
        let third = service.predict_subject("s1", "PRG2104").unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn chain_of_curated_subject() {
        let service = SubjectPredictionService::new(source(&[]));
        let chain = service.get_prerequisite_chain("PRG2104").unwrap();
        assert_eq!(chain.subject_name, "Object-Oriented Programming");
        assert!(chain.direct_prerequisites.iter().any(|p| p.code == "PRG1203"));
        assert!(chain.full_chain.iter().all(|e| e.depth >= 1 && e.depth <= 6));
        assert!(service.get_prerequisite_chain("NOPE999").unwrap_err().is_not_found());
    }

    #[test]
    fn cohort_stats_lookup_and_reload() {
        let service = SubjectPredictionService::new(source(&[]));
        assert!(matches!(
            service.get_cohort_stats("T100"),
            Err(PlannerError::DataUnavailable(_))
        ));

        let dataset = HistoricalDataset::from_rows(vec![row("a", "T100", "B"), row("b", "T100", "D")]);
        service.reload_cohort_stats(&dataset);
        let stats = service.get_cohort_stats("T100").unwrap();
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.pass_rate, Some(0.5));
        assert!(service.get_cohort_stats("X1").unwrap_err().is_not_found());
        assert_eq!(service.all_cohort_stats().len(), 1);
    }

    #[test]
    fn recommendation_texts() {
        let weak = PrerequisiteAssessment {
            total: 2,
            performances: vec![PrerequisitePerformance {
                prereq_code: "A100".into(),
                prereq_name: "Algebra".into(),
                grade: "D".into(),
                grade_points: 1.0,
                weight: 1.0,
                impact: 1.0,
            }],
            missing: vec!["B100".into()],
            total_weight: 1.0,
            weighted_gpa: 1.0,
        };
        assert!(recommendation(RiskLevel::VeryHigh, &weak, "Calculus").contains("Algebra"));
        assert!(recommendation(RiskLevel::High, &weak, "Calculus").contains("Algebra"));
        assert!(recommendation(RiskLevel::Unknown, &weak, "Calculus").contains("B100"));
        assert!(recommendation(RiskLevel::Low, &weak, "Calculus").starts_with("Low risk"));
    }

    #[test]
    fn escalation_and_severity() {
        assert_eq!(RiskLevel::Low.escalate(), RiskLevel::Medium);
        assert_eq!(RiskLevel::Medium.escalate(), RiskLevel::High);
        assert_eq!(RiskLevel::High.escalate(), RiskLevel::High);
        assert_eq!(RiskLevel::Unknown.escalate(), RiskLevel::Unknown);
        assert_eq!(RiskLevel::Unknown.severity(), RiskLevel::Medium.severity());
        assert_eq!(RiskLevel::VeryHigh.to_string(), "very_high");
        assert_eq!(
            serde_json::to_string(&PredictionMethod::RuleBased).unwrap(),
            "\"rule-based\""
        );
    }
}
