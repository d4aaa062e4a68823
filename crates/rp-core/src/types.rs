//! Common data types for RelPlan
//!
//! Everything here is plain data: the engine crates derive the computed
//! fields, the presentation and export layers only read them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Mechanisms
// ---------------------------------------------------------------------------

/// How well a failure mechanism is understood for this product.
///
/// Declaration order is also severity order: `Assumed` is the worst case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Backed by field data or prior qualification.
    High,
    /// Backed by engineering analysis.
    #[default]
    Medium,
    /// Not substantiated.
    Assumed,
}

/// A candidate failure mechanism, synced from the reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub confidence: Confidence,
}

// ---------------------------------------------------------------------------
// Prior evidence
// ---------------------------------------------------------------------------

/// Beta prior family used for evidence fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorType {
    /// Beta(0.5, 0.5).
    #[default]
    Jeffreys,
    /// Beta(1, 1).
    Uniform,
}

impl PriorType {
    /// Prior pseudo-counts `(alpha0, beta0)`.
    pub fn pseudo_counts(self) -> (f64, f64) {
        match self {
            PriorType::Jeffreys => (0.5, 0.5),
            PriorType::Uniform => (1.0, 1.0),
        }
    }
}

/// Historical test record for one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorEvidenceEntry {
    /// Prior trials.
    #[serde(default)]
    pub n_prev: u32,
    /// Prior failures.
    #[serde(default)]
    pub f_prev: u32,
    /// Relevance of the prior population, 0..=100.
    #[serde(default = "default_similarity_pct")]
    pub similarity_pct: f64,
    #[serde(default)]
    pub prior_type: PriorType,
}

fn default_similarity_pct() -> f64 {
    100.0
}

/// Summary risk badge derived from the posterior upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceBadge {
    #[default]
    None,
    Low,
    Med,
    High,
}

/// Evidence fusion output for one test.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub n_prev: u32,
    pub f_prev: u32,
    pub similarity_pct: f64,
    pub prior_type: PriorType,
    /// Similarity-weighted trials (0 when there is no evidence).
    pub n_eff: f64,
    /// Similarity-weighted failures (0 when there is no evidence).
    pub f_eff: f64,
    /// Posterior Beta parameters, absent without evidence.
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub mean_fail_prob: Option<f64>,
    pub upper_fail_prob_95: Option<f64>,
    pub badge: EvidenceBadge,
}

// ---------------------------------------------------------------------------
// Acceleration
// ---------------------------------------------------------------------------

/// Physical acceleration model applied to a stress test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccelerationModel {
    Arrhenius,
    CoffinManson,
    Peck,
    Eyring,
    #[default]
    None,
}

impl AccelerationModel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccelerationModel::Arrhenius => "arrhenius",
            AccelerationModel::CoffinManson => "coffin-manson",
            AccelerationModel::Peck => "peck",
            AccelerationModel::Eyring => "eyring",
            AccelerationModel::None => "none",
        }
    }
}

/// Resolved stress parameters. Temperatures in kelvin, deltas in °C,
/// humidity in %RH, activation energy in eV.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelParams {
    pub t_use_k: f64,
    pub t_stress_k: f64,
    pub delta_t_use: f64,
    pub delta_t_stress: f64,
    pub rh_use: f64,
    pub rh_stress: f64,
    pub ea: f64,
    /// Coffin-Manson exponent.
    pub n: f64,
    /// Humidity exponent (Peck or Eyring).
    pub m: f64,
}

/// User-supplied values that replace derived defaults when `enabled`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelOverrides {
    pub enabled: bool,
    pub t_use_k: Option<f64>,
    pub t_stress_k: Option<f64>,
    pub delta_t_use: Option<f64>,
    pub delta_t_stress: Option<f64>,
    pub rh_use: Option<f64>,
    pub rh_stress: Option<f64>,
    pub ea: Option<f64>,
    pub n: Option<f64>,
    pub m: Option<f64>,
}

/// How strongly a warning should gate the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Info,
    Warn,
    Block,
}

/// A validity warning attached to a test's acceleration result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelWarning {
    pub severity: WarningSeverity,
    pub message: String,
}

impl AccelWarning {
    pub fn new(severity: WarningSeverity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
}

impl std::fmt::Display for AccelWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Acceleration annotation of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationInfo {
    pub model: AccelerationModel,
    pub params: AccelParams,
    pub user_overrides: AccelOverrides,
    pub af: f64,
    pub equiv_years: f64,
    pub warnings: Vec<AccelWarning>,
}

impl Default for AccelerationInfo {
    fn default() -> Self {
        Self {
            model: AccelerationModel::None,
            params: AccelParams::default(),
            user_overrides: AccelOverrides::default(),
            af: 1.0,
            equiv_years: 0.0,
            warnings: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Minimum score for tier 1.
pub const TIER1_MIN_SCORE: u8 = 60;
/// Minimum score for tier 2.
pub const TIER2_MIN_SCORE: u8 = 30;

/// Severity × likelihood × detectability risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScore {
    pub severity: u8,
    pub likelihood: u8,
    pub detectability: u8,
    pub score: u8,
    pub tier: u8,
}

impl TestScore {
    /// Build a score from its three factors, each clamped to 1..=5.
    pub fn new(severity: u8, likelihood: u8, detectability: u8) -> Self {
        let severity = severity.clamp(1, 5);
        let likelihood = likelihood.clamp(1, 5);
        let detectability = detectability.clamp(1, 5);
        let score = severity * likelihood * detectability;
        let tier = if score >= TIER1_MIN_SCORE {
            1
        } else if score >= TIER2_MIN_SCORE {
            2
        } else {
            3
        };
        Self { severity, likelihood, detectability, score, tier }
    }
}

/// User-entered score factors. Any present field wins over derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreOverride {
    pub severity: Option<u8>,
    pub likelihood: Option<u8>,
    pub detectability: Option<u8>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// How much of a mechanism a test exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl CoverageLevel {
    /// Medium or high coverage counts as substantive.
    pub fn is_substantive(self) -> bool {
        matches!(self, CoverageLevel::High | CoverageLevel::Medium)
    }
}

/// Lifecycle status of a selected test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Keep,
    Downgrade,
    Remove,
}

impl TestStatus {
    /// Kept and downgraded tests are still executed.
    pub fn is_kept(self) -> bool {
        !matches!(self, TestStatus::Remove)
    }
}

/// Physical stress applied by a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stressor {
    Temperature,
    ThermalCycling,
    Humidity,
    Vibration,
    Shock,
    Chemical,
    Dust,
    ContactMotion,
    Mechanical,
}

/// Stress profile of a test.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StressProfile {
    pub stressors: Vec<Stressor>,
    pub description: Option<String>,
}

impl StressProfile {
    pub fn has(&self, stressor: Stressor) -> bool {
        self.stressors.contains(&stressor)
    }
}

/// A test in the plan: catalog-derived fields plus user decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedTest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mechanism_ids: Vec<String>,
    #[serde(default)]
    pub coverage: CoverageLevel,
    pub duration_weeks: f64,
    #[serde(default = "default_cost_level")]
    pub cost_level: u8,
    #[serde(default)]
    pub status: TestStatus,
    /// Kept in the plan even when no selected mechanism links it any more.
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub acceleration: AccelerationInfo,
    #[serde(default)]
    pub stress: StressProfile,
    #[serde(default)]
    pub sample_size_override: Option<u32>,
    /// Duration from the verification-requirement row, if the user edited it.
    #[serde(default)]
    pub duration_override_weeks: Option<f64>,
}

fn default_cost_level() -> u8 {
    2
}

impl SelectedTest {
    pub fn is_kept(&self) -> bool {
        self.status.is_kept()
    }

    /// Duration used for scheduling and equivalent-life calculations.
    pub fn effective_duration_weeks(&self) -> f64 {
        self.duration_override_weeks.unwrap_or(self.duration_weeks)
    }

    pub fn links(&self, mechanism_id: &str) -> bool {
        self.mechanism_ids.iter().any(|m| m == mechanism_id)
    }
}

// ---------------------------------------------------------------------------
// Residual risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Covered {
    Yes,
    Partial,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualLevel {
    Low,
    Medium,
    High,
}

/// Residual risk of one mechanism after the kept tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualRiskEntry {
    pub mechanism_id: String,
    pub covered: Covered,
    pub residual: ResidualLevel,
    #[serde(default)]
    pub mitigations: String,
}

impl ResidualRiskEntry {
    pub fn has_mitigations(&self) -> bool {
        !self.mitigations.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reliability plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReliabilityMethod {
    #[default]
    Binomial,
    WeibullBasic,
}

/// Plan-level reliability demonstration target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityPlan {
    pub target_reliability: f64,
    pub confidence: f64,
    pub allowed_failures: u32,
    pub method: ReliabilityMethod,
    pub required_sample_size: Option<u32>,
}

impl Default for ReliabilityPlan {
    fn default() -> Self {
        Self {
            target_reliability: 0.9,
            confidence: 0.9,
            allowed_failures: 0,
            method: ReliabilityMethod::Binomial,
            required_sample_size: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Shared lab resource whose tasks queue against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceLane {
    Thermal,
    Humidity,
    Vibration,
    Mechanical,
    Chemical,
}

impl std::fmt::Display for ResourceLane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceLane::Thermal => "Thermal",
            ResourceLane::Humidity => "Humidity",
            ResourceLane::Vibration => "Vibration",
            ResourceLane::Mechanical => "Mechanical",
            ResourceLane::Chemical => "Chemical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStrategy {
    #[default]
    Sequential,
    ParallelByStressor,
}

/// Which days the scheduler checks for a weekend when a start date is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekendShift {
    /// Only day 0. A weekend start date pushes the whole timeline to Monday.
    #[default]
    StartDate,
    /// Every task's own start day.
    EveryTask,
}

/// One scheduled test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub id: String,
    pub test_id: String,
    pub duration_days: u32,
    pub dependencies: Vec<String>,
    pub resource_lane: ResourceLane,
    pub earliest_start_day: u32,
    pub latest_finish_day: u32,
}

/// Utilization summary of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub sequential_days: u32,
    pub current_days: u32,
    pub savings_pct: u32,
    pub critical_lane: Option<ResourceLane>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_tiers() {
        assert_eq!(TestScore::new(5, 4, 3).tier, 1);
        assert_eq!(TestScore::new(5, 4, 3).score, 60);
        assert_eq!(TestScore::new(3, 2, 5).tier, 2);
        assert_eq!(TestScore::new(3, 3, 3).tier, 3);
        assert_eq!(TestScore::new(5, 5, 5).score, 125);
    }

    #[test]
    fn test_score_clamps_factors() {
        let s = TestScore::new(0, 9, 3);
        assert_eq!((s.severity, s.likelihood, s.detectability), (1, 5, 3));
    }

    #[test]
    fn test_confidence_worst_case_ordering() {
        let worst = [Confidence::High, Confidence::Assumed, Confidence::Medium]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(worst, Confidence::Assumed);
        assert!(Confidence::Medium > Confidence::High);
    }

    #[test]
    fn test_missing_confidence_defaults_to_medium() {
        assert_eq!(Confidence::default(), Confidence::Medium);
        let m: Mechanism =
            serde_json::from_value(serde_json::json!({"id": "creep", "name": "Creep"})).unwrap();
        assert_eq!(m.confidence, Confidence::Medium);
        assert!(!m.selected);
    }

    #[test]
    fn test_model_serde_names() {
        let s = serde_json::to_string(&AccelerationModel::CoffinManson).unwrap();
        assert_eq!(s, "\"coffin-manson\"");
        let m: AccelerationModel = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(m, AccelerationModel::None);
    }

    #[test]
    fn test_effective_duration_prefers_override() {
        let mut t: SelectedTest = serde_json::from_value(serde_json::json!({
            "id": "hast", "name": "HAST", "duration_weeks": 2.0
        }))
        .unwrap();
        assert_eq!(t.effective_duration_weeks(), 2.0);
        assert!(t.is_kept());
        t.duration_override_weeks = Some(3.0);
        assert_eq!(t.effective_duration_weeks(), 3.0);
    }
}
