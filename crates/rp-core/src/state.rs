//! The planning-state object.
//!
//! One `PlanningState` carries both the user's inputs and every derived
//! output. The engine rewrites the derived fields on each recompute; the
//! input fields are only touched by reconciliation, which preserves user
//! decisions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::catalog::unique_ids;
use crate::types::{
    EvidenceSummary, Mechanism, PriorEvidenceEntry, ReliabilityPlan, ResidualRiskEntry,
    ScheduleStats, ScheduleStrategy, ScheduleTask, ScoreOverride, SelectedTest, TestScore,
    WeekendShift,
};
use crate::{Error, Result};

/// Product context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductContext {
    pub name: Option<String>,
    pub safety_critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumidityLevel {
    Low,
    Medium,
    High,
}

/// Environmental exposure class of the mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    Indoor,
    Outdoor,
    Salt,
    Mixed,
    Industrial,
}

impl Exposure {
    /// Salt and mixed exposures route ingress testing to the chemical lab.
    pub fn is_corrosive(self) -> bool {
        matches!(self, Exposure::Salt | Exposure::Mixed)
    }
}

/// Mission profile. Every field is optional until the user fills it in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionProfile {
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub humidity_level: Option<HumidityLevel>,
    pub humidity_pct: Option<f64>,
    pub service_life_years: Option<f64>,
    pub duty_cycle_pct: Option<f64>,
    pub exposure: Option<Exposure>,
}

impl MissionProfile {
    /// The six fields a complete mission profile must populate.
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "temp_min_c",
        "temp_max_c",
        "humidity",
        "service_life_years",
        "duty_cycle_pct",
        "exposure",
    ];

    /// Required fields that are still missing, in `REQUIRED_FIELDS` order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.temp_min_c.is_some(),
            self.temp_max_c.is_some(),
            self.humidity_level.is_some() || self.humidity_pct.is_some(),
            self.service_life_years.is_some(),
            self.duty_cycle_pct.is_some(),
            self.exposure.is_some(),
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, p)| !p)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Materials chosen for the product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSelection {
    /// Housing material id; its activation energy seeds thermal models.
    pub housing: Option<String>,
}

/// A failure mode as selected and rated by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureModeSelection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mechanism_ids: Vec<String>,
    #[serde(default)]
    pub selected: bool,
    pub severity: u8,
    pub occurrence: u8,
    pub detection: u8,
}

/// Scheduling inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub strategy: ScheduleStrategy,
    pub start_date: Option<NaiveDate>,
    pub weekend_shift: WeekendShift,
}

// ---------------------------------------------------------------------------
// Coverage report
// ---------------------------------------------------------------------------

/// Readiness dimension scored by the coverage scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageDimension {
    MissionCompleteness,
    MechanismCoverage,
    FailureModeCoverage,
    Mapping,
    AccelerationValidity,
    ResidualDeclaration,
}

/// Planning step the user should revisit to close a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStep {
    Mission,
    Mechanisms,
    FailureModes,
    Tests,
    Acceleration,
    ResidualRisk,
    Evidence,
}

/// Points earned in one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: CoverageDimension,
    pub earned: f64,
    pub max: f64,
    /// Named gaps, most important first.
    pub gaps: Vec<String>,
}

/// One recommended remediation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixItem {
    /// `None` for items that are not tied to a scored dimension.
    pub dimension: Option<CoverageDimension>,
    pub points: f64,
    pub message: String,
    pub step: PlanningStep,
}

/// Overall plan coverage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total: f64,
    pub dimensions: Vec<DimensionScore>,
    pub fix_list: Vec<FixItem>,
}

// ---------------------------------------------------------------------------
// Verification rows
// ---------------------------------------------------------------------------

/// Verification-requirement record generated for a kept test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvprRow {
    pub test_id: String,
    pub test_name: String,
    pub mechanisms: Vec<String>,
    pub acceptance_criterion: String,
    pub sample_size: u32,
    pub duration_weeks: f64,
    pub af: f64,
    pub equiv_years: f64,
    pub tier: Option<u8>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The whole planning state: inputs followed by derived outputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningState {
    pub product: ProductContext,
    pub mission: MissionProfile,
    pub materials: MaterialSelection,
    pub mechanisms: Vec<Mechanism>,
    pub failure_modes: Vec<FailureModeSelection>,
    pub prior_evidence: BTreeMap<String, PriorEvidenceEntry>,
    pub reliability_plan: ReliabilityPlan,
    pub schedule: ScheduleSettings,
    pub tests: Vec<SelectedTest>,
    pub score_overrides: BTreeMap<String, ScoreOverride>,

    // Derived.
    pub evidence: BTreeMap<String, EvidenceSummary>,
    pub scores: BTreeMap<String, TestScore>,
    pub residual_risk: BTreeMap<String, ResidualRiskEntry>,
    pub coverage: Option<CoverageReport>,
    pub dvpr_rows: Vec<DvprRow>,
    pub schedule_tasks: Vec<ScheduleTask>,
    pub schedule_stats: Option<ScheduleStats>,
    pub plan_warnings: Vec<String>,
}

impl PlanningState {
    /// Load a state from JSON or YAML (chosen by file extension).
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let state: PlanningState = if ext == "yaml" || ext == "yml" {
            serde_yaml_ng::from_slice(&bytes)?
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(state)
    }

    pub fn selected_mechanisms(&self) -> impl Iterator<Item = &Mechanism> {
        self.mechanisms.iter().filter(|m| m.selected)
    }

    pub fn selected_failure_modes(&self) -> impl Iterator<Item = &FailureModeSelection> {
        self.failure_modes.iter().filter(|f| f.selected)
    }

    pub fn kept_tests(&self) -> impl Iterator<Item = &SelectedTest> {
        self.tests.iter().filter(|t| t.is_kept())
    }

    /// Structural checks the engine itself does not enforce.
    ///
    /// Numeric out-of-range inputs are not errors here: the engine clamps
    /// them and attaches warnings.
    pub fn validate(&self) -> Result<()> {
        unique_ids("mechanism", self.mechanisms.iter().map(|m| m.id.as_str()))?;
        unique_ids("failure mode", self.failure_modes.iter().map(|f| f.id.as_str()))?;
        unique_ids("test", self.tests.iter().map(|t| t.id.as_str()))?;

        let known: HashSet<&str> = self.mechanisms.iter().map(|m| m.id.as_str()).collect();
        for t in &self.tests {
            if let Some(m) = t.mechanism_ids.iter().find(|m| !known.contains(m.as_str())) {
                return Err(Error::Validation(format!(
                    "test '{}' links unknown mechanism '{}'",
                    t.id, m
                )));
            }
        }
        for mechanism_id in self.residual_risk.keys() {
            if !known.contains(mechanism_id.as_str()) {
                return Err(Error::Validation(format!(
                    "residual-risk entry for unknown mechanism '{}'",
                    mechanism_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_in_order() {
        let mission = MissionProfile {
            temp_max_c: Some(85.0),
            humidity_pct: Some(70.0),
            ..Default::default()
        };
        assert_eq!(
            mission.missing_fields(),
            vec!["temp_min_c", "service_life_years", "duty_cycle_pct", "exposure"]
        );
        assert!(MissionProfile {
            temp_min_c: Some(-40.0),
            temp_max_c: Some(85.0),
            humidity_level: Some(HumidityLevel::High),
            service_life_years: Some(10.0),
            duty_cycle_pct: Some(50.0),
            exposure: Some(Exposure::Salt),
            ..Default::default()
        }
        .missing_fields()
        .is_empty());
    }

    #[test]
    fn test_empty_state_deserializes() {
        let s: PlanningState = serde_json::from_str("{}").unwrap();
        assert!(s.tests.is_empty());
        assert_eq!(s.reliability_plan.target_reliability, 0.9);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_start_date_round_trips_as_iso() {
        let s: ScheduleSettings = serde_json::from_value(serde_json::json!({
            "strategy": "parallel-by-stressor",
            "start_date": "2026-03-07"
        }))
        .unwrap();
        assert_eq!(s.strategy, ScheduleStrategy::ParallelByStressor);
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2026, 3, 7));
        assert_eq!(s.weekend_shift, WeekendShift::StartDate);

        let s: ScheduleSettings =
            serde_json::from_value(serde_json::json!({ "weekend_shift": "every-task" })).unwrap();
        assert_eq!(s.weekend_shift, WeekendShift::EveryTask);
    }

    #[test]
    fn test_validate_rejects_dangling_link() {
        let s: PlanningState = serde_json::from_value(serde_json::json!({
            "mechanisms": [{ "id": "creep-relaxation", "name": "Creep" }],
            "tests": [{
                "id": "hts", "name": "High-temp storage", "duration_weeks": 6.0,
                "mechanism_ids": ["thermal-aging"]
            }]
        }))
        .unwrap();
        assert!(matches!(s.validate(), Err(Error::Validation(_))));
    }
}
