//! Plan readiness score and remediation list.
//!
//! Six dimensions are scored independently and summed to a 0–100 total.
//! Weights and thresholds are heuristic.

use rp_core::{
    CoverageDimension, CoverageReport, DimensionScore, EvidenceBadge, FixItem, PlanningState,
    PlanningStep, Stressor, WarningSeverity,
};

use crate::acceleration::AccelerationContext;
use crate::config::AccelerationConfig;

pub const MISSION_MAX: f64 = 20.0;
pub const MECHANISM_MAX: f64 = 25.0;
pub const FAILURE_MODE_MAX: f64 = 15.0;
pub const MAPPING_MAX: f64 = 20.0;
pub const ACCELERATION_MAX: f64 = 10.0;
pub const RESIDUAL_MAX: f64 = 10.0;

/// `(minimum selected, points)`, best tier first.
pub const MECHANISM_TIERS: [(usize, f64); 3] = [(6, 25.0), (4, 15.0), (1, 5.0)];
pub const FAILURE_MODE_TIERS: [(usize, f64); 3] = [(5, 15.0), (3, 8.0), (1, 4.0)];

/// Mapping keeps half credit while at most this many mechanisms lack a test.
pub const MAPPING_PARTIAL_MAX_MISSING: usize = 2;
pub const MAPPING_PARTIAL_POINTS: f64 = 10.0;
/// Mission humidity (%RH) at which a humidity test is expected.
pub const HUMID_MISSION_RH: f64 = 60.0;
pub const HUMIDITY_GAP_PENALTY: f64 = 5.0;

pub const ACCELERATION_WARNED_POINTS: f64 = 5.0;

/// Longest fix list reported.
pub const FIX_LIST_LIMIT: usize = 6;

fn tiered_points(count: usize, tiers: &[(usize, f64)]) -> f64 {
    tiers.iter().find(|(min, _)| count >= *min).map(|(_, pts)| *pts).unwrap_or(0.0)
}

fn next_tier(count: usize, tiers: &[(usize, f64)]) -> Option<usize> {
    tiers.iter().rev().map(|(min, _)| *min).find(|min| count < *min)
}

/// A scored dimension plus the step that would close its gaps.
struct Scored {
    score: DimensionScore,
    step: PlanningStep,
}

fn dimension(
    dimension: CoverageDimension,
    earned: f64,
    max: f64,
    gaps: Vec<String>,
    step: PlanningStep,
) -> Scored {
    Scored { score: DimensionScore { dimension, earned: earned.clamp(0.0, max), max, gaps }, step }
}

fn mission_completeness(state: &PlanningState) -> Scored {
    let missing = state.mission.missing_fields();
    let total = rp_core::MissionProfile::REQUIRED_FIELDS.len();
    let earned = MISSION_MAX * (total - missing.len()) as f64 / total as f64;
    let gaps = missing.iter().map(|f| format!("mission field '{}' is missing", f)).collect();
    dimension(CoverageDimension::MissionCompleteness, earned, MISSION_MAX, gaps, PlanningStep::Mission)
}

fn mechanism_coverage(state: &PlanningState) -> Scored {
    let n = state.selected_mechanisms().count();
    let earned = tiered_points(n, &MECHANISM_TIERS);
    let gaps = next_tier(n, &MECHANISM_TIERS)
        .map(|want| vec![format!("{} mechanisms selected; select at least {}", n, want)])
        .unwrap_or_default();
    dimension(CoverageDimension::MechanismCoverage, earned, MECHANISM_MAX, gaps, PlanningStep::Mechanisms)
}

fn failure_mode_coverage(state: &PlanningState) -> Scored {
    let n = state.selected_failure_modes().count();
    let earned = tiered_points(n, &FAILURE_MODE_TIERS);
    let gaps = next_tier(n, &FAILURE_MODE_TIERS)
        .map(|want| vec![format!("{} failure modes selected; select at least {}", n, want)])
        .unwrap_or_default();
    dimension(
        CoverageDimension::FailureModeCoverage,
        earned,
        FAILURE_MODE_MAX,
        gaps,
        PlanningStep::FailureModes,
    )
}

fn mapping(state: &PlanningState, accel: &AccelerationConfig) -> Scored {
    let selected: Vec<_> = state.selected_mechanisms().collect();
    let uncovered: Vec<_> = selected
        .iter()
        .filter(|m| !state.kept_tests().any(|t| t.links(&m.id)))
        .collect();

    let mut gaps: Vec<String> = uncovered
        .iter()
        .map(|m| format!("mechanism '{}' has no kept test", m.name))
        .collect();
    let mut earned = if selected.is_empty() {
        gaps.push("no mechanisms selected to map".to_string());
        0.0
    } else if uncovered.is_empty() {
        MAPPING_MAX
    } else if uncovered.len() <= MAPPING_PARTIAL_MAX_MISSING {
        MAPPING_PARTIAL_POINTS
    } else {
        0.0
    };

    let humid = mission_rh(state, accel).is_some_and(|rh| rh >= HUMID_MISSION_RH);
    if humid && !state.kept_tests().any(|t| t.stress.has(Stressor::Humidity)) {
        earned -= HUMIDITY_GAP_PENALTY;
        gaps.push(format!(
            "mission humidity is at least {:.0}% but no humidity test is kept",
            HUMID_MISSION_RH
        ));
    }
    dimension(CoverageDimension::Mapping, earned, MAPPING_MAX, gaps, PlanningStep::Tests)
}

/// Mission RH only when the user stated a humidity.
fn mission_rh(state: &PlanningState, accel: &AccelerationConfig) -> Option<f64> {
    let m = &state.mission;
    if m.humidity_pct.is_none() && m.humidity_level.is_none() {
        return None;
    }
    Some(AccelerationContext { mission: m, housing_ea: None, cfg: accel }.rh_use())
}

fn acceleration_validity(state: &PlanningState) -> Scored {
    let mut warned: Vec<(bool, String)> = state
        .kept_tests()
        .flat_map(|t| {
            t.acceleration.warnings.iter().map(move |w| {
                (w.severity == WarningSeverity::Block, format!("test '{}': {}", t.name, w.message))
            })
        })
        .collect();
    // Blocking warnings first.
    warned.sort_by_key(|(blocks, _)| !*blocks);
    let blocked = warned.first().is_some_and(|(blocks, _)| *blocks);

    let earned = if blocked {
        0.0
    } else if !warned.is_empty() {
        ACCELERATION_WARNED_POINTS
    } else {
        ACCELERATION_MAX
    };
    dimension(
        CoverageDimension::AccelerationValidity,
        earned,
        ACCELERATION_MAX,
        warned.into_iter().map(|(_, g)| g).collect(),
        PlanningStep::Acceleration,
    )
}

fn residual_declaration(state: &PlanningState) -> Scored {
    let selected: Vec<_> = state.selected_mechanisms().collect();
    let mut gaps = Vec::new();
    let mut declared = 0usize;
    for m in &selected {
        match state.residual_risk.get(&m.id) {
            Some(e) if e.residual == rp_core::ResidualLevel::Low || e.has_mitigations() => {
                declared += 1;
            }
            _ => gaps.push(format!("mechanism '{}' needs mitigations for its residual risk", m.name)),
        }
    }
    let earned = if selected.is_empty() {
        0.0
    } else {
        RESIDUAL_MAX * declared as f64 / selected.len() as f64
    };
    dimension(
        CoverageDimension::ResidualDeclaration,
        earned,
        RESIDUAL_MAX,
        gaps,
        PlanningStep::ResidualRisk,
    )
}

/// Kept tier-1 tests with no usable prior evidence.
fn tier1_without_evidence(state: &PlanningState) -> Vec<&str> {
    state
        .kept_tests()
        .filter(|t| state.scores.get(&t.id).is_some_and(|s| s.tier == 1))
        .filter(|t| {
            state.evidence.get(&t.id).is_none_or(|e| e.badge == EvidenceBadge::None)
        })
        .map(|t| t.id.as_str())
        .collect()
}

/// Score the plan. Reads tests, acceleration annotations, residual risk,
/// scores and evidence from `state`; writes nothing.
pub fn score_coverage(state: &PlanningState, accel: &AccelerationConfig) -> CoverageReport {
    let scored = [
        mission_completeness(state),
        mechanism_coverage(state),
        failure_mode_coverage(state),
        mapping(state, accel),
        acceleration_validity(state),
        residual_declaration(state),
    ];
    let total: f64 = scored.iter().map(|s| s.score.earned).sum();

    let mut ranked: Vec<&Scored> =
        scored.iter().filter(|s| s.score.max - s.score.earned > 0.0).collect();
    // Stable: ties keep dimension order.
    ranked.sort_by(|a, b| {
        let ga = a.score.max - a.score.earned;
        let gb = b.score.max - b.score.earned;
        gb.total_cmp(&ga)
    });

    let mut fix_list: Vec<FixItem> = Vec::new();
    let missing_evidence = tier1_without_evidence(state);
    if let Some(first) = missing_evidence.first() {
        fix_list.push(FixItem {
            dimension: None,
            points: 0.0,
            message: format!(
                "{} tier-1 test(s) have no prior evidence, starting with '{}'",
                missing_evidence.len(),
                first
            ),
            step: PlanningStep::Evidence,
        });
    }
    for s in ranked {
        let message = s
            .score
            .gaps
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{:?} is below full credit", s.score.dimension));
        fix_list.push(FixItem {
            dimension: Some(s.score.dimension),
            points: s.score.max - s.score.earned,
            message,
            step: s.step,
        });
    }
    fix_list.truncate(FIX_LIST_LIMIT);

    CoverageReport {
        total,
        dimensions: scored.into_iter().map(|s| s.score).collect(),
        fix_list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rp_core::{
        AccelWarning, Confidence, Exposure, FailureModeSelection, HumidityLevel, Mechanism,
        MissionProfile, SelectedTest, TestScore,
    };

    fn mech(id: &str, selected: bool) -> Mechanism {
        Mechanism { id: id.into(), name: id.into(), selected, confidence: Confidence::Medium }
    }

    fn fm(id: &str, selected: bool) -> FailureModeSelection {
        FailureModeSelection {
            id: id.into(),
            name: id.into(),
            mechanism_ids: vec![],
            selected,
            severity: 3,
            occurrence: 3,
            detection: 3,
        }
    }

    fn test(id: &str, mechs: &[&str], humidity: bool) -> SelectedTest {
        let stressors = if humidity { vec!["humidity"] } else { vec!["temperature"] };
        serde_json::from_value(serde_json::json!({
            "id": id, "name": id, "duration_weeks": 1.0, "mechanism_ids": mechs,
            "stress": { "stressors": stressors }
        }))
        .unwrap()
    }

    fn earned(report: &CoverageReport, d: CoverageDimension) -> f64 {
        report.dimensions.iter().find(|s| s.dimension == d).unwrap().earned
    }

    fn full_mission() -> MissionProfile {
        MissionProfile {
            temp_min_c: Some(-40.0),
            temp_max_c: Some(85.0),
            humidity_level: Some(HumidityLevel::Low),
            service_life_years: Some(10.0),
            duty_cycle_pct: Some(30.0),
            exposure: Some(Exposure::Indoor),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_state() {
        let report = score_coverage(&PlanningState::default(), &AccelerationConfig::default());
        assert_eq!(report.total, ACCELERATION_MAX);
        assert_eq!(report.dimensions.len(), 6);
        assert!(report.fix_list.len() <= FIX_LIST_LIMIT);
        // Largest gap first: mechanisms (25).
        assert_eq!(report.fix_list[0].dimension, Some(CoverageDimension::MechanismCoverage));
        assert_eq!(report.fix_list[1].dimension, Some(CoverageDimension::MissionCompleteness));
    }

    #[test]
    fn test_mission_fraction() {
        let mut state = PlanningState::default();
        state.mission.temp_min_c = Some(0.0);
        state.mission.temp_max_c = Some(50.0);
        state.mission.exposure = Some(Exposure::Outdoor);
        let report = score_coverage(&state, &AccelerationConfig::default());
        assert!((earned(&report, CoverageDimension::MissionCompleteness) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_mapping_partial_and_humidity_penalty() {
        let mut state = PlanningState::default();
        state.mechanisms = vec![mech("a", true), mech("b", true), mech("c", true)];
        state.tests = vec![test("t1", &["a"], false)];
        let cfg = AccelerationConfig::default();
        assert_eq!(earned(&score_coverage(&state, &cfg), CoverageDimension::Mapping), 10.0);

        state.tests.push(test("t2", &["b", "c"], false));
        assert_eq!(earned(&score_coverage(&state, &cfg), CoverageDimension::Mapping), 20.0);

        state.mission.humidity_pct = Some(75.0);
        let report = score_coverage(&state, &cfg);
        let d = report.dimensions.iter().find(|d| d.dimension == CoverageDimension::Mapping).unwrap();
        assert_eq!(d.earned, 15.0);
        assert!(d.gaps[0].contains("humidity"));

        state.tests.push(test("t3", &["a"], true));
        assert_eq!(earned(&score_coverage(&state, &cfg), CoverageDimension::Mapping), 20.0);
    }

    #[test]
    fn test_acceleration_validity_levels() {
        let mut state = PlanningState::default();
        state.tests = vec![test("t1", &[], false)];
        let cfg = AccelerationConfig::default();
        assert_eq!(earned(&score_coverage(&state, &cfg), CoverageDimension::AccelerationValidity), 10.0);

        state.tests[0].acceleration.warnings.push(AccelWarning::new(WarningSeverity::Warn, "big AF"));
        assert_eq!(earned(&score_coverage(&state, &cfg), CoverageDimension::AccelerationValidity), 5.0);

        state.tests[0].acceleration.warnings.push(AccelWarning::new(WarningSeverity::Block, "bad AF"));
        let report = score_coverage(&state, &cfg);
        let d = report
            .dimensions
            .iter()
            .find(|d| d.dimension == CoverageDimension::AccelerationValidity)
            .unwrap();
        assert_eq!(d.earned, 0.0);
        assert!(d.gaps[0].contains("bad AF"));
    }

    #[test]
    fn test_tier1_without_evidence_is_prepended() {
        let mut state = PlanningState::default();
        state.mission = full_mission();
        state.tests = vec![test("hast", &[], false)];
        state.scores.insert("hast".into(), TestScore::new(5, 4, 3));
        let report = score_coverage(&state, &AccelerationConfig::default());
        assert_eq!(report.fix_list[0].step, PlanningStep::Evidence);
        assert!(report.fix_list[0].message.contains("hast"));
        assert!(report.fix_list.len() <= FIX_LIST_LIMIT);
    }

    proptest! {
        #[test]
        fn prop_more_mechanisms_never_lower_points(n in 0usize..10) {
            let cfg = AccelerationConfig::default();
            let mut state = PlanningState::default();
            state.mechanisms = (0..10).map(|i| mech(&format!("m{i}"), i < n)).collect();
            let before = earned(&score_coverage(&state, &cfg), CoverageDimension::MechanismCoverage);
            state.mechanisms[n].selected = true;
            let after = earned(&score_coverage(&state, &cfg), CoverageDimension::MechanismCoverage);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_more_failure_modes_never_lower_points(n in 0usize..8) {
            let cfg = AccelerationConfig::default();
            let mut state = PlanningState::default();
            state.failure_modes = (0..8).map(|i| fm(&format!("f{i}"), i < n)).collect();
            let before = earned(&score_coverage(&state, &cfg), CoverageDimension::FailureModeCoverage);
            state.failure_modes[n].selected = true;
            let after = earned(&score_coverage(&state, &cfg), CoverageDimension::FailureModeCoverage);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_total_within_bounds(mechs in 0usize..8, fms in 0usize..8) {
            let cfg = AccelerationConfig::default();
            let mut state = PlanningState::default();
            state.mission = full_mission();
            state.mechanisms = (0..mechs).map(|i| mech(&format!("m{i}"), true)).collect();
            state.failure_modes = (0..fms).map(|i| fm(&format!("f{i}"), true)).collect();
            let report = score_coverage(&state, &cfg);
            prop_assert!(report.total >= 0.0 && report.total <= 100.0);
        }
    }
}
