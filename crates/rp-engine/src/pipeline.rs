//! Full recompute of a planning state.

use std::collections::BTreeMap;

use rp_core::{
    AccelerationModel, EvidenceSummary, PlanningState, PriorEvidenceEntry, ReferenceCatalog,
    ReliabilityPlan, Result,
};

use crate::acceleration::{AccelerationContext, annotate_test};
use crate::cache::EngineCaches;
use crate::config::EngineConfig;
use crate::coverage::score_coverage;
use crate::dvpr::build_dvpr_rows;
use crate::evidence::fuse_evidence;
use crate::prioritize::Prioritizer;
use crate::reconcile::{merge_tests, sync_failure_modes, sync_mechanisms};
use crate::residual::evaluate_residual_risk;
use crate::sample_size::{SampleSizeSolution, solve_sample_size};
use crate::schedule::build_schedule;

/// Engine instance: configuration plus the memo caches it owns.
///
/// Caches only grow; two recomputes of an unchanged state produce identical
/// derived fields whether or not the caches were warm.
#[derive(Debug, Clone, Default)]
pub struct PlanningEngine {
    config: EngineConfig,
    caches: EngineCaches,
}

impl PlanningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config, caches: EngineCaches::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn caches(&self) -> &EngineCaches {
        &self.caches
    }

    /// Drop every memoized value.
    pub fn reset_caches(&mut self) {
        self.caches.reset();
    }

    /// Solve one reliability plan with this engine's caches.
    pub fn sample_size(&mut self, plan: &ReliabilityPlan) -> SampleSizeSolution {
        solve_sample_size(plan, &self.config.sample_size, &mut self.caches)
    }

    /// Fuse one prior-evidence entry with this engine's caches.
    pub fn evidence(&mut self, entry: Option<&PriorEvidenceEntry>) -> EvidenceSummary {
        fuse_evidence(entry, &self.config.evidence, &mut self.caches.beta_quantiles)
    }

    /// Reconcile `state` against `catalog` and rewrite every derived field.
    ///
    /// Stages run in dependency order: reconciliation, acceleration, evidence,
    /// prioritization, residual risk, coverage, sample size, DVPR rows,
    /// schedule. Fails only when the reconciled state is structurally
    /// invalid; numeric trouble is reported through warnings.
    pub fn recompute(
        &mut self,
        state: &mut PlanningState,
        catalog: &dyn ReferenceCatalog,
    ) -> Result<()> {
        let mechanisms = sync_mechanisms(&state.mechanisms, catalog);
        let failure_modes = sync_failure_modes(&state.failure_modes, catalog);
        let tests = merge_tests(&state.tests, &mechanisms, catalog);

        // A rejected state is handed back exactly as the caller passed it in.
        let previous = (
            std::mem::replace(&mut state.mechanisms, mechanisms),
            std::mem::replace(&mut state.failure_modes, failure_modes),
            std::mem::replace(&mut state.tests, tests),
        );
        if let Err(e) = state.validate() {
            (state.mechanisms, state.failure_modes, state.tests) = previous;
            return Err(e);
        }

        self.annotate_acceleration(state, catalog);

        state.evidence = state
            .tests
            .iter()
            .map(|t| (t.id.clone(), self.evidence(state.prior_evidence.get(&t.id))))
            .collect();

        let prioritizer = Prioritizer::new(
            &state.mechanisms,
            &state.failure_modes,
            state.product.safety_critical,
        );
        let scores: BTreeMap<_, _> = state
            .tests
            .iter()
            .map(|t| {
                let evidence = state.evidence.get(&t.id).cloned().unwrap_or_default();
                (t.id.clone(), prioritizer.score(t, &evidence, state.score_overrides.get(&t.id)))
            })
            .collect();
        state.scores = scores;

        state.residual_risk =
            evaluate_residual_risk(&state.mechanisms, &state.tests, &state.residual_risk);
        state.coverage = Some(score_coverage(state, &self.config.acceleration));

        let solution = self.sample_size(&state.reliability_plan);
        state.reliability_plan.required_sample_size = Some(solution.n);

        state.dvpr_rows = build_dvpr_rows(
            &state.tests,
            &state.mechanisms,
            &state.scores,
            &state.reliability_plan,
            solution.n,
        );

        let (tasks, stats) = build_schedule(&state.tests, &state.schedule, state.mission.exposure);
        state.schedule_tasks = tasks;
        state.schedule_stats = Some(stats);

        state.plan_warnings = plan_warnings(state, &solution);
        tracing::debug!(
            tests = state.tests.len(),
            kept = state.kept_tests().count(),
            coverage = state.coverage.as_ref().map(|c| c.total),
            sample_size = solution.n,
            warnings = state.plan_warnings.len(),
            "recompute finished"
        );
        Ok(())
    }

    fn annotate_acceleration(&self, state: &mut PlanningState, catalog: &dyn ReferenceCatalog) {
        let housing_ea = state
            .materials
            .housing
            .as_deref()
            .and_then(|id| catalog.material(id))
            .and_then(|m| m.ea_midpoint());
        let ctx = AccelerationContext {
            mission: &state.mission,
            housing_ea,
            cfg: &self.config.acceleration,
        };
        let infos: Vec<_> = state
            .tests
            .iter()
            .map(|t| {
                let declared =
                    catalog.test(&t.id).map(|d| d.default_model).unwrap_or(AccelerationModel::None);
                annotate_test(t, declared, &ctx)
            })
            .collect();
        for (t, info) in state.tests.iter_mut().zip(infos) {
            t.acceleration = info;
        }
    }
}

/// Acceleration warnings of kept tests as `"<test id>: <message>"`, then
/// sample-size warnings.
fn plan_warnings(state: &PlanningState, solution: &SampleSizeSolution) -> Vec<String> {
    let mut out: Vec<String> = state
        .kept_tests()
        .flat_map(|t| t.acceleration.warnings.iter().map(move |w| format!("{}: {}", t.id, w)))
        .collect();
    out.extend(solution.warnings.iter().map(|w| format!("sample size: {}", w)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::{StaticCatalog, TestStatus};

    fn catalog() -> StaticCatalog {
        serde_json::from_value(serde_json::json!({
            "mechanisms": [
                { "id": "thermal-aging", "name": "Thermal aging", "default_confidence": "medium" },
                { "id": "humidity-corrosion", "name": "Humidity corrosion" }
            ],
            "tests": [
                { "id": "high-temp-storage", "name": "High-temperature storage",
                  "mechanism_ids": ["thermal-aging"], "duration_weeks": 1.0,
                  "coverage": "high", "stressors": ["temperature"] },
                { "id": "damp-heat", "name": "Damp heat",
                  "mechanism_ids": ["humidity-corrosion"], "duration_weeks": 2.0,
                  "coverage": "medium", "stressors": ["humidity", "temperature"] }
            ],
            "materials": [ { "id": "pbt", "name": "PBT", "ea_range_ev": [0.6, 0.8] } ]
        }))
        .unwrap()
    }

    fn state() -> PlanningState {
        serde_json::from_value(serde_json::json!({
            "mission": { "temp_min_c": -20.0, "temp_max_c": 60.0, "humidity_pct": 75.0,
                         "service_life_years": 10.0, "duty_cycle_pct": 40.0, "exposure": "outdoor" },
            "materials": { "housing": "pbt" },
            "mechanisms": [
                { "id": "thermal-aging", "name": "Thermal aging", "selected": true },
                { "id": "humidity-corrosion", "name": "Humidity corrosion", "selected": true }
            ],
            "prior_evidence": { "damp-heat": { "n_prev": 30, "f_prev": 0 } },
            "schedule": { "strategy": "parallel-by-stressor" }
        }))
        .unwrap()
    }

    #[test]
    fn test_recompute_fills_every_derived_field() {
        let cat = catalog();
        let mut s = state();
        PlanningEngine::new().recompute(&mut s, &cat).unwrap();

        assert_eq!(s.tests.len(), 2);
        assert_eq!(s.tests[0].acceleration.model, AccelerationModel::Arrhenius);
        assert_eq!(s.tests[1].acceleration.model, AccelerationModel::Peck);
        assert!(s.tests.iter().all(|t| t.acceleration.af > 1.0));
        assert_eq!(s.reliability_plan.required_sample_size, Some(22));
        assert_eq!(s.scores.len(), 2);
        assert_eq!(s.residual_risk.len(), 2);
        assert_eq!(s.dvpr_rows.len(), 2);
        assert_eq!(s.schedule_tasks.len(), 2);
        let stats = s.schedule_stats.unwrap();
        assert_eq!(stats.sequential_days, 21);
        assert_eq!(stats.current_days, 14);
        assert!(s.coverage.is_some());
        assert!(s.evidence["damp-heat"].upper_fail_prob_95.is_some());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let cat = catalog();
        let mut engine = PlanningEngine::new();
        let mut s = state();
        engine.recompute(&mut s, &cat).unwrap();
        let first = s.clone();
        engine.recompute(&mut s, &cat).unwrap();
        assert_eq!(first, s);

        // Cold caches give the same bits.
        let mut cold = first.clone();
        PlanningEngine::new().recompute(&mut cold, &cat).unwrap();
        assert_eq!(first, cold);
    }

    #[test]
    fn test_removed_tests_leave_derived_outputs() {
        let cat = catalog();
        let mut engine = PlanningEngine::new();
        let mut s = state();
        engine.recompute(&mut s, &cat).unwrap();
        s.tests[1].status = TestStatus::Remove;
        engine.recompute(&mut s, &cat).unwrap();
        assert_eq!(s.dvpr_rows.len(), 1);
        assert_eq!(s.schedule_tasks.len(), 1);
        assert_eq!(
            s.residual_risk["humidity-corrosion"].covered,
            rp_core::Covered::No
        );
    }

    #[test]
    fn test_invalid_state_is_rejected() {
        let cat = catalog();
        let mut s = state();
        s.tests.push(
            serde_json::from_value(serde_json::json!({
                "id": "bench-test", "name": "Bench", "duration_weeks": 1.0,
                "mechanism_ids": ["ghost"]
            }))
            .unwrap(),
        );
        let before = s.clone();
        assert!(PlanningEngine::new().recompute(&mut s, &cat).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_rejected_recompute_keeps_prior_derived_outputs() {
        let cat = catalog();
        let mut s = state();
        let mut engine = PlanningEngine::new();
        engine.recompute(&mut s, &cat).unwrap();
        let good = s.clone();

        s.mechanisms.iter_mut().for_each(|m| m.selected = false);
        s.tests.push(
            serde_json::from_value(serde_json::json!({
                "id": "bench-test", "name": "Bench", "duration_weeks": 1.0,
                "mechanism_ids": ["ghost"]
            }))
            .unwrap(),
        );
        let edited = s.clone();
        assert!(engine.recompute(&mut s, &cat).is_err());
        // Inputs are left as edited and derived fields still match the last good run.
        assert_eq!(s, edited);
        assert_eq!(s.schedule_tasks, good.schedule_tasks);
        assert_eq!(s.coverage, good.coverage);
    }

    #[test]
    fn test_sample_size_warnings_are_flattened() {
        let cat = catalog();
        let mut s = state();
        s.reliability_plan.target_reliability = 1.5;
        PlanningEngine::new().recompute(&mut s, &cat).unwrap();
        assert!(s.plan_warnings.iter().any(|w| w.starts_with("sample size: ")));
    }
}
