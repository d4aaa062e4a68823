//! Verification-requirement (DVPR) rows for kept tests.

use std::collections::{BTreeMap, HashMap};

use rp_core::{DvprRow, Mechanism, ReliabilityPlan, SelectedTest, TestScore};

/// Pass/fail wording for a test run with `sample_size` units.
pub fn acceptance_criterion(plan: &ReliabilityPlan, sample_size: u32) -> String {
    format!(
        "≤ {} failure(s) in {} units; demonstrates R ≥ {:.3} at {:.0}% confidence",
        plan.allowed_failures,
        sample_size,
        plan.target_reliability,
        plan.confidence * 100.0
    )
}

/// One row per kept test, in test order.
///
/// `plan_n` is the solved plan-level sample size; a per-test override wins.
/// Mechanisms are listed by name when known, by id otherwise.
pub fn build_dvpr_rows(
    tests: &[SelectedTest],
    mechanisms: &[Mechanism],
    scores: &BTreeMap<String, TestScore>,
    plan: &ReliabilityPlan,
    plan_n: u32,
) -> Vec<DvprRow> {
    let names: HashMap<&str, &str> =
        mechanisms.iter().map(|m| (m.id.as_str(), m.name.as_str())).collect();

    tests
        .iter()
        .filter(|t| t.is_kept())
        .map(|t| {
            let sample_size = t.sample_size_override.unwrap_or(plan_n);
            DvprRow {
                test_id: t.id.clone(),
                test_name: t.name.clone(),
                mechanisms: t
                    .mechanism_ids
                    .iter()
                    .map(|id| names.get(id.as_str()).copied().unwrap_or(id.as_str()).to_string())
                    .collect(),
                acceptance_criterion: acceptance_criterion(plan, sample_size),
                sample_size,
                duration_weeks: t.effective_duration_weeks(),
                af: t.acceleration.af,
                equiv_years: t.acceleration.equiv_years,
                tier: scores.get(&t.id).map(|s| s.tier),
            }
        })
        .collect()
}
