//! Residual risk per mechanism after the kept tests.

use std::collections::BTreeMap;

use rp_core::{Covered, Mechanism, ResidualLevel, ResidualRiskEntry, SelectedTest};

/// How well the kept tests cover one mechanism.
pub fn coverage_of(mechanism_id: &str, tests: &[SelectedTest]) -> Covered {
    let mut linked = tests.iter().filter(|t| t.is_kept() && t.links(mechanism_id)).peekable();
    if linked.peek().is_none() {
        return Covered::No;
    }
    if linked.any(|t| t.coverage.is_substantive()) { Covered::Yes } else { Covered::Partial }
}

pub fn residual_for(covered: Covered) -> ResidualLevel {
    match covered {
        Covered::Yes => ResidualLevel::Low,
        Covered::Partial => ResidualLevel::Medium,
        Covered::No => ResidualLevel::High,
    }
}

/// Rebuild the residual-risk map for every selected mechanism.
///
/// Mitigations typed into `previous` survive; entries for mechanisms that are
/// no longer selected are dropped.
pub fn evaluate_residual_risk(
    mechanisms: &[Mechanism],
    tests: &[SelectedTest],
    previous: &BTreeMap<String, ResidualRiskEntry>,
) -> BTreeMap<String, ResidualRiskEntry> {
    mechanisms
        .iter()
        .filter(|m| m.selected)
        .map(|m| {
            let covered = coverage_of(&m.id, tests);
            let mitigations =
                previous.get(&m.id).map(|e| e.mitigations.clone()).unwrap_or_default();
            let entry = ResidualRiskEntry {
                mechanism_id: m.id.clone(),
                covered,
                residual: residual_for(covered),
                mitigations,
            };
            (m.id.clone(), entry)
        })
        .collect()
}
