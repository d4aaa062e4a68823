//! Upsert-by-id reconciliation of catalog entries into the planning state.
//!
//! Catalog-owned fields (names, links, durations, stressors) are refreshed
//! from the catalog; user-owned fields (selection, confidence, ratings,
//! status, overrides, pinned model) are carried over untouched. Entries the
//! catalog does not know are user-defined and kept as they are.

use std::collections::{HashMap, HashSet};

use rp_core::{
    AccelerationInfo, FailureModeDef, FailureModeSelection, Mechanism, MechanismDef,
    ReferenceCatalog, SelectedTest, StressProfile, TestDef, TestStatus,
};

fn new_mechanism(def: &MechanismDef) -> Mechanism {
    Mechanism {
        id: def.id.clone(),
        name: def.name.clone(),
        selected: false,
        confidence: def.default_confidence,
    }
}

/// Catalog mechanisms in catalog order, then user-defined ones.
pub fn sync_mechanisms(current: &[Mechanism], catalog: &dyn ReferenceCatalog) -> Vec<Mechanism> {
    let by_id: HashMap<&str, &Mechanism> = current.iter().map(|m| (m.id.as_str(), m)).collect();
    let mut out: Vec<Mechanism> = catalog
        .mechanisms()
        .iter()
        .map(|def| match by_id.get(def.id.as_str()) {
            Some(prev) => Mechanism { name: def.name.clone(), ..(*prev).clone() },
            None => new_mechanism(def),
        })
        .collect();
    out.extend(current.iter().filter(|m| catalog.mechanism(&m.id).is_none()).cloned());
    out
}

fn new_failure_mode(def: &FailureModeDef) -> FailureModeSelection {
    FailureModeSelection {
        id: def.id.clone(),
        name: def.name.clone(),
        mechanism_ids: def.mechanism_ids.clone(),
        selected: false,
        severity: def.severity,
        occurrence: def.occurrence,
        detection: def.detection,
    }
}

/// Catalog failure modes in catalog order, then user-defined ones. User
/// ratings and selection survive.
pub fn sync_failure_modes(
    current: &[FailureModeSelection],
    catalog: &dyn ReferenceCatalog,
) -> Vec<FailureModeSelection> {
    let by_id: HashMap<&str, &FailureModeSelection> =
        current.iter().map(|f| (f.id.as_str(), f)).collect();
    let known: HashSet<&str> = catalog.failure_modes().iter().map(|f| f.id.as_str()).collect();
    let mut out: Vec<FailureModeSelection> = catalog
        .failure_modes()
        .iter()
        .map(|def| match by_id.get(def.id.as_str()) {
            Some(prev) => FailureModeSelection {
                name: def.name.clone(),
                mechanism_ids: def.mechanism_ids.clone(),
                ..(*prev).clone()
            },
            None => new_failure_mode(def),
        })
        .collect();
    out.extend(current.iter().filter(|f| !known.contains(f.id.as_str())).cloned());
    out
}

/// A fresh plan entry for a catalog test.
pub fn test_from_def(def: &TestDef) -> SelectedTest {
    SelectedTest {
        id: def.id.clone(),
        name: def.name.clone(),
        mechanism_ids: def.mechanism_ids.clone(),
        coverage: def.coverage,
        duration_weeks: def.duration_weeks,
        cost_level: def.cost_level,
        status: TestStatus::Keep,
        pinned: false,
        acceleration: AccelerationInfo::default(),
        stress: StressProfile { stressors: def.stressors.clone(), description: None },
        sample_size_override: None,
        duration_override_weeks: None,
    }
}

fn refresh_test(prev: &SelectedTest, def: &TestDef) -> SelectedTest {
    SelectedTest {
        name: def.name.clone(),
        mechanism_ids: def.mechanism_ids.clone(),
        coverage: def.coverage,
        duration_weeks: def.duration_weeks,
        cost_level: def.cost_level,
        stress: StressProfile {
            stressors: def.stressors.clone(),
            description: prev.stress.description.clone(),
        },
        ..prev.clone()
    }
}

/// Merge candidate catalog tests into the plan.
///
/// A catalog test is a candidate when it links at least one selected
/// mechanism. A previous catalog test that is no longer a candidate stays
/// only when pinned. Candidates come first in catalog order, then the
/// surviving previous tests in their previous order.
pub fn merge_tests(
    current: &[SelectedTest],
    mechanisms: &[Mechanism],
    catalog: &dyn ReferenceCatalog,
) -> Vec<SelectedTest> {
    let selected: HashSet<&str> =
        mechanisms.iter().filter(|m| m.selected).map(|m| m.id.as_str()).collect();
    let by_id: HashMap<&str, &SelectedTest> = current.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut out = Vec::new();
    let mut placed: HashSet<&str> = HashSet::new();
    for def in catalog.tests() {
        let prev = by_id.get(def.id.as_str()).copied();
        let candidate = def.mechanism_ids.iter().any(|m| selected.contains(m.as_str()));
        if !candidate && !prev.is_some_and(|p| p.pinned) {
            continue;
        }
        out.push(match prev {
            Some(p) => refresh_test(p, def),
            None => test_from_def(def),
        });
        placed.insert(def.id.as_str());
    }

    let dropped = current
        .iter()
        .filter(|t| !placed.contains(t.id.as_str()) && catalog.test(&t.id).is_some())
        .count();
    if dropped > 0 {
        tracing::debug!(dropped, "tests no longer linked to a selected mechanism");
    }
    out.extend(current.iter().filter(|t| catalog.test(&t.id).is_none()).cloned());
    out
}
