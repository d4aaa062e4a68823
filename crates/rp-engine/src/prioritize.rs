//! Risk scoring and tiering of candidate tests.

use std::collections::HashMap;

use rp_core::{
    Confidence, EvidenceBadge, EvidenceSummary, FailureModeSelection, Mechanism, ScoreOverride,
    SelectedTest, TestScore,
};

/// Prior trials needed before a "Low" badge may lower likelihood.
pub const LOW_BADGE_MIN_TRIALS: u32 = 30;

/// Default `(severity, likelihood, detectability)` for a mechanism confidence.
pub fn default_factors(confidence: Confidence, safety_critical: bool) -> (u8, u8, u8) {
    let (severity, likelihood, detectability) = match confidence {
        Confidence::High => (3, 2, 2),
        Confidence::Medium => (3, 3, 3),
        Confidence::Assumed => (4, 4, 3),
    };
    let severity = if safety_critical { (severity + 1).min(5) } else { severity };
    (severity, likelihood, detectability)
}

/// Shared lookups for scoring every test of one state.
pub struct Prioritizer<'a> {
    confidence_by_id: HashMap<&'a str, Confidence>,
    failure_modes: Vec<&'a FailureModeSelection>,
    safety_critical: bool,
}

impl<'a> Prioritizer<'a> {
    pub fn new(
        mechanisms: &'a [Mechanism],
        failure_modes: &'a [FailureModeSelection],
        safety_critical: bool,
    ) -> Self {
        Self {
            confidence_by_id: mechanisms.iter().map(|m| (m.id.as_str(), m.confidence)).collect(),
            failure_modes: failure_modes.iter().filter(|f| f.selected).collect(),
            safety_critical,
        }
    }

    /// Worst confidence among the test's linked mechanisms; `Assumed` when
    /// none of them is known.
    pub fn worst_confidence(&self, test: &SelectedTest) -> Confidence {
        test.mechanism_ids
            .iter()
            .filter_map(|id| self.confidence_by_id.get(id.as_str()).copied())
            .max()
            .unwrap_or(Confidence::Assumed)
    }

    /// Max ratings among selected failure modes sharing a mechanism with the test.
    fn failure_mode_factors(&self, test: &SelectedTest) -> Option<(u8, u8, u8)> {
        self.failure_modes
            .iter()
            .filter(|fm| fm.mechanism_ids.iter().any(|m| test.links(m)))
            .map(|fm| (fm.severity, fm.occurrence, fm.detection))
            .reduce(|a, b| (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2)))
    }

    /// Score one test. User-entered factors are kept verbatim.
    pub fn score(
        &self,
        test: &SelectedTest,
        evidence: &EvidenceSummary,
        user: Option<&ScoreOverride>,
    ) -> TestScore {
        let (mut severity, mut likelihood, mut detectability) =
            default_factors(self.worst_confidence(test), self.safety_critical);
        if let Some((s, o, d)) = self.failure_mode_factors(test) {
            severity = s;
            likelihood = o;
            detectability = d;
        }

        let user = user.copied().unwrap_or_default();
        if user.likelihood.is_none() {
            likelihood = nudge_likelihood(likelihood, evidence);
        }

        TestScore::new(
            user.severity.unwrap_or(severity),
            user.likelihood.unwrap_or(likelihood),
            user.detectability.unwrap_or(detectability),
        )
    }
}

fn nudge_likelihood(likelihood: u8, evidence: &EvidenceSummary) -> u8 {
    match evidence.badge {
        EvidenceBadge::High => (likelihood + 1).min(5),
        EvidenceBadge::Low if evidence.n_prev >= LOW_BADGE_MIN_TRIALS && evidence.f_prev == 0 => {
            likelihood.saturating_sub(1).max(1)
        }
        _ => likelihood,
    }
}
