//! Minimum sample size for a reliability demonstration.
//!
//! A plan demonstrates reliability `R` at confidence `C` with `c` allowed
//! failures when, were the true reliability only `R`, seeing `c` or fewer
//! failures in `n` units would happen with probability at most `1 − C`.
//!
//! - `binomial`: exact search over n with log-space binomial tails.
//! - `weibull-basic`: the zero-failure closed form `n = ⌈ln(1−C)/ln R⌉`.

use rp_core::{ReliabilityMethod, ReliabilityPlan};
use rp_prob::ln_cdf_at_most;
use serde::{Deserialize, Serialize};

use crate::cache::{EngineCaches, SampleSizeKey};
use crate::config::SampleSizeConfig;

const PROB_FLOOR: f64 = 1e-9;

/// Solver output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSizeSolution {
    pub n: u32,
    /// False when the binomial search hit its cap.
    pub criterion_met: bool,
    pub warnings: Vec<String>,
}

/// Confidence `1 − P(X ≤ c)` demonstrated by `n` units at reliability `r`.
pub fn demonstrated_confidence(n: u32, c: u32, r: f64, caches: &mut EngineCaches) -> f64 {
    let ln_p_accept = ln_cdf_at_most(n, c, (1.0 - r).ln(), r.ln(), &mut caches.log_factorials);
    -ln_p_accept.exp_m1()
}

fn sanitize_probability(name: &str, v: f64, warnings: &mut Vec<String>) -> f64 {
    if v.is_finite() && v > 0.0 && v < 1.0 {
        return v;
    }
    let fixed = if v.is_finite() { v.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR) } else { 0.9 };
    warnings.push(format!("{} {} is outside (0, 1); using {}", name, v, fixed));
    fixed
}

/// Solve for the plan's sample size. Memoized on the exact inputs.
pub fn solve_sample_size(
    plan: &ReliabilityPlan,
    cfg: &SampleSizeConfig,
    caches: &mut EngineCaches,
) -> SampleSizeSolution {
    let mut warnings = Vec::new();
    let r = sanitize_probability("target reliability", plan.target_reliability, &mut warnings);
    let conf = sanitize_probability("confidence", plan.confidence, &mut warnings);
    let c = plan.allowed_failures;

    let key = SampleSizeKey {
        reliability: r.to_bits(),
        confidence: conf.to_bits(),
        allowed_failures: c,
        method: plan.method,
        max_n: cfg.max_n,
    };
    if let Some(hit) = caches.sample_sizes.get(&key) {
        let mut hit = hit.clone();
        hit.warnings.splice(0..0, warnings);
        return hit;
    }

    let solution = match plan.method {
        ReliabilityMethod::WeibullBasic => {
            let n = ((1.0 - conf).ln() / r.ln()).ceil().max(1.0) as u32;
            SampleSizeSolution { n, criterion_met: true, warnings: Vec::new() }
        }
        ReliabilityMethod::Binomial => binomial_search(r, conf, c, cfg.max_n, caches),
    };
    tracing::debug!(
        n = solution.n,
        met = solution.criterion_met,
        reliability = r,
        confidence = conf,
        allowed_failures = c,
        "sample size solved"
    );
    caches.sample_sizes.insert(key, solution.clone());

    let mut out = solution;
    out.warnings.splice(0..0, warnings);
    out
}

fn binomial_search(
    r: f64,
    conf: f64,
    c: u32,
    max_n: u32,
    caches: &mut EngineCaches,
) -> SampleSizeSolution {
    let start = c.max(1);
    for n in start..=max_n {
        if demonstrated_confidence(n, c, r, caches) >= conf {
            return SampleSizeSolution { n, criterion_met: true, warnings: Vec::new() };
        }
    }
    tracing::warn!(max_n, reliability = r, confidence = conf, "sample-size search exhausted");
    SampleSizeSolution {
        n: max_n,
        criterion_met: false,
        warnings: vec![format!(
            "no n up to {} demonstrates R={} at C={} with {} failures; using {}",
            max_n, r, conf, c, max_n
        )],
    }
}
