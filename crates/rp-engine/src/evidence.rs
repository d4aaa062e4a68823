//! Beta-binomial fusion of prior test evidence.
//!
//! Prior trials are discounted by their similarity to the current product,
//! added to a Jeffreys or uniform Beta prior, and summarised by the posterior
//! mean and 95% upper failure probability.

use rp_core::{EvidenceBadge, EvidenceSummary, PriorEvidenceEntry};
use rp_prob::{BetaQuantileCache, beta_inverse_cdf};

use crate::config::EvidenceConfig;

/// Fuse one test's prior evidence into a posterior summary.
///
/// `None`, or an entry with no prior trials, yields badge `None` with the raw
/// fields passed through.
pub fn fuse_evidence(
    entry: Option<&PriorEvidenceEntry>,
    cfg: &EvidenceConfig,
    cache: &mut BetaQuantileCache,
) -> EvidenceSummary {
    let Some(entry) = entry else {
        return EvidenceSummary::default();
    };
    if entry.n_prev == 0 {
        return EvidenceSummary {
            n_prev: entry.n_prev,
            f_prev: entry.f_prev,
            similarity_pct: entry.similarity_pct,
            prior_type: entry.prior_type,
            ..Default::default()
        };
    }

    let similarity = if entry.similarity_pct.is_finite() {
        entry.similarity_pct.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let f_prev = entry.f_prev.min(entry.n_prev);
    let n_eff = entry.n_prev as f64 * similarity / 100.0;
    let f_eff = f_prev as f64 * similarity / 100.0;

    let (alpha0, beta0) = entry.prior_type.pseudo_counts();
    let alpha = alpha0 + f_eff;
    let beta = beta0 + (n_eff - f_eff);
    let mean = alpha / (alpha + beta);
    let upper = beta_inverse_cdf(cfg.upper_quantile, alpha, beta, cache);

    EvidenceSummary {
        n_prev: entry.n_prev,
        f_prev,
        similarity_pct: similarity,
        prior_type: entry.prior_type,
        n_eff,
        f_eff,
        alpha: Some(alpha),
        beta: Some(beta),
        mean_fail_prob: Some(mean),
        upper_fail_prob_95: Some(upper),
        badge: badge_for(upper, cfg),
    }
}

fn badge_for(upper: f64, cfg: &EvidenceConfig) -> EvidenceBadge {
    if upper <= cfg.low_upper_bound {
        EvidenceBadge::Low
    } else if upper <= cfg.med_upper_bound {
        EvidenceBadge::Med
    } else {
        EvidenceBadge::High
    }
}
