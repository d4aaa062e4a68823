//! Incomplete beta function and its inverse.

use std::collections::HashMap;

use crate::math::log_gamma;

const CF_MAX_TERMS: usize = 200;
const CF_EPS: f64 = 3e-7;
const CF_FPMIN: f64 = 1e-30;

/// Bisection steps used by [`beta_inverse_cdf`]. 2⁻⁶⁰ is below f64 resolution near the
/// quantiles of interest.
pub const INVERSE_BISECTION_STEPS: usize = 60;

/// Continued fraction for the incomplete beta function (modified Lentz).
///
/// Stops after [`CF_MAX_TERMS`] terms or once a convergent changes the
/// running value by less than `3e-7` (relative). Denominators are clamped away
/// from zero.
pub fn continued_fraction_beta(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < CF_FPMIN {
        d = CF_FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=CF_MAX_TERMS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step.
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < CF_FPMIN {
            d = CF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < CF_FPMIN {
            c = CF_FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step.
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < CF_FPMIN {
            d = CF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < CF_FPMIN {
            c = CF_FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < CF_EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta `I_x(a, b)`.
///
/// Returns exactly 0 for `x <= 0` and 1 for `x >= 1`. Above the mode-ish
/// split point `(a+1)/(a+b+2)` the symmetric form `1 − I_{1−x}(b, a)` is used,
/// which is where the continued fraction converges fastest.
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front =
        log_gamma(a + b) - log_gamma(a) - log_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * continued_fraction_beta(a, b, x) / a
    } else {
        1.0 - front * continued_fraction_beta(b, a, 1.0 - x) / b
    }
}

/// Memo of beta quantiles keyed on `(q, a, b)` rounded to 4 decimals.
///
/// Append-only for the lifetime of its owner; [`BetaQuantileCache::clear`]
/// is the only way entries leave.
#[derive(Debug, Clone, Default)]
pub struct BetaQuantileCache {
    entries: HashMap<(i64, i64, i64), f64>,
}

impl BetaQuantileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn key(q: f64, a: f64, b: f64) -> (i64, i64, i64) {
        (round4(q), round4(a), round4(b))
    }
}

#[inline]
fn round4(v: f64) -> i64 {
    (v * 1e4).round() as i64
}

/// Quantile of Beta(`a`, `b`) at probability `q`, by bisection on `I_x(a, b)`.
///
/// `q <= 0` gives 0 and `q >= 1` gives 1 without touching the cache.
pub fn beta_inverse_cdf(q: f64, a: f64, b: f64, cache: &mut BetaQuantileCache) -> f64 {
    if q <= 0.0 {
        return 0.0;
    }
    if q >= 1.0 {
        return 1.0;
    }
    let key = BetaQuantileCache::key(q, a, b);
    if let Some(&x) = cache.entries.get(&key) {
        return x;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..INVERSE_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if regularized_incomplete_beta(mid, a, b) < q {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let x = 0.5 * (lo + hi);
    cache.entries.insert(key, x);
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_edges() {
        assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_incomplete_beta(-1.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_incomplete_beta(1.0, 2.0, 3.0), 1.0);
    }

    #[test]
    fn test_uniform_is_identity() {
        for x in [0.05, 0.2, 0.5, 0.77, 0.99] {
            assert_relative_eq!(regularized_incomplete_beta(x, 1.0, 1.0), x, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_matches_statrs() {
        let cases: [(f64, f64, f64); 6] = [
            (0.1, 0.5, 0.5),
            (0.3, 2.0, 5.0),
            (0.02, 0.5, 30.5),
            (0.9, 8.0, 1.5),
            (0.5, 10.0, 10.0),
            (0.001, 1.0, 200.0),
        ];
        for (x, a, b) in cases {
            let ours = regularized_incomplete_beta(x, a, b);
            let reference = statrs::function::beta::beta_reg(a, b, x);
            assert!((ours - reference).abs() < 1e-6, "I_{}({}, {}): {} vs {}", x, a, b, ours, reference);
        }
    }

    #[test]
    fn test_symmetry() {
        let (a, b, x) = (2.5, 4.0, 0.35);
        let lhs = regularized_incomplete_beta(x, a, b);
        let rhs = 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
        assert_relative_eq!(lhs, rhs, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_uniform_median() {
        let mut cache = BetaQuantileCache::new();
        assert_relative_eq!(beta_inverse_cdf(0.5, 1.0, 1.0, &mut cache), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_round_trips_through_cdf() {
        let mut cache = BetaQuantileCache::new();
        for (q, a, b) in [(0.95, 0.5, 30.5), (0.05, 3.0, 2.0), (0.5, 4.0, 4.0)] {
            let x = beta_inverse_cdf(q, a, b, &mut cache);
            assert_relative_eq!(regularized_incomplete_beta(x, a, b), q, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bisection_width_is_below_spacing_at_upper_fail_quantiles() {
        let mut cache = BetaQuantileCache::new();
        let width = 2.0_f64.powi(-(INVERSE_BISECTION_STEPS as i32));
        for (a, b) in [(0.5, 200.5), (1.0, 100.0), (3.5, 40.5)] {
            let x = beta_inverse_cdf(0.95, a, b, &mut cache);
            assert!(x * f64::EPSILON >= width, "x={} for Beta({}, {})", x, a, b);
        }
    }

    #[test]
    fn test_inverse_bounds_skip_cache() {
        let mut cache = BetaQuantileCache::new();
        assert_eq!(beta_inverse_cdf(0.0, 2.0, 2.0, &mut cache), 0.0);
        assert_eq!(beta_inverse_cdf(1.0, 2.0, 2.0, &mut cache), 1.0);
        assert_eq!(beta_inverse_cdf(-0.3, 2.0, 2.0, &mut cache), 0.0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_inverse_is_memoized_on_rounded_key() {
        let mut cache = BetaQuantileCache::new();
        let first = beta_inverse_cdf(0.95, 1.5, 20.5, &mut cache);
        assert_eq!(cache.len(), 1);
        // Same key after rounding to 4 decimals.
        let second = beta_inverse_cdf(0.950_000_1, 1.5, 20.500_01, &mut cache);
        assert_eq!(cache.len(), 1);
        assert_eq!(first.to_bits(), second.to_bits());

        cache.clear();
        assert!(cache.is_empty());
    }
}
