//! Small numerically-stable math utilities used across probability code.

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;

const LANCZOS_COEF: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln |Γ(z)|` via the Lanczos approximation.
///
/// For `z < 0.5` the reflection formula
/// `ln Γ(z) = ln π − ln |sin(πz)| − ln Γ(1 − z)` keeps the series in its
/// accurate range.
pub fn log_gamma(z: f64) -> f64 {
    if z < 0.5 {
        return PI.ln() - (PI * z).sin().abs().ln() - log_gamma(1.0 - z);
    }
    let z = z - 1.0;
    let mut x = LANCZOS_COEF[0];
    for (i, c) in LANCZOS_COEF.iter().enumerate().skip(1) {
        x += c / (z + i as f64);
    }
    let t = z + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// Stable `ln Σ exp(xᵢ)`.
///
/// Subtracts the maximum before exponentiating. Returns `-inf` for an empty
/// slice or when every term is `-inf`.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}
