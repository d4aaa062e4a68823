//! Binomial helpers in log space.

/// Cumulative `ln k!` table, grown on demand and never shrunk.
#[derive(Debug, Clone)]
pub struct LogFactorialTable {
    // values[k] = ln k!
    values: Vec<f64>,
}

impl Default for LogFactorialTable {
    fn default() -> Self {
        Self { values: vec![0.0] }
    }
}

impl LogFactorialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries (`ln 0!` through `ln (len-1)!`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop everything but `ln 0!`.
    pub fn clear(&mut self) {
        self.values.truncate(1);
    }

    /// `ln n!`, extending the table through `n` if needed.
    pub fn ln_factorial(&mut self, n: u32) -> f64 {
        let n = n as usize;
        while self.values.len() <= n {
            let k = self.values.len();
            let prev = self.values[k - 1];
            self.values.push(prev + (k as f64).ln());
        }
        self.values[n]
    }

    /// `ln C(n, k)`; `-inf` when `k > n`.
    pub fn ln_choose(&mut self, n: u32, k: u32) -> f64 {
        if k > n {
            return f64::NEG_INFINITY;
        }
        let top = self.ln_factorial(n);
        top - self.ln_factorial(k) - self.ln_factorial(n - k)
    }
}

/// `ln P(X <= c)` for `X ~ Binom(n, p_fail)`, given `ln p_fail` and `ln(1 - p_fail)`.
///
/// Terms are folded with a running maximum, so no buffer is built per call.
/// The `i = 0` term never multiplies `ln p_fail`, so `p_fail = 0`
/// (`ln p_fail = -inf`) stays finite.
pub fn ln_cdf_at_most(
    n: u32,
    c: u32,
    ln_p_fail: f64,
    ln_p_survive: f64,
    table: &mut LogFactorialTable,
) -> f64 {
    let mut max = f64::NEG_INFINITY;
    // Sum of exp(term - max) over the terms seen so far.
    let mut scaled = 0.0_f64;
    for i in 0..=c.min(n) {
        let fail_part = if i == 0 { 0.0 } else { i as f64 * ln_p_fail };
        let survive_part = if i == n { 0.0 } else { (n - i) as f64 * ln_p_survive };
        let term = table.ln_choose(n, i) + fail_part + survive_part;
        if term == f64::NEG_INFINITY || term.is_nan() {
            continue;
        }
        if term > max {
            scaled = scaled * (max - term).exp() + 1.0;
            max = term;
        } else {
            scaled += (term - max).exp();
        }
    }
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + scaled.ln()
}
