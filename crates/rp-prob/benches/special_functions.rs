use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_special_functions(c: &mut Criterion) {
    let zs: Vec<f64> = (1..10_000).map(|i| (i as f64) * 0.01).collect();

    c.bench_function("log_gamma_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &z in &zs {
                acc += rp_prob::log_gamma(z);
            }
            black_box(acc)
        })
    });

    let xs: Vec<f64> = (0..10_000).map(|i| ((i as f64) + 0.5) / 10_000.0).collect();
    c.bench_function("incomplete_beta_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += rp_prob::regularized_incomplete_beta(x, 0.5, 30.5);
            }
            black_box(acc)
        })
    });

    c.bench_function("beta_inverse_cold", |b| {
        b.iter(|| {
            let mut cache = rp_prob::BetaQuantileCache::new();
            black_box(rp_prob::beta_inverse_cdf(0.95, 0.5, 30.5, &mut cache))
        })
    });

    c.bench_function("binomial_tail_n500_c5", |b| {
        let mut table = rp_prob::LogFactorialTable::new();
        let r: f64 = 0.99;
        b.iter(|| black_box(rp_prob::ln_cdf_at_most(500, 5, (1.0 - r).ln(), r.ln(), &mut table)))
    });
}

criterion_group!(benches, bench_special_functions);
criterion_main!(benches);
