//! Memo caches owned by one engine instance.
//!
//! Created with the engine, grown by every recompute, emptied only by
//! [`EngineCaches::reset`]. Nothing is evicted, so repeated calls with the
//! same inputs always return the same bits.

use std::collections::HashMap;

use rp_core::ReliabilityMethod;
use rp_prob::{BetaQuantileCache, LogFactorialTable};

use crate::sample_size::SampleSizeSolution;

/// Exact-bits key for a sample-size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SampleSizeKey {
    pub reliability: u64,
    pub confidence: u64,
    pub allowed_failures: u32,
    pub method: ReliabilityMethod,
    pub max_n: u32,
}

#[derive(Debug, Clone, Default)]
pub struct EngineCaches {
    pub beta_quantiles: BetaQuantileCache,
    pub log_factorials: LogFactorialTable,
    pub(crate) sample_sizes: HashMap<SampleSizeKey, SampleSizeSolution>,
}

impl EngineCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized sample-size solutions.
    pub fn sample_size_entries(&self) -> usize {
        self.sample_sizes.len()
    }

    /// Drop every memoized value.
    pub fn reset(&mut self) {
        self.beta_quantiles.clear();
        self.log_factorials.clear();
        self.sample_sizes.clear();
        tracing::debug!("engine caches reset");
    }
}
