//! Probability building blocks for RelPlan.
//!
//! This crate hosts the special functions the planning engine relies on:
//! - log-gamma and stable log-sum-exp
//! - regularized incomplete beta and its memoized inverse
//! - a cumulative log-factorial table for exact binomial tails
//!
//! Everything here is total over its documented domain. The only heap state
//! lives in the caches the caller owns.

pub mod beta;
pub mod binomial;
pub mod math;

pub use beta::{BetaQuantileCache, beta_inverse_cdf, regularized_incomplete_beta};
pub use binomial::{LogFactorialTable, ln_cdf_at_most};
pub use math::{log_gamma, log_sum_exp};
