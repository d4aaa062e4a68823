//! # rp-engine
//!
//! Reliability test-planning engine for RelPlan.
//!
//! This crate provides:
//! - Evidence fusion (Beta-binomial posterior and confidence badge)
//! - Acceleration factors (Arrhenius, Coffin-Manson, Peck, Eyring)
//! - Sample-size search for reliability demonstrations
//! - Test prioritization, residual risk and plan coverage scoring
//! - Multi-lane scheduling with a forward timing pass
//!
//! ## Architecture
//!
//! Stages are free functions over `rp-core` types. [`PlanningEngine`] owns
//! the configuration and the memo caches and runs the stages in dependency
//! order against any [`rp_core::ReferenceCatalog`]. Everything is
//! synchronous and deterministic.

#![warn(clippy::all)]

/// Acceleration model selection, default conditions and AF.
pub mod acceleration;
/// Memo caches owned by an engine instance.
pub mod cache;
/// Engine configuration (YAML/JSON).
pub mod config;
/// Plan coverage score and fix list.
pub mod coverage;
/// Verification-requirement rows.
pub mod dvpr;
/// Prior-evidence fusion.
pub mod evidence;
/// Full recompute pipeline.
pub mod pipeline;
/// Risk scoring and tiers.
pub mod prioritize;
/// Catalog/state reconciliation.
pub mod reconcile;
/// Residual risk per mechanism.
pub mod residual;
/// Sample-size solver.
pub mod sample_size;
/// Resource lanes, dependency graph and timing.
pub mod schedule;

pub use acceleration::{AccelerationContext, acceleration_factor, annotate_test, select_model};
pub use cache::EngineCaches;
pub use config::{AccelerationConfig, EngineConfig, EvidenceConfig, SampleSizeConfig};
pub use coverage::score_coverage;
pub use dvpr::build_dvpr_rows;
pub use evidence::fuse_evidence;
pub use pipeline::PlanningEngine;
pub use prioritize::Prioritizer;
pub use reconcile::{merge_tests, sync_failure_modes, sync_mechanisms};
pub use residual::evaluate_residual_risk;
pub use sample_size::{SampleSizeSolution, solve_sample_size};
pub use schedule::build_schedule;
