//! # rp-core
//!
//! Core types and the reference-catalog interface for RelPlan.
//!
//! This crate holds the plain data the rest of the workspace passes around:
//! the planning state, the catalog shapes and the error type. It contains no
//! numerical logic.

pub mod catalog;
pub mod error;
pub mod state;
pub mod traits;
pub mod types;

pub use catalog::{FailureModeDef, MaterialDef, MechanismDef, StaticCatalog, TestDef};
pub use error::{Error, Result};
pub use state::{
    CoverageDimension, CoverageReport, DimensionScore, DvprRow, Exposure, FailureModeSelection,
    FixItem, HumidityLevel, MaterialSelection, MissionProfile, PlanningState, PlanningStep,
    ProductContext, ScheduleSettings,
};
pub use traits::ReferenceCatalog;
pub use types::*;

/// RelPlan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
