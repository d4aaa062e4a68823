//! Plain-data reference catalog.
//!
//! [`StaticCatalog`] is the serde shape the CLI and tests load; any other
//! knowledge base can be plugged in by implementing
//! [`ReferenceCatalog`](crate::ReferenceCatalog).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::traits::ReferenceCatalog;
use crate::types::{AccelerationModel, Confidence, CoverageLevel, Stressor};
use crate::{Error, Result};

/// Catalog entry for a failure mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_confidence: Confidence,
}

/// Catalog entry for a verification test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDef {
    pub id: String,
    pub name: String,
    pub mechanism_ids: Vec<String>,
    #[serde(default)]
    pub coverage: CoverageLevel,
    pub duration_weeks: f64,
    #[serde(default = "default_cost_level")]
    pub cost_level: u8,
    #[serde(default)]
    pub default_model: AccelerationModel,
    #[serde(default)]
    pub stressors: Vec<Stressor>,
}

fn default_cost_level() -> u8 {
    2
}

/// Catalog entry for a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub id: String,
    pub name: String,
    /// Activation-energy range in eV, `(low, high)`.
    #[serde(default)]
    pub ea_range_ev: Option<(f64, f64)>,
}

impl MaterialDef {
    /// Midpoint of the activation-energy range.
    pub fn ea_midpoint(&self) -> Option<f64> {
        self.ea_range_ev.map(|(lo, hi)| 0.5 * (lo + hi))
    }
}

/// Catalog entry for a failure mode with default FMEA ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureModeDef {
    pub id: String,
    pub name: String,
    pub mechanism_ids: Vec<String>,
    pub severity: u8,
    pub occurrence: u8,
    pub detection: u8,
}

/// In-memory catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticCatalog {
    pub mechanisms: Vec<MechanismDef>,
    pub tests: Vec<TestDef>,
    pub materials: Vec<MaterialDef>,
    pub failure_modes: Vec<FailureModeDef>,
}

impl StaticCatalog {
    /// Load a catalog from JSON or YAML (chosen by file extension).
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let catalog: StaticCatalog = if ext == "json" {
            serde_json::from_slice(&bytes)?
        } else {
            serde_yaml_ng::from_slice(&bytes)?
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check id uniqueness and that tests/failure modes only link known mechanisms.
    pub fn validate(&self) -> Result<()> {
        unique_ids("mechanism", self.mechanisms.iter().map(|m| m.id.as_str()))?;
        unique_ids("test", self.tests.iter().map(|t| t.id.as_str()))?;
        unique_ids("material", self.materials.iter().map(|m| m.id.as_str()))?;
        unique_ids("failure mode", self.failure_modes.iter().map(|f| f.id.as_str()))?;

        let known: HashSet<&str> = self.mechanisms.iter().map(|m| m.id.as_str()).collect();
        for t in &self.tests {
            if let Some(m) = t.mechanism_ids.iter().find(|m| !known.contains(m.as_str())) {
                return Err(Error::Catalog(format!(
                    "test '{}' links unknown mechanism '{}'",
                    t.id, m
                )));
            }
            if !t.duration_weeks.is_finite() || t.duration_weeks < 0.0 {
                return Err(Error::Catalog(format!(
                    "test '{}' has invalid duration {}",
                    t.id, t.duration_weeks
                )));
            }
        }
        for f in &self.failure_modes {
            if let Some(m) = f.mechanism_ids.iter().find(|m| !known.contains(m.as_str())) {
                return Err(Error::Catalog(format!(
                    "failure mode '{}' links unknown mechanism '{}'",
                    f.id, m
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::Validation(format!("duplicate {} id '{}'", kind, id)));
        }
    }
    Ok(())
}

impl ReferenceCatalog for StaticCatalog {
    fn mechanisms(&self) -> &[MechanismDef] {
        &self.mechanisms
    }

    fn tests(&self) -> &[TestDef] {
        &self.tests
    }

    fn failure_modes(&self) -> &[FailureModeDef] {
        &self.failure_modes
    }

    fn material(&self, id: &str) -> Option<&MaterialDef> {
        self.materials.iter().find(|m| m.id == id)
    }
}
