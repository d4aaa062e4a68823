//! Engine configuration.
//!
//! Every section defaults to the documented engineering constants; a config
//! file only needs the keys it changes.

use rp_core::{HumidityLevel, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration (YAML or JSON).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub acceleration: AccelerationConfig,
    pub evidence: EvidenceConfig,
    pub sample_size: SampleSizeConfig,
}

impl EngineConfig {
    /// Read a config file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let cfg: EngineConfig = if ext == "json" {
            serde_json::from_slice(&bytes)?
        } else {
            serde_yaml_ng::from_slice(&bytes)?
        };
        Ok(cfg)
    }
}

/// Default stress conditions for the acceleration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationConfig {
    /// Used when the mission has no minimum temperature.
    pub default_temp_min_c: f64,
    /// Used when the mission has no maximum temperature.
    pub default_temp_max_c: f64,
    /// Stress temperature = mission max + this offset.
    pub stress_offset_c: f64,
    /// Stress temperature is at least mission max + this margin.
    pub stress_min_margin_c: f64,
    /// Stress temperature ceiling.
    pub stress_ceiling_c: f64,
    /// ΔT_stress = ΔT_use + this offset.
    pub delta_t_stress_offset_c: f64,
    /// Coffin-Manson ΔT_use below this warns.
    pub min_delta_t_use_c: f64,
    pub rh_low_pct: f64,
    pub rh_medium_pct: f64,
    pub rh_high_pct: f64,
    pub rh_stress_pct: f64,
    /// eV, used when no housing material range is known.
    pub default_ea_ev: f64,
    pub coffin_manson_n: f64,
    pub peck_m: f64,
    pub eyring_m: f64,
    pub default_service_life_years: f64,
    /// AF above this asks the user to validate assumptions.
    pub af_warning_threshold: f64,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self {
            default_temp_min_c: -20.0,
            default_temp_max_c: 60.0,
            stress_offset_c: 20.0,
            stress_min_margin_c: 5.0,
            stress_ceiling_c: 200.0,
            delta_t_stress_offset_c: 30.0,
            min_delta_t_use_c: 10.0,
            rh_low_pct: 40.0,
            rh_medium_pct: 65.0,
            rh_high_pct: 85.0,
            rh_stress_pct: 85.0,
            default_ea_ev: 0.7,
            coffin_manson_n: 1.9,
            peck_m: 2.7,
            eyring_m: 1.6,
            default_service_life_years: 10.0,
            af_warning_threshold: 1e4,
        }
    }
}

impl AccelerationConfig {
    /// Relative humidity for a qualitative level.
    pub fn rh_for_level(&self, level: HumidityLevel) -> f64 {
        match level {
            HumidityLevel::Low => self.rh_low_pct,
            HumidityLevel::Medium => self.rh_medium_pct,
            HumidityLevel::High => self.rh_high_pct,
        }
    }
}

/// Badge thresholds on the posterior 95% upper failure probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub low_upper_bound: f64,
    pub med_upper_bound: f64,
    /// Quantile reported as the upper failure probability.
    pub upper_quantile: f64,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { low_upper_bound: 0.01, med_upper_bound: 0.05, upper_quantile: 0.95 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSizeConfig {
    /// Largest n the binomial search will try.
    pub max_n: u32,
}

impl Default for SampleSizeConfig {
    fn default() -> Self {
        Self { max_n: 5000 }
    }
}
