//! Acceleration factors for stress tests.
//!
//! Each test gets a physical model chosen from the mechanisms it links,
//! stress/use conditions derived from the mission profile (or taken from user
//! overrides), and the resulting acceleration factor and equivalent field
//! life.
//!
//! ## Models
//!
//! - **Arrhenius**: `AF = exp((Ea/k)(1/T_use − 1/T_stress))`
//! - **Coffin-Manson**: `AF = (ΔT_stress / ΔT_use)^n`
//! - **Peck / Eyring**: `AF = (RH_stress / RH_use)^m × Arrhenius`
//!
//! Temperatures are in kelvin inside the formulas, `k` is Boltzmann's constant
//! in eV/K.

use rp_core::{
    AccelParams, AccelWarning, AccelerationInfo, AccelerationModel, AccelOverrides,
    MissionProfile, SelectedTest, WarningSeverity,
};

use crate::config::AccelerationConfig;

/// Boltzmann constant, eV/K.
pub const BOLTZMANN_EV: f64 = 8.617e-5;

const KELVIN_OFFSET: f64 = 273.15;

/// Mechanism families that decide the acceleration model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MechanismFamily {
    HumidityCorrosion,
    ChemicalAttack,
    ThermalFatigue,
    ThermalAging,
    Electromigration,
    CreepRelaxation,
    Other,
}

impl MechanismFamily {
    /// Family of a catalog mechanism id.
    pub fn from_id(id: &str) -> Self {
        match id {
            "humidity-corrosion" => MechanismFamily::HumidityCorrosion,
            "chemical-attack" => MechanismFamily::ChemicalAttack,
            "thermal-fatigue" => MechanismFamily::ThermalFatigue,
            "thermal-aging" => MechanismFamily::ThermalAging,
            "electromigration" => MechanismFamily::Electromigration,
            "creep-relaxation" => MechanismFamily::CreepRelaxation,
            _ => MechanismFamily::Other,
        }
    }
}

/// Pick the model for a set of linked mechanisms. First matching rule wins.
pub fn select_model<'a>(
    mechanism_ids: impl IntoIterator<Item = &'a str>,
    declared_default: AccelerationModel,
) -> AccelerationModel {
    use MechanismFamily as F;
    let families: Vec<F> = mechanism_ids.into_iter().map(F::from_id).collect();
    let any = |want: &[F]| families.iter().any(|f| want.contains(f));

    if any(&[F::HumidityCorrosion]) {
        AccelerationModel::Peck
    } else if any(&[F::HumidityCorrosion, F::ChemicalAttack]) {
        AccelerationModel::Eyring
    } else if any(&[F::ThermalFatigue]) {
        AccelerationModel::CoffinManson
    } else if any(&[F::ThermalAging, F::Electromigration, F::CreepRelaxation]) {
        AccelerationModel::Arrhenius
    } else {
        declared_default
    }
}

/// Inputs shared by every test in one recompute.
#[derive(Debug, Clone, Copy)]
pub struct AccelerationContext<'a> {
    pub mission: &'a MissionProfile,
    /// Midpoint of the housing material's activation-energy range, if known.
    pub housing_ea: Option<f64>,
    pub cfg: &'a AccelerationConfig,
}

impl AccelerationContext<'_> {
    fn mission_temps_c(&self) -> (f64, f64) {
        let lo = self.mission.temp_min_c.unwrap_or(self.cfg.default_temp_min_c);
        let hi = self.mission.temp_max_c.unwrap_or(self.cfg.default_temp_max_c);
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    /// Use-condition relative humidity in %RH.
    pub fn rh_use(&self) -> f64 {
        self.mission
            .humidity_pct
            .or_else(|| self.mission.humidity_level.map(|l| self.cfg.rh_for_level(l)))
            .unwrap_or(self.cfg.rh_medium_pct)
    }

    pub fn service_life_years(&self) -> f64 {
        self.mission.service_life_years.unwrap_or(self.cfg.default_service_life_years)
    }
}

/// Derived default conditions for `model`, plus a warning when the stress
/// temperature had to be clamped.
pub fn default_params(
    model: AccelerationModel,
    ctx: &AccelerationContext<'_>,
) -> (AccelParams, Option<AccelWarning>) {
    let cfg = ctx.cfg;
    let (t_min, t_max) = ctx.mission_temps_c();

    let t_use_c = 0.5 * (t_min + t_max);
    let raw_stress_c = t_max + cfg.stress_offset_c;
    let t_stress_c = raw_stress_c.max(t_max + cfg.stress_min_margin_c).min(cfg.stress_ceiling_c);
    let clamp_warning = (t_stress_c != raw_stress_c).then(|| {
        AccelWarning::new(
            WarningSeverity::Info,
            format!(
                "stress temperature clamped from {:.1} °C to {:.1} °C",
                raw_stress_c, t_stress_c
            ),
        )
    });

    let delta_t_use = (t_max - t_min).max(1.0);
    let m = match model {
        AccelerationModel::Eyring => cfg.eyring_m,
        _ => cfg.peck_m,
    };

    let params = AccelParams {
        t_use_k: t_use_c + KELVIN_OFFSET,
        t_stress_k: t_stress_c + KELVIN_OFFSET,
        delta_t_use,
        delta_t_stress: delta_t_use + cfg.delta_t_stress_offset_c,
        rh_use: ctx.rh_use(),
        rh_stress: cfg.rh_stress_pct,
        ea: ctx.housing_ea.unwrap_or(cfg.default_ea_ev),
        n: cfg.coffin_manson_n,
        m,
    };
    (params, clamp_warning)
}

/// Replace every overridden field. The Eyring humidity exponent is fixed and
/// ignores an `m` override.
pub fn apply_overrides(
    mut params: AccelParams,
    overrides: &AccelOverrides,
    model: AccelerationModel,
) -> AccelParams {
    if !overrides.enabled {
        return params;
    }
    let set = |slot: &mut f64, v: Option<f64>| {
        if let Some(v) = v {
            *slot = v;
        }
    };
    set(&mut params.t_use_k, overrides.t_use_k);
    set(&mut params.t_stress_k, overrides.t_stress_k);
    set(&mut params.delta_t_use, overrides.delta_t_use);
    set(&mut params.delta_t_stress, overrides.delta_t_stress);
    set(&mut params.rh_use, overrides.rh_use);
    set(&mut params.rh_stress, overrides.rh_stress);
    set(&mut params.ea, overrides.ea);
    set(&mut params.n, overrides.n);
    if model != AccelerationModel::Eyring {
        set(&mut params.m, overrides.m);
    }
    params
}

fn arrhenius_term(p: &AccelParams) -> f64 {
    ((p.ea / BOLTZMANN_EV) * (1.0 / p.t_use_k - 1.0 / p.t_stress_k)).exp()
}

/// Acceleration factor and the warnings it raises.
///
/// A non-finite or non-positive result degrades to `AF = 1` with a blocking
/// warning.
pub fn acceleration_factor(
    model: AccelerationModel,
    p: &AccelParams,
    cfg: &AccelerationConfig,
) -> (f64, Vec<AccelWarning>) {
    let mut warnings = Vec::new();
    let af = match model {
        AccelerationModel::Arrhenius => arrhenius_term(p),
        AccelerationModel::CoffinManson => {
            if p.delta_t_use < cfg.min_delta_t_use_c {
                warnings.push(AccelWarning::new(
                    WarningSeverity::Warn,
                    format!(
                        "Coffin-Manson ΔT_use of {:.1} °C is below {:.0} °C; the fatigue ratio is unstable",
                        p.delta_t_use, cfg.min_delta_t_use_c
                    ),
                ));
            }
            (p.delta_t_stress / p.delta_t_use.max(1.0)).powf(p.n)
        }
        AccelerationModel::Peck | AccelerationModel::Eyring => {
            (p.rh_stress / p.rh_use.max(1.0)).powf(p.m) * arrhenius_term(p)
        }
        AccelerationModel::None => 1.0,
    };

    if !af.is_finite() || af <= 0.0 {
        warnings.push(AccelWarning::new(
            WarningSeverity::Block,
            format!("{} produced an invalid acceleration factor ({}); using 1", model.as_str(), af),
        ));
        return (1.0, warnings);
    }
    if af > cfg.af_warning_threshold {
        warnings.push(AccelWarning::new(
            WarningSeverity::Warn,
            format!("acceleration factor {:.3e} is very large; validate assumptions", af),
        ));
    }
    (af, warnings)
}

/// Recompute the acceleration annotation of one test.
///
/// `declared_default` is the catalog's default model for the test. A
/// non-`none` model already on the test is kept as-is.
pub fn annotate_test(
    test: &SelectedTest,
    declared_default: AccelerationModel,
    ctx: &AccelerationContext<'_>,
) -> AccelerationInfo {
    let model = match test.acceleration.model {
        AccelerationModel::None => {
            select_model(test.mechanism_ids.iter().map(String::as_str), declared_default)
        }
        pinned => pinned,
    };

    let overrides = &test.acceleration.user_overrides;
    let (defaults, clamp_warning) = default_params(model, ctx);
    let params = apply_overrides(defaults, overrides, model);

    let mut warnings = Vec::new();
    if model != AccelerationModel::None && !overrides.enabled {
        warnings.extend(clamp_warning);
    }
    let (af, af_warnings) = acceleration_factor(model, &params, ctx.cfg);
    warnings.extend(af_warnings);

    let equiv_years = ctx.service_life_years() * (test.effective_duration_weeks() / 52.0) * af;

    AccelerationInfo {
        model,
        params,
        user_overrides: overrides.clone(),
        af,
        equiv_years,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rp_core::HumidityLevel;

    fn test_with(mechs: &[&str]) -> SelectedTest {
        serde_json::from_value(serde_json::json!({
            "id": "t", "name": "T", "duration_weeks": 2.0,
            "mechanism_ids": mechs,
        }))
        .unwrap()
    }

    fn params(t_use_c: f64, t_stress_c: f64) -> AccelParams {
        AccelParams {
            t_use_k: t_use_c + KELVIN_OFFSET,
            t_stress_k: t_stress_c + KELVIN_OFFSET,
            delta_t_use: 50.0,
            delta_t_stress: 80.0,
            rh_use: 65.0,
            rh_stress: 85.0,
            ea: 0.7,
            n: 1.9,
            m: 2.7,
        }
    }

    #[test]
    fn test_model_selection_order() {
        use AccelerationModel as M;
        assert_eq!(select_model(["humidity-corrosion", "thermal-fatigue"], M::None), M::Peck);
        assert_eq!(select_model(["chemical-attack"], M::None), M::Eyring);
        assert_eq!(select_model(["thermal-fatigue", "thermal-aging"], M::None), M::CoffinManson);
        assert_eq!(select_model(["electromigration"], M::None), M::Arrhenius);
        assert_eq!(select_model(["creep-relaxation"], M::None), M::Arrhenius);
        assert_eq!(select_model(["vibration-fatigue"], M::CoffinManson), M::CoffinManson);
        assert_eq!(select_model(std::iter::empty::<&str>(), M::None), M::None);
    }

    #[test]
    fn test_arrhenius_closed_form() {
        let cfg = AccelerationConfig::default();
        let p = params(25.0, 85.0);
        let (af, warnings) = acceleration_factor(AccelerationModel::Arrhenius, &p, &cfg);
        let expected = ((0.7_f64 / 8.617e-5) * (1.0 / 298.15 - 1.0 / 358.15)).exp();
        assert_relative_eq!(af, expected, max_relative = 1e-12);
        assert!(af > 1.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_coffin_manson_small_delta_warns() {
        let cfg = AccelerationConfig::default();
        let mut p = params(25.0, 85.0);
        p.delta_t_use = 5.0;
        p.delta_t_stress = 35.0;
        let (af, warnings) = acceleration_factor(AccelerationModel::CoffinManson, &p, &cfg);
        assert_relative_eq!(af, 7.0_f64.powf(1.9), max_relative = 1e-12);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, WarningSeverity::Warn);
        assert!(warnings[0].message.contains("ΔT_use"));
    }

    #[test]
    fn test_peck_combines_humidity_and_temperature() {
        let cfg = AccelerationConfig::default();
        let p = params(25.0, 85.0);
        let (peck, _) = acceleration_factor(AccelerationModel::Peck, &p, &cfg);
        let (arr, _) = acceleration_factor(AccelerationModel::Arrhenius, &p, &cfg);
        assert_relative_eq!(peck, (85.0_f64 / 65.0).powf(2.7) * arr, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_af_falls_back_to_one() {
        let cfg = AccelerationConfig::default();
        let mut p = params(25.0, 85.0);
        p.t_use_k = 0.0;
        let (af, warnings) = acceleration_factor(AccelerationModel::Arrhenius, &p, &cfg);
        assert_eq!(af, 1.0);
        assert!(warnings.iter().any(|w| w.severity == WarningSeverity::Block));
    }

    #[test]
    fn test_huge_af_asks_for_validation() {
        let cfg = AccelerationConfig::default();
        let mut p = params(25.0, 150.0);
        p.ea = 1.2;
        let (af, warnings) = acceleration_factor(AccelerationModel::Arrhenius, &p, &cfg);
        assert!(af > 1e4);
        assert!(warnings.iter().any(|w| w.message.contains("validate assumptions")));
    }

    #[test]
    fn test_defaults_from_mission() {
        let cfg = AccelerationConfig::default();
        let mission = MissionProfile {
            temp_min_c: Some(-40.0),
            temp_max_c: Some(85.0),
            humidity_level: Some(HumidityLevel::High),
            ..Default::default()
        };
        let ctx = AccelerationContext { mission: &mission, housing_ea: Some(0.9), cfg: &cfg };
        let (p, warn) = default_params(AccelerationModel::Peck, &ctx);
        assert_relative_eq!(p.t_use_k, 22.5 + 273.15, epsilon = 1e-9);
        assert_relative_eq!(p.t_stress_k, 105.0 + 273.15, epsilon = 1e-9);
        assert_eq!(p.delta_t_use, 125.0);
        assert_eq!(p.delta_t_stress, 155.0);
        assert_eq!(p.rh_use, 85.0);
        assert_eq!(p.ea, 0.9);
        assert_eq!(p.m, 2.7);
        assert!(warn.is_none());

        let (p, _) = default_params(AccelerationModel::Eyring, &ctx);
        assert_eq!(p.m, 1.6);
    }

    #[test]
    fn test_stress_ceiling_clamp_warns() {
        let cfg = AccelerationConfig::default();
        let mission = MissionProfile {
            temp_min_c: Some(20.0),
            temp_max_c: Some(190.0),
            ..Default::default()
        };
        let ctx = AccelerationContext { mission: &mission, housing_ea: None, cfg: &cfg };
        let (p, warn) = default_params(AccelerationModel::Arrhenius, &ctx);
        assert_relative_eq!(p.t_stress_k, 200.0 + 273.15, epsilon = 1e-9);
        assert!(warn.unwrap().message.contains("clamped"));
    }

    #[test]
    fn test_overrides_replace_and_silence_clamp() {
        let cfg = AccelerationConfig::default();
        let mission = MissionProfile {
            temp_min_c: Some(20.0),
            temp_max_c: Some(190.0),
            ..Default::default()
        };
        let ctx = AccelerationContext { mission: &mission, housing_ea: None, cfg: &cfg };
        let mut t = test_with(&["thermal-aging"]);
        t.acceleration.user_overrides = AccelOverrides {
            enabled: true,
            t_use_k: Some(298.15),
            t_stress_k: Some(358.15),
            ..Default::default()
        };
        let info = annotate_test(&t, AccelerationModel::None, &ctx);
        assert_eq!(info.model, AccelerationModel::Arrhenius);
        assert_eq!(info.params.t_stress_k, 358.15);
        assert!(info.warnings.is_empty());

        // Disabled overrides are ignored.
        t.acceleration.user_overrides.enabled = false;
        let info = annotate_test(&t, AccelerationModel::None, &ctx);
        assert_relative_eq!(info.params.t_stress_k, 473.15, epsilon = 1e-9);
        assert_eq!(info.warnings.len(), 1);
    }

    #[test]
    fn test_eyring_ignores_m_override() {
        let p = apply_overrides(
            params(25.0, 85.0),
            &AccelOverrides { enabled: true, m: Some(4.0), ..Default::default() },
            AccelerationModel::Eyring,
        );
        assert_eq!(p.m, 2.7);
        let p = apply_overrides(
            params(25.0, 85.0),
            &AccelOverrides { enabled: true, m: Some(4.0), ..Default::default() },
            AccelerationModel::Peck,
        );
        assert_eq!(p.m, 4.0);
    }

    #[test]
    fn test_pinned_model_wins_and_equiv_years() {
        let cfg = AccelerationConfig::default();
        let mission = MissionProfile { service_life_years: Some(5.0), ..Default::default() };
        let ctx = AccelerationContext { mission: &mission, housing_ea: None, cfg: &cfg };
        let mut t = test_with(&["humidity-corrosion"]);
        t.acceleration.model = AccelerationModel::Arrhenius;
        let info = annotate_test(&t, AccelerationModel::None, &ctx);
        assert_eq!(info.model, AccelerationModel::Arrhenius);
        assert_relative_eq!(info.equiv_years, 5.0 * (2.0 / 52.0) * info.af, max_relative = 1e-12);

        let t = test_with(&[]);
        let info = annotate_test(&t, AccelerationModel::None, &ctx);
        assert_eq!(info.model, AccelerationModel::None);
        assert_eq!(info.af, 1.0);
        assert!(info.warnings.is_empty());
    }
}
