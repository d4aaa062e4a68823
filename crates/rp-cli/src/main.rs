//! RelPlan CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rp_core::{
    AccelerationModel, MissionProfile, PlanningState, PriorEvidenceEntry, PriorType,
    ReliabilityMethod, ReliabilityPlan, StaticCatalog,
};
use rp_engine::acceleration::default_params;
use rp_engine::{AccelerationContext, EngineConfig, PlanningEngine, acceleration_factor};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relplan")]
#[command(about = "RelPlan - reliability test planning")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Engine config (YAML, or JSON by extension). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a planning state against a catalog and recompute every derived field
    Plan {
        /// Planning state (JSON, or YAML by extension)
        #[arg(short, long)]
        state: PathBuf,

        /// Reference catalog (JSON, or YAML by extension)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Output file for the recomputed state (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Minimum sample size for a reliability demonstration
    SampleSize {
        /// Target reliability R in (0, 1)
        #[arg(long, default_value = "0.9")]
        reliability: f64,

        /// Confidence level C in (0, 1)
        #[arg(long, default_value = "0.9")]
        confidence: f64,

        /// Allowed failures c
        #[arg(long, default_value = "0")]
        failures: u32,

        #[arg(long, value_enum, default_value = "binomial")]
        method: MethodArg,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fuse prior test evidence into a posterior failure-probability summary
    Evidence {
        /// Prior units tested
        #[arg(long)]
        n_prev: u32,

        /// Prior failures
        #[arg(long, default_value = "0")]
        f_prev: u32,

        /// Similarity of the prior product, percent
        #[arg(long, default_value = "100")]
        similarity: f64,

        #[arg(long, value_enum, default_value = "jeffreys")]
        prior: PriorArg,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Acceleration factor of one model under mission-derived conditions
    Af {
        #[arg(long, value_enum)]
        model: ModelArg,

        /// Mission minimum temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        temp_min: Option<f64>,

        /// Mission maximum temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        temp_max: Option<f64>,

        /// Mission relative humidity (%RH)
        #[arg(long)]
        humidity: Option<f64>,

        /// Activation energy (eV); defaults to the configured value
        #[arg(long)]
        ea: Option<f64>,

        /// Service life (years) for the equivalent-life figure
        #[arg(long)]
        service_life: Option<f64>,

        /// Test duration (weeks) for the equivalent-life figure
        #[arg(long, default_value = "1")]
        duration_weeks: f64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Binomial,
    WeibullBasic,
}

impl From<MethodArg> for ReliabilityMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Binomial => ReliabilityMethod::Binomial,
            MethodArg::WeibullBasic => ReliabilityMethod::WeibullBasic,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorArg {
    Jeffreys,
    Uniform,
}

impl From<PriorArg> for PriorType {
    fn from(p: PriorArg) -> Self {
        match p {
            PriorArg::Jeffreys => PriorType::Jeffreys,
            PriorArg::Uniform => PriorType::Uniform,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Arrhenius,
    CoffinManson,
    Peck,
    Eyring,
    None,
}

impl From<ModelArg> for AccelerationModel {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Arrhenius => AccelerationModel::Arrhenius,
            ModelArg::CoffinManson => AccelerationModel::CoffinManson,
            ModelArg::Peck => AccelerationModel::Peck,
            ModelArg::Eyring => AccelerationModel::Eyring,
            ModelArg::None => AccelerationModel::None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Plan { state, catalog, output } => {
            cmd_plan(config, &state, &catalog, output.as_ref())
        }
        Commands::SampleSize { reliability, confidence, failures, method, output } => {
            let plan = ReliabilityPlan {
                target_reliability: reliability,
                confidence,
                allowed_failures: failures,
                method: method.into(),
                required_sample_size: None,
            };
            cmd_sample_size(config, &plan, output.as_ref())
        }
        Commands::Evidence { n_prev, f_prev, similarity, prior, output } => {
            let entry = PriorEvidenceEntry {
                n_prev,
                f_prev,
                similarity_pct: similarity,
                prior_type: prior.into(),
            };
            cmd_evidence(config, &entry, output.as_ref())
        }
        Commands::Af {
            model,
            temp_min,
            temp_max,
            humidity,
            ea,
            service_life,
            duration_weeks,
            output,
        } => {
            let mission = MissionProfile {
                temp_min_c: temp_min,
                temp_max_c: temp_max,
                humidity_pct: humidity,
                service_life_years: service_life,
                ..Default::default()
            };
            cmd_af(config, model.into(), &mission, ea, duration_weeks, output.as_ref())
        }
        Commands::Version => {
            println!("relplan {}", rp_core::VERSION);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    tracing::info!(path = %path.display(), "loading engine config");
    EngineConfig::from_path(path)
        .with_context(|| format!("failed to read engine config {}", path.display()))
}

fn cmd_plan(
    config: EngineConfig,
    state_path: &PathBuf,
    catalog_path: &PathBuf,
    output: Option<&PathBuf>,
) -> Result<()> {
    tracing::info!(path = %catalog_path.display(), "loading catalog");
    let catalog = StaticCatalog::from_path(catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    tracing::info!(path = %state_path.display(), "loading planning state");
    let mut state = PlanningState::from_path(state_path)
        .with_context(|| format!("failed to load planning state {}", state_path.display()))?;

    let mut engine = PlanningEngine::with_config(config);
    engine.recompute(&mut state, &catalog)?;
    tracing::info!(
        tests = state.tests.len(),
        coverage = state.coverage.as_ref().map(|c| c.total),
        warnings = state.plan_warnings.len(),
        "plan recomputed"
    );
    for w in &state.plan_warnings {
        tracing::warn!("{}", w);
    }

    write_json(output, serde_json::to_value(&state)?)
}

fn cmd_sample_size(config: EngineConfig, plan: &ReliabilityPlan, output: Option<&PathBuf>) -> Result<()> {
    let mut engine = PlanningEngine::with_config(config);
    let solution = engine.sample_size(plan);
    tracing::info!(n = solution.n, met = solution.criterion_met, "sample size solved");

    let output_json = serde_json::json!({
        "target_reliability": plan.target_reliability,
        "confidence": plan.confidence,
        "allowed_failures": plan.allowed_failures,
        "method": plan.method,
        "n": solution.n,
        "criterion_met": solution.criterion_met,
        "warnings": solution.warnings,
    });
    write_json(output, output_json)
}

fn cmd_evidence(config: EngineConfig, entry: &PriorEvidenceEntry, output: Option<&PathBuf>) -> Result<()> {
    let mut engine = PlanningEngine::with_config(config);
    let summary = engine.evidence(Some(entry));
    write_json(output, serde_json::to_value(&summary)?)
}

fn cmd_af(
    config: EngineConfig,
    model: AccelerationModel,
    mission: &MissionProfile,
    ea: Option<f64>,
    duration_weeks: f64,
    output: Option<&PathBuf>,
) -> Result<()> {
    let cfg = &config.acceleration;
    let ctx = AccelerationContext { mission, housing_ea: ea, cfg };
    let (params, clamp_warning) = default_params(model, &ctx);
    let (af, mut warnings) = acceleration_factor(model, &params, cfg);
    if model != AccelerationModel::None {
        warnings.splice(0..0, clamp_warning);
    }
    let equiv_years = ctx.service_life_years() * (duration_weeks / 52.0) * af;
    tracing::info!(model = model.as_str(), af, "acceleration factor computed");

    let output_json = serde_json::json!({
        "model": model,
        "params": params,
        "af": af,
        "equiv_years": equiv_years,
        "warnings": warnings,
    });
    write_json(output, output_json)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
        tracing::info!(path = %path.display(), "wrote output");
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
