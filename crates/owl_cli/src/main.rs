mod report;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use owl_core::curves::{sample_polynomial, simulate_trajectory, DEFAULT_INITIAL_STATES};
use owl_core::jacobian::JacobianSettings;
use owl_core::{
    run_analysis, AnalysisSettings, ModelParameters, OwlModel, RootFinder, RootStrategy,
    DEFAULT_HABITATS,
};
use report::{write_samples, write_stability, write_trajectories, Orbit, OutputFormat};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Equilibria and linear stability of the paired/single-male owl population map
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the model constants (s_s, s_j, p_s, p_b, f, m, n, t, t_prime)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Locate positive equilibria and classify their stability
    Stability(StabilityArgs),
    /// Sample the equilibrium residual p(S_m; U)
    Curve(CurveArgs),
    /// Iterate the map from one or more initial states
    Trajectory(TrajectoryArgs),
}

#[derive(Args, Debug)]
struct StabilityArgs {
    /// Habitat capacity U (repeatable)
    #[arg(short = 'u', long = "habitat", value_name = "U")]
    habitats: Vec<f64>,

    #[arg(long, value_enum, default_value_t = StrategyArg::MultiStart)]
    strategy: StrategyArg,

    /// Central-difference step for the Jacobian
    #[arg(long, default_value_t = 1e-4)]
    step: f64,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct CurveArgs {
    #[arg(short = 'u', long = "habitat", value_name = "U")]
    habitats: Vec<f64>,

    #[arg(long, default_value_t = 0.0)]
    start: f64,

    #[arg(long, default_value_t = 40.0)]
    end: f64,

    #[arg(long, default_value_t = 400)]
    points: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct TrajectoryArgs {
    #[arg(short = 'u', long = "habitat", value_name = "U", default_value_t = 250.0)]
    habitat: f64,

    #[arg(long, default_value_t = 80)]
    steps: usize,

    /// Initial state as P,S_m (repeatable)
    #[arg(long = "initial", value_name = "P,S_m", value_parser = parse_state)]
    initial: Vec<(f64, f64)>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum StrategyArg {
    MultiStart,
    Bracketing,
}

impl From<StrategyArg> for RootStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::MultiStart => RootStrategy::MultiStart,
            StrategyArg::Bracketing => RootStrategy::Bracketing,
        }
    }
}

fn parse_state(raw: &str) -> Result<(f64, f64), String> {
    let (p, s_m) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected P,S_m, got \"{raw}\""))?;
    let p = p.trim().parse::<f64>().map_err(|e| format!("invalid P: {e}"))?;
    let s_m = s_m.trim().parse::<f64>().map_err(|e| format!("invalid S_m: {e}"))?;
    Ok((p, s_m))
}

fn habitats_or_default(habitats: &[f64]) -> Vec<f64> {
    if habitats.is_empty() {
        DEFAULT_HABITATS.to_vec()
    } else {
        habitats.to_vec()
    }
}

fn load_parameters(path: Option<&PathBuf>) -> Result<ModelParameters> {
    match path {
        Some(path) => {
            let params = ModelParameters::load(path)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?;
            info!(path = %path.display(), "loaded model parameters");
            Ok(params)
        }
        None => Ok(ModelParameters::default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let params = load_parameters(cli.config.as_ref())?;
    params.validate().context("Invalid model parameters.")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Stability(args) => {
            let settings = AnalysisSettings {
                roots: RootFinder::with_strategy(args.strategy.into()),
                jacobian: JacobianSettings { step: args.step },
            };
            let habitats = habitats_or_default(&args.habitats);
            let rows = run_analysis(&params, &habitats, &settings)?;
            write_stability(&mut out, &rows, args.format)?;
        }
        Command::Curve(args) => {
            let mut samples = Vec::new();
            for habitat in habitats_or_default(&args.habitats) {
                let model = OwlModel::new(params, habitat);
                samples.extend(sample_polynomial(&model, args.start, args.end, args.points)?);
            }
            write_samples(&mut out, &samples, args.format)?;
        }
        Command::Trajectory(args) => {
            if !args.habitat.is_finite() {
                bail!("Habitat capacity must be finite, got {}.", args.habitat);
            }
            let initial = if args.initial.is_empty() {
                DEFAULT_INITIAL_STATES.to_vec()
            } else {
                args.initial
            };
            let model = OwlModel::new(params, args.habitat);
            let mut orbits: Vec<Orbit> = Vec::with_capacity(initial.len());
            for (p0, s0) in initial {
                orbits.push(((p0, s0), simulate_trajectory(&model, p0, s0, args.steps)?));
            }
            write_trajectories(&mut out, &orbits, args.format)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "owl_core=debug,owl_cli=debug"
    } else {
        "owl_core=info,owl_cli=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    run(cli)
}

#[cfg(test)]
mod tests {
    use super::{habitats_or_default, parse_state, Cli, Command};
    use clap::Parser;

    #[test]
    fn state_parser_accepts_pairs_with_spaces() {
        assert_eq!(parse_state("30, 20"), Ok((30.0, 20.0)));
        assert!(parse_state("30").is_err());
        assert!(parse_state("a,1").is_err());
    }

    #[test]
    fn empty_habitat_list_falls_back_to_defaults() {
        assert_eq!(habitats_or_default(&[]), vec![100.0, 150.0, 200.0, 250.0]);
        assert_eq!(habitats_or_default(&[75.0]), vec![75.0]);
    }

    #[test]
    fn stability_flags_parse() {
        let cli = Cli::try_parse_from([
            "owl-stability",
            "stability",
            "-u",
            "150",
            "--habitat",
            "250",
            "--strategy",
            "bracketing",
            "--format",
            "csv",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Stability(args) => {
                assert_eq!(args.habitats, vec![150.0, 250.0]);
                assert_eq!(args.step, 1e-4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn trajectory_initial_states_parse() {
        let cli = Cli::try_parse_from([
            "owl-stability",
            "trajectory",
            "--initial",
            "5,5",
            "--initial",
            "30,20",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Trajectory(args) => {
                assert_eq!(args.initial, vec![(5.0, 5.0), (30.0, 20.0)]);
                assert_eq!(args.habitat, 250.0);
                assert_eq!(args.steps, 80);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
