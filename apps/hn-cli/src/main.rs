use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hn_app::{
    AppError, AppResult, InletSection, Pipeline, PipelineConfig, circle_of_willis_mapping,
    load_mapping, load_yaml,
};
use hn_model::ValidationReport;

#[derive(Parser)]
#[command(name = "hn-cli")]
#[command(about = "hemonet CLI - 1D arterial network model generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate model artifacts from anatomical measurements
    Build {
        /// Feature JSON (group -> vessel -> segment records)
        #[arg(long)]
        features: PathBuf,
        /// Landmark JSON used by connector rules
        #[arg(long)]
        landmarks: Option<PathBuf>,
        /// Variant JSON gating optional branches
        #[arg(long)]
        variants: Option<PathBuf>,
        /// Pipeline configuration YAML
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,
        /// Built-in configuration preset
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Use this node as the inlet instead of the configured policy
        #[arg(long)]
        inlet: Option<String>,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Check an artifact directory for solver readiness
    Validate {
        /// Directory holding main.csv and its referenced artifacts
        dir: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Nodes exempt from the unused-node check
        #[arg(long = "exempt")]
        exempt: Vec<String>,
        /// Pipeline configuration YAML (validation section)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Resize the mapped vessels of an existing model from measurements
    Regeometry {
        /// Baseline model directory
        #[arg(long)]
        baseline: PathBuf,
        /// Feature JSON (group -> vessel -> segment records)
        #[arg(long)]
        features: PathBuf,
        /// Segment to vessel mapping YAML; defaults to the Circle of Willis
        /// mapping of the reference body network
        #[arg(long)]
        mapping: Option<PathBuf>,
        /// Pipeline configuration YAML (catalog and network id)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print the effective configuration as YAML
    Config {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Circle of Willis connector rules and variant gates
    Cow,
}

fn main() -> AppResult<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            features,
            landmarks,
            variants,
            config,
            preset,
            inlet,
            out,
        } => {
            let mut cfg = resolve_config(config.as_deref(), preset)?;
            if let Some(node) = inlet {
                cfg.inlet = InletSection::Fixed { node };
            }
            cmd_build(
                cfg,
                &features,
                landmarks.as_deref(),
                variants.as_deref(),
                &out,
            )
        }
        Commands::Validate {
            dir,
            json,
            exempt,
            config,
        } => {
            let mut cfg = resolve_config(config.as_deref(), None)?;
            cfg.validation.exempt_nodes.extend(exempt);
            cmd_validate(cfg, &dir, json)
        }
        Commands::Regeometry {
            baseline,
            features,
            mapping,
            config,
            out,
        } => {
            let cfg = resolve_config(config.as_deref(), None)?;
            cmd_regeometry(cfg, &baseline, &features, mapping.as_deref(), &out)
        }
        Commands::Config { preset } => cmd_config(preset),
    }
}

fn resolve_config(path: Option<&Path>, preset: Option<Preset>) -> AppResult<PipelineConfig> {
    match (path, preset) {
        (Some(path), _) => load_yaml(path),
        (None, Some(Preset::Cow)) => Ok(PipelineConfig::circle_of_willis()),
        (None, None) => Ok(PipelineConfig::default()),
    }
}

fn cmd_build(
    cfg: PipelineConfig,
    features: &Path,
    landmarks: Option<&Path>,
    variants: Option<&Path>,
    out: &Path,
) -> AppResult<ExitCode> {
    let input = hn_anatomy::load_input(features, landmarks, variants)?;
    let pipeline = Pipeline::new(cfg)?;

    match pipeline.run(&input, out) {
        Ok(outcome) => {
            let build = &outcome.build;
            println!("✓ Model written to {}", out.display());
            println!(
                "  inlet: {} ({:?}{})",
                build.partition.inlet.node,
                build.partition.inlet.rule,
                if build.partition.inlet.terminal {
                    ""
                } else {
                    ", not terminal"
                }
            );
            println!(
                "  vessels: {}, nodes: {}, outlets: {}",
                build.model.vessels().len(),
                build.model.nodes().len(),
                build.model.outlets().len()
            );
            if !build.connectors.added.is_empty() || !build.connectors.skipped.is_empty() {
                println!(
                    "  connectors: {} added, {} skipped",
                    build.connectors.added.len(),
                    build.connectors.skipped.len()
                );
                for (id, reason) in &build.connectors.skipped {
                    println!("    - {}: {}", id, reason);
                }
            }
            if !build.skipped.is_empty() {
                println!("  catalog entries skipped: {}", build.skipped.len());
            }
            for name in outcome.emitted.artifacts.names() {
                println!("  {}", name);
            }
            println!("  digest: {}", outcome.emitted.digest);
            print_findings(&outcome.report);
            Ok(ExitCode::SUCCESS)
        }
        Err(AppError::NotSolverReady { report }) => {
            eprintln!("✗ Artifacts in {} are not solver-ready", out.display());
            print_findings(&report);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}

fn cmd_validate(cfg: PipelineConfig, dir: &Path, json: bool) -> AppResult<ExitCode> {
    let pipeline = Pipeline::new(cfg)?;
    let report = pipeline.validate_dir(dir);

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::Config(format!("Failed to serialize report: {}", e)))?;
        println!("{}", text);
    } else {
        println!("Validating artifacts in: {}", dir.display());
        print_findings(&report);
        if report.is_solver_ready() {
            println!("✓ Solver-ready ({} artifacts)", report.artifacts.len());
        } else {
            println!("✗ Not solver-ready");
        }
    }

    Ok(if report.is_solver_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_regeometry(
    cfg: PipelineConfig,
    baseline: &Path,
    features: &Path,
    mapping: Option<&Path>,
    out: &Path,
) -> AppResult<ExitCode> {
    let input = hn_anatomy::load_input(features, None, None)?;
    let mapping = match mapping {
        Some(path) => load_mapping(path)?,
        None => circle_of_willis_mapping(),
    };
    let pipeline = Pipeline::new(cfg)?;

    match pipeline.regeometry(baseline, &input, &mapping, out) {
        Ok(outcome) => {
            println!("✓ Re-geometrized {} into {}", baseline.display(), out.display());
            println!("  vessels updated: {}", outcome.updated.join(", "));
            println!("  digest: {}", outcome.emitted.digest);
            print_findings(&outcome.report);
            Ok(ExitCode::SUCCESS)
        }
        Err(AppError::NotSolverReady { report }) => {
            eprintln!("✗ Artifacts in {} are not solver-ready", out.display());
            print_findings(&report);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}

fn cmd_config(preset: Option<Preset>) -> AppResult<ExitCode> {
    let cfg = resolve_config(None, preset)?;
    print!("{}", cfg.to_yaml_string()?);
    Ok(ExitCode::SUCCESS)
}

fn print_findings(report: &ValidationReport) {
    for finding in &report.findings {
        println!("  {}", finding);
    }
}
