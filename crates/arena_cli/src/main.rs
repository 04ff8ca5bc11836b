//! Arena CLI
//!
//! Dry-runs the decision engine against a scripted sensor feed and inspects
//! run configurations.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arena_core::config::resolve_config_path;
use arena_core::sim::{ManualClock, RecordingMotion, ScriptedSensors};
use arena_core::{load_run_config, ConfigError, ControlLoop, RunConfig, RunMode, SensorSnapshot};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arena")]
#[command(version, about = "Arena robot behavior engine", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "arena_core=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a sensor script through the control loop on a simulated clock
    Run {
        /// Run config (TOML/JSON/YAML); falls back to $ARENA_RUN_CONFIG, then defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured run mode
        #[arg(long)]
        mode: Option<RunMode>,

        /// Seed for every random draw
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// JSON array of sensor snapshots, each stamped with the time it becomes current
        #[arg(long)]
        script: PathBuf,

        /// Stop after this many cycles
        #[arg(long, default_value_t = 100)]
        cycles: u64,

        /// Simulated latency of every sensor read
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,

        /// Also print every motion command after the run
        #[arg(long, default_value = "false")]
        commands: bool,
    },

    /// Inspect run configurations
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Dump {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = DumpFormat::Toml)]
        format: DumpFormat,

        /// Start from the bench-testing preset instead of the defaults
        #[arg(long, default_value = "false")]
        bench: bool,
    },
    /// Parse and validate a config file
    Check { path: PathBuf },
    /// Print the JSON schema of the run configuration
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Toml,
    Json,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

/// Explicit path, then the environment, then built-in defaults.
fn effective_config(explicit: Option<&Path>) -> Result<RunConfig> {
    match resolve_config_path(explicit) {
        Ok(path) => load_run_config(&path).with_context(|| format!("loading run config {}", path.display())),
        Err(ConfigError::MissingPath { env }) => {
            info!(env, "no run config given, using defaults");
            Ok(RunConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn load_script(path: &Path) -> Result<Vec<SensorSnapshot>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading sensor script {}", path.display()))?;
    let snapshots: Vec<SensorSnapshot> =
        serde_json::from_str(&text).with_context(|| format!("parsing sensor script {}", path.display()))?;
    if snapshots.is_empty() {
        bail!("sensor script {} has no snapshots", path.display());
    }
    Ok(snapshots)
}

fn write_json_line<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

struct RunArgs {
    config: Option<PathBuf>,
    mode: Option<RunMode>,
    seed: u64,
    script: PathBuf,
    cycles: u64,
    latency_ms: u64,
    commands: bool,
}

fn run(args: RunArgs, out: &mut impl Write) -> Result<()> {
    let mut config = effective_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.strategy.mode = mode;
    }
    config.validate().context("run config is invalid")?;
    let snapshots = load_script(&args.script)?;

    let clock = ManualClock::new();
    let sensors = ScriptedSensors::from_snapshots(clock.clone(), snapshots)
        .with_latency(Duration::from_millis(args.latency_ms));
    let motion = RecordingMotion::new(clock.clone());
    let rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut control =
        ControlLoop::new(&config, sensors, motion, clock, rng).context("building the control loop")?;

    let mut write_err = None;
    let result = control.run(Some(args.cycles), |report| {
        if write_err.is_none() {
            write_err = write_json_line(out, report).err();
        }
    });
    if let Some(e) = write_err {
        return Err(e.context("writing cycle report"));
    }

    if args.commands {
        for command in control.motion().commands() {
            write_json_line(out, command)?;
        }
    }

    match result {
        Ok(summary) => {
            info!(cycles = summary.cycles, stopped = summary.stopped, "run finished");
            Ok(())
        }
        Err(e) if e.is_operator_facing() => {
            warn!(error = %e, "run halted");
            Err(anyhow::Error::new(e).context("run halted"))
        }
        Err(e) => Err(anyhow::Error::new(e).context("control loop failed")),
    }
}

fn config_command(action: ConfigCommand, out: &mut impl Write) -> Result<()> {
    match action {
        ConfigCommand::Dump { config, format, bench } => {
            let cfg = if bench { RunConfig::bench() } else { effective_config(config.as_deref())? };
            let text = match format {
                DumpFormat::Toml => cfg.to_toml_string()?,
                DumpFormat::Json => serde_json::to_string_pretty(&cfg)?,
            };
            writeln!(out, "{text}")?;
        }
        ConfigCommand::Check { path } => {
            let cfg = load_run_config(&path).with_context(|| format!("checking {}", path.display()))?;
            writeln!(out, "{}: ok (mode {})", path.display(), cfg.strategy.mode)?;
        }
        ConfigCommand::Schema => {
            writeln!(out, "{}", serde_json::to_string_pretty(&RunConfig::json_schema())?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Run { config, mode, seed, script, cycles, latency_ms, commands } => {
            run(RunArgs { config, mode, seed, script, cycles, latency_ms, commands }, &mut out)
        }
        Commands::Config { action } => config_command(action, &mut out),
    }
}
