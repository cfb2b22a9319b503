//! shiftplan CLI - Tiered Shift Scheduling Engine
//!
//! Command-line interface for validating workforce files and generating
//! shift schedules.

mod diagnostics;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shiftplan_core::audit::audit;
use shiftplan_core::quality::ScheduleQuality;
use shiftplan_core::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, Horizon, ShiftScheduler, Workforce,
};
use shiftplan_solver::{generate_and_persist, SchedulerConfig, TieredScheduler};

use diagnostics::{DiagnosticConfig, ExitCode, JsonEmitter, TerminalEmitter};
use report::JsonReport;
use store::JsonFileStore;

#[derive(Parser)]
#[command(name = "shiftplan")]
#[command(author, version, about = "Tiered shift scheduling engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workforce file and list demand gaps
    Check {
        /// Workforce JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat demand gaps as errors
        #[arg(long)]
        strict: bool,
    },

    /// Generate a schedule for a date range
    Generate {
        /// Workforce JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// First day of the horizon (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the horizon, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Scheduler configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preference-weight seed; overrides the configuration
        #[arg(long, env = "SHIFTPLAN_SEED")]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Commit the schedule to a JSON store file
        #[arg(long, value_name = "STORE")]
        store: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let code = match cli.command {
        Some(Commands::Check { file, strict }) => cmd_check(&file, strict)?,
        Some(Commands::Generate {
            file,
            start,
            end,
            config,
            seed,
            format,
            output,
            store,
            strict,
            quiet,
        }) => {
            let diagnostics = DiagnosticConfig { strict, quiet };
            let request = GenerateRequest {
                start,
                end,
                config,
                seed,
                format,
                output,
                store,
            };
            cmd_generate(&file, &request, diagnostics)?
        }
        None => {
            println!("shiftplan - Tiered Shift Scheduling Engine");
            println!("Run with --help for usage information");
            ExitCode::Success
        }
    };

    Ok(code.into())
}

fn load_workforce(path: &Path) -> Result<Workforce> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse workforce file {}", path.display()))
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(file: &Path, strict: bool) -> Result<ExitCode> {
    let workforce = load_workforce(file)?;
    workforce
        .validate()
        .with_context(|| format!("{} is not a valid workforce", file.display()))?;

    let config = if strict {
        DiagnosticConfig::strict()
    } else {
        DiagnosticConfig::default()
    };
    let mut emitter = TerminalEmitter::new(io::stderr(), config);
    for gap in workforce.demand_gaps() {
        emitter.emit(Diagnostic::warning(
            DiagnosticCode::W001MissingDemand,
            gap.tier,
            gap.to_string(),
        ));
    }

    println!(
        "{}: {} categories, {} employees, {} work centers, tiers {:?}",
        file.display(),
        workforce.categories.len(),
        workforce.employees.len(),
        workforce.work_centers.len(),
        workforce.tiers()
    );
    Ok(emitter.exit_code())
}

// ============================================================================
// generate
// ============================================================================

struct GenerateRequest {
    start: NaiveDate,
    end: NaiveDate,
    config: Option<PathBuf>,
    seed: Option<u64>,
    format: OutputFormat,
    output: Option<PathBuf>,
    store: Option<PathBuf>,
}

fn cmd_generate(
    file: &Path,
    request: &GenerateRequest,
    diagnostics: DiagnosticConfig,
) -> Result<ExitCode> {
    let workforce = load_workforce(file)?;
    let horizon = Horizon::new(request.start, request.end)?;

    let mut config = match &request.config {
        Some(path) => SchedulerConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => SchedulerConfig::default(),
    };
    if let Some(seed) = request.seed {
        config = config.seed(seed);
    }
    debug!(seed = config.seed, days = horizon.days(), "starting generation");

    let rules = config.rules.clone();
    let scheduler = TieredScheduler::new(config);
    let (schedule_id, schedule) = match &request.store {
        Some(path) => {
            let mut store = JsonFileStore::new(path);
            let (id, schedule) = generate_and_persist(&scheduler, &mut store, &workforce, &horizon)
                .context("Schedule generation failed")?;
            info!(id, store = %store.path().display(), "schedule committed");
            (Some(id), schedule)
        }
        None => {
            let schedule = scheduler
                .generate(&workforce, &horizon)
                .context("Schedule generation failed")?;
            (None, schedule)
        }
    };

    let violations = audit(&schedule, &workforce, &rules);
    let quality = ScheduleQuality::evaluate(&schedule, &workforce);

    let (rendered, code) = match request.format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(io::stderr(), diagnostics);
            for diagnostic in &schedule.diagnostics {
                emitter.emit(diagnostic.clone());
            }
            let text =
                report::render_text(&schedule, &workforce, schedule_id, &violations, &quality);
            (text, emitter.exit_code())
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(diagnostics);
            for diagnostic in &schedule.diagnostics {
                emitter.emit(diagnostic.clone());
            }
            let document = JsonReport::new(
                &schedule,
                schedule_id,
                &violations,
                &quality,
                emitter.to_json_value(),
            );
            let mut json = serde_json::to_string_pretty(&document)?;
            json.push('\n');
            (json, emitter.exit_code())
        }
    };

    match &request.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().write_all(rendered.as_bytes())?,
    }
    Ok(code)
}
