//! Entrypoint: set up tracing, load configuration, read the logs, exclusions
//! and template, then render and write the referrers report.
//!
//! Configuration (`Settings`, see `config.rs`) only covers the template
//! vocabulary and date format; file locations come from the command line:
//!  - `--config`      – YAML/TOML settings file (optional when left at the default)
//!  - `--exclusions`  – regular expressions, one per line
//!  - `--input`       – log file or glob pattern
//!  - `--template`    – report template
//!  - `--output`      – where the report goes

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use referrers::loader::{discover_logs, read_exclusions, read_log_lines, read_template, write_report};
use referrers::{run, Inputs, Settings, SortOrder};

const DEFAULT_CONFIG: &str = "config.yml";

/// Finds referrers in web-server access logs and renders them through a template.
#[derive(Parser, Debug)]
#[command(name = "referrers", version, about)]
struct Cli {
    /// Use CONFIG as the configuration file [default: config.yml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use EXCLUSIONS as the exclusions file
    #[arg(short, long, default_value = "exclusions.cfg")]
    exclusions: PathBuf,

    /// Use INPUT as the input file, or file(s) pattern
    #[arg(short, long, default_value = "access.log*")]
    input: String,

    /// Use TEMPLATE as the report template
    #[arg(short, long, default_value = "template.html")]
    template: PathBuf,

    /// Use OUTPUT as the output file
    #[arg(short, long, default_value = "report.html")]
    output: PathBuf,

    /// Sort oldest first
    #[arg(short = 'f', long)]
    oldest_first: bool,
}

impl Cli {
    /// Settings file to read, and whether it has to exist.
    ///
    /// Only a path given on the command line is required; the default may be absent.
    fn config_source(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG), false),
        }
    }

    fn order(&self) -> SortOrder {
        if self.oldest_first {
            SortOrder::OldestFirst
        } else {
            SortOrder::NewestFirst
        }
    }
}

/// **Workflow**:
/// 1. Initialise tracing/logging from `RUST_LOG` (or default to `info`).
/// 2. Load settings from the config file plus `REFERRERS__…` env overrides.
/// 3. Read logs, exclusions and template.
/// 4. Run the pipeline and write the report.
fn main() -> ExitCode {
    // ───────────────────────────────────────────────────────────────
    // 1. Initialise tracing / logging
    // ───────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    match generate(&cli) {
        Ok(()) => {
            info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn generate(cli: &Cli) -> anyhow::Result<()> {
    // ───────────────────────────────────────────────────────────────
    // 2. Load configuration
    // ───────────────────────────────────────────────────────────────
    let (config_path, required) = cli.config_source();
    let settings = Settings::load(&config_path, required)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    info!(?settings, "Loaded configuration");

    // ───────────────────────────────────────────────────────────────
    // 3. Inputs
    // ───────────────────────────────────────────────────────────────
    let log_files = discover_logs(&cli.input)?;
    let log_lines = read_log_lines(&log_files)?;
    let exclusions = read_exclusions(&cli.exclusions)?;
    let template = read_template(&cli.template)?;

    // ───────────────────────────────────────────────────────────────
    // 4. Render & write
    // ───────────────────────────────────────────────────────────────
    let report = run(Inputs {
        log_lines: &log_lines,
        exclusions: &exclusions,
        template: &template,
        settings: &settings,
        order: cli.order(),
        files_loaded: log_files.len(),
    })
    .context("generating report")?;
    info!(stats = ?report.stats, "Pipeline complete");

    write_report(&cli.output, &report.document)?;
    Ok(())
}
