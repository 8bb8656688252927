use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser as _;
use observer::{ConsoleObserver, Observer};
use parser::Parser;
use processing::DateReport;
use serde_yaml::Value;
use settings::{Checks, Settings};
use tracing_subscriber::EnvFilter;

mod ast;
mod observer;
mod parser;
mod processing;
mod render;
mod schema;
mod settings;

/// Project keys are logged at `info`, so the default has to show them.
const DEFAULT_LOG_FILTER: &str = "info";

/// Read in a worklog (YAML) file, check its references and print it back
/// in canonical form.
#[derive(Debug, Clone, clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Worklog to read (default: `infile` from settings, else worklog.yaml).
    #[clap(short, long)]
    infile: Option<PathBuf>,
    /// Settings file (default: worklog.toml when present).
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Also print declared dates against `!YYYY-MM-DD` references.
    #[clap(long)]
    date_refs: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("🛑 {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let settings = Settings::discover(cli.config.as_deref(), &cwd)?;
    let path = settings.input_path(cli.infile.as_deref());

    tracing::info!(path = %path.display(), "loading worklog");
    let root = parser::load_file(&path)?;

    let mut observer = ConsoleObserver;
    let (text, report) = process(&root, &settings.checks, &mut observer)
        .with_context(|| format!("rejected worklog {}", path.display()))?;

    print!("{text}");
    if cli.date_refs {
        print!("{report}");
    }
    Ok(())
}

/// Builds, validates and renders a loaded document. Nothing is rendered
/// unless every check passes.
fn process(
    root: &Value,
    checks: &Checks,
    observer: &mut dyn Observer,
) -> anyhow::Result<(String, DateReport)> {
    let log = Parser::new(observer)
        .unique_ids(checks.unique_ids)
        .parse_log(root)?;

    processing::check_references(&log, observer)?;
    let report = processing::date_report(&log);
    if checks.strict_dates {
        report.enforce()?;
    }

    Ok((render::render(&log), report))
}
