use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use heatgrid::config::{DEFAULT_CONFIG_FILE, HeatgridConfig};
use heatgrid::format::OutputFormat;
use heatgrid::{Grid, RunRequest, pipeline, telemetry};

/// Paint a contribution heatmap with synthetic commits
///
/// Reads a 52x7 grid (one line per week, Sunday first) of the glyphs
///
///   #  none        $  1-9 commits    &  10-19 commits
///   *  20-29       .  30-50 commits
///
/// and writes a commit chain into the repository so that each day of YEAR
/// receives the sampled number of commits. Without GRID_FILE a built-in
/// demo pattern is used.
///
/// Runs are resumable: if a previous run was interrupted, running the same
/// command again continues where it stopped. Running a finished plan again
/// appends a second copy after it.
#[derive(Parser)]
#[command(name = "heatgrid")]
#[command(version, about)]
struct Cli {
    /// Year to draw (1971-9999)
    year: i32,

    /// Grid file; omit for the demo pattern
    grid_file: Option<PathBuf>,

    /// Repository to write to (created if missing or empty)
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Seed for commit-count sampling
    #[arg(long, env = "HEATGRID_SEED")]
    seed: Option<u64>,

    /// Branch to write (overrides repo.branch)
    #[arg(long)]
    branch: Option<String>,

    /// Commits per branch checkpoint (overrides build.batch_size)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Config file [default: <REPO>/.heatgrid.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate and plan only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Summary output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let grid = match &cli.grid_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read grid file {}", path.display()))?;
            Grid::parse(&text).with_context(|| format!("In grid file {}", path.display()))?
        }
        None => Grid::demo(),
    };

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.repo.join(DEFAULT_CONFIG_FILE));
    let mut config = HeatgridConfig::load(&config_path)?;
    if let Some(branch) = cli.branch {
        config.repo.branch = branch;
    }
    if let Some(batch_size) = cli.batch_size {
        config.build.batch_size = batch_size;
    }

    let request = RunRequest {
        year: cli.year,
        grid,
        repo_path: cli.repo,
        seed: cli.seed,
        config,
        dry_run: cli.dry_run,
    };
    let summary = pipeline::run(&request)?;
    println!("{}", cli.format.render_summary(&summary)?.trim_end());
    Ok(())
}
