use clap::Parser;
use janitor::cli::{RunOptions, run_cli};
use janitor::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "janitor", version)]
#[command(about = "A CLI tool to clean up your desktop and other folders.")]
struct Cli {
    /// Simulate the cleanup without actually moving or deleting files
    #[arg(long, visible_alias = "simulate")]
    dry_run: bool,

    /// Path to the configuration file (defaults to ./janitor_config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not show progress bars
    #[arg(long)]
    no_progress: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = RunOptions {
        simulate: cli.dry_run,
        config_path: cli.config,
        show_progress: !cli.no_progress,
        json: cli.json,
    };

    match run_cli(&options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
