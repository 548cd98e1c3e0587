//! Command-line interface module for janitor.
//!
//! Ties the pieces together for one invocation: load and compile the
//! configuration, run the janitor over the watched folders, and print the
//! outcome either as a table or as JSON.

use crate::config::{ConfigError, JanitorConfig};
use crate::janitor::{Janitor, NoopObserver, ScanObserver, ScanReport};
use crate::output::{OutputFormatter, ProgressObserver};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;

/// Options for a single janitor run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// If true, report what would happen without touching any file.
    pub simulate: bool,
    /// Explicit config file; otherwise the default locations are searched.
    pub config_path: Option<PathBuf>,
    /// Show a progress bar per folder.
    pub show_progress: bool,
    /// Print the report as JSON instead of a table.
    pub json: bool,
}

/// Runs the janitor once with the given options.
///
/// Per-file failures are part of the returned report and do not make this
/// function fail; only a config that cannot be loaded or compiled does.
///
/// # Examples
///
/// ```no_run
/// use janitor::cli::{RunOptions, run_cli};
///
/// let options = RunOptions { simulate: true, ..Default::default() };
/// match run_cli(&options) {
///     Ok(report) => println!("{} files scanned", report.files_scanned),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(options: &RunOptions) -> Result<ScanReport, ConfigError> {
    let config = JanitorConfig::load(options.config_path.as_deref())?.compile()?;
    let janitor = Janitor::new(config);
    info!(
        folders = janitor.folders().len(),
        rules = janitor.rules().len(),
        simulate = options.simulate,
        "starting janitor run"
    );

    if !options.json {
        OutputFormatter::banner();
        if options.simulate {
            OutputFormatter::dry_run_notice("No files will be moved or deleted.");
        }
    }

    let mut progress = ProgressObserver::new();
    let mut quiet = NoopObserver;
    let observer: &mut dyn ScanObserver = if options.show_progress && !options.json {
        &mut progress
    } else {
        &mut quiet
    };

    let report = janitor.run_with_observer(options.simulate, observer);

    if options.json {
        println!("{}", report_to_json(&report));
    } else {
        OutputFormatter::summary(&report);
        let handled = report.records().count();
        if handled > 0 {
            if options.simulate {
                OutputFormatter::dry_run_notice("Run without --dry-run to apply these actions.");
            } else {
                OutputFormatter::success(&format!("Cleanup complete: {} files handled.", handled));
            }
        }
    }

    Ok(report)
}

/// Renders a report as a JSON document.
pub fn report_to_json(report: &ScanReport) -> Value {
    json!({
        "started_at": report.started_at.to_rfc3339(),
        "simulated": report.simulated,
        "files_scanned": report.files_scanned,
        "cancelled": report.cancelled,
        "folders_skipped": report
            .folders_skipped
            .iter()
            .map(|f| f.to_string_lossy().to_string())
            .collect::<Vec<_>>(),
        "actions": report.records().map(|r| {
            json!({
                "action": r.verb,
                "file": r.file_name,
                "destination": r.destination_display(),
            })
        }).collect::<Vec<_>>(),
        "failures": report.failures().map(|f| {
            json!({
                "file": f.file_name,
                "path": f.path.to_string_lossy().to_string(),
                "error": f.error.to_string(),
            })
        }).collect::<Vec<_>>(),
    })
}
