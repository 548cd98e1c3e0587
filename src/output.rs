//! Output formatting and styling module.
//!
//! Everything the janitor prints to the terminal goes through here: the
//! banner, per-folder progress bars and the final summary table. The scan
//! itself never prints; it reports to a [`ScanObserver`] and returns a
//! [`ScanReport`] which this module renders.

use crate::condition::FileEntry;
use crate::janitor::{ScanEntry, ScanObserver, ScanReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::ops::ControlFlow;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use janitor::output::OutputFormatter;
    /// OutputFormatter::success("Cleanup complete: 3 files handled.");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints the program banner.
    pub fn banner() {
        let title = "Desktop Janitor";
        let rule = "═".repeat(title.len() + 4);
        println!("{}", rule.cyan());
        println!("  {}  ", title.cyan().bold());
        println!("{}", rule.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for scanning the files of one watched folder.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of files the folder holds after filtering
    ///
    /// # Returns
    ///
    /// A styled `ProgressBar`; the caller advances it once per file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use janitor::output::OutputFormatter;
    ///
    /// let pb = OutputFormatter::create_progress_bar(12);
    /// pb.set_message("Scanning Downloads...");
    /// for _ in 0..12 {
    ///     pb.inc(1);
    /// }
    /// pb.finish();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the table of actions taken, or the all-tidy message when there were none.
    ///
    /// Failures are listed after the table, and a warning follows if the
    /// scan was cancelled. Simulated reports get a "(simulated)" title.
    ///
    /// # Arguments
    ///
    /// * `report` - The report returned by a janitor run
    ///
    /// # Example
    ///
    /// ```no_run
    /// use janitor::config::JanitorConfig;
    /// use janitor::janitor::Janitor;
    /// use janitor::output::OutputFormatter;
    ///
    /// let config = JanitorConfig::load(None).unwrap().compile().unwrap();
    /// let report = Janitor::new(config).run(true);
    /// OutputFormatter::summary(&report);
    /// ```
    pub fn summary(report: &ScanReport) {
        let records: Vec<_> = report.records().collect();

        if records.is_empty() {
            if !report.has_failures() {
                println!(
                    "\n{}",
                    "No actions were needed. Everything is tidy! ✨".green().bold()
                );
            }
        } else {
            let title = if report.simulated {
                "Janitor Actions Summary (simulated)"
            } else {
                "Janitor Actions Summary"
            };
            Self::header(title);

            let rows: Vec<(String, String, String)> = records
                .iter()
                .map(|r| (r.verb.to_string(), r.file_name.clone(), r.destination_display()))
                .collect();

            let action_width = column_width(rows.iter().map(|r| r.0.as_str()), "Action");
            let file_width = column_width(rows.iter().map(|r| r.1.as_str()), "File");

            println!(
                "{} | {} | {}",
                pad("Action", action_width).bold(),
                pad("File", file_width).bold(),
                "Destination".bold()
            );
            println!("{}", "-".repeat(action_width + file_width + 20).cyan());

            for (action, file, destination) in &rows {
                println!(
                    "{} | {} | {}",
                    pad(action, action_width).magenta(),
                    pad(file, file_width).green(),
                    destination.blue()
                );
            }

            println!("{}", "-".repeat(action_width + file_width + 20).cyan());
            println!(
                "{} moved, {} deleted, {} scanned",
                report.moved_count().to_string().green().bold(),
                report.deleted_count().to_string().green().bold(),
                report.files_scanned
            );
        }

        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            Self::header("FAILURES");
            for failure in failures {
                Self::error(&format!("{}: {}", failure.file_name, failure.error));
            }
        }

        if report.cancelled {
            Self::warning("Scan was stopped before all files were processed.");
        }
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, heading: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(heading.len())
}

fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", value, width = width)
}

/// Shows one progress bar per watched folder while a scan runs.
#[derive(Default)]
pub struct ProgressObserver {
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanObserver for ProgressObserver {
    fn folder_started(&mut self, folder: &Path, file_count: usize) {
        let label = folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder.display().to_string());
        let bar = OutputFormatter::create_progress_bar(file_count as u64);
        bar.set_message(format!("Scanning {}...", label));
        self.bar = Some(bar);
    }

    fn file_processed(&mut self, _file: &FileEntry, _entry: Option<&ScanEntry>) -> ControlFlow<()> {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        ControlFlow::Continue(())
    }

    fn folder_finished(&mut self, _folder: &Path) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
