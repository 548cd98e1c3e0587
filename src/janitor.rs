//! The scan loop: watched folders in, action records out.
//!
//! For every watched folder that exists, each regular file is resolved
//! against the rules, the winning rule's action is planned and executed,
//! and the outcome is appended to the report. A failure on one file never
//! stops the scan; a missing folder is skipped silently.

use crate::condition::FileEntry;
use crate::config::CompiledConfig;
use crate::executor::{ActionError, ActionExecutor, ActionRecord, ActionVerb};
use crate::filter::ScanFilter;
use crate::planner::plan;
use crate::rule::{Rule, matching_rules};
use chrono::{DateTime, Local, Utc};
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file whose action could not be carried out.
#[derive(Debug)]
pub struct ActionFailure {
    pub file_name: String,
    pub path: PathBuf,
    pub error: ActionError,
}

/// The outcome recorded for one file that had a planned action.
#[derive(Debug)]
pub enum ScanEntry {
    Action(ActionRecord),
    Failed(ActionFailure),
}

/// Everything a run produced, in the order it happened.
#[derive(Debug)]
pub struct ScanReport {
    pub started_at: DateTime<Local>,
    pub simulated: bool,
    pub entries: Vec<ScanEntry>,
    /// Number of files examined (after filtering).
    pub files_scanned: usize,
    /// Watched folders that did not exist or could not be listed.
    pub folders_skipped: Vec<PathBuf>,
    /// True if an observer stopped the scan early.
    pub cancelled: bool,
}

impl ScanReport {
    fn new(simulated: bool) -> Self {
        Self {
            started_at: Local::now(),
            simulated,
            entries: Vec::new(),
            files_scanned: 0,
            folders_skipped: Vec::new(),
            cancelled: false,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ActionRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Action(record) => Some(record),
            ScanEntry::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionFailure> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Failed(failure) => Some(failure),
            ScanEntry::Action(_) => None,
        })
    }

    pub fn moved_count(&self) -> usize {
        self.records().filter(|r| r.verb == ActionVerb::Moved).count()
    }

    pub fn deleted_count(&self) -> usize {
        self.records().filter(|r| r.verb == ActionVerb::Deleted).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Receives progress notifications during a scan.
///
/// All methods have empty defaults. Returning `ControlFlow::Break` from
/// [`ScanObserver::file_processed`] stops the scan before the next file.
pub trait ScanObserver {
    fn folder_started(&mut self, _folder: &Path, _file_count: usize) {}

    /// Called once per examined file; `entry` is `None` when no rule acted on it.
    fn file_processed(&mut self, _file: &FileEntry, _entry: Option<&ScanEntry>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn folder_finished(&mut self, _folder: &Path) {}
}

/// An observer that ignores every notification.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Scans watched folders and applies rules to the files found.
#[derive(Debug, Clone)]
pub struct Janitor {
    folders: Vec<PathBuf>,
    rules: Vec<Rule>,
    filter: ScanFilter,
}

impl Janitor {
    pub fn new(config: CompiledConfig) -> Self {
        Self {
            folders: config.folders,
            rules: config.rules,
            filter: config.filter,
        }
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs one pass over all watched folders.
    ///
    /// With `simulate` set nothing on disk changes, but the report lists
    /// the same actions a real run would perform.
    pub fn run(&self, simulate: bool) -> ScanReport {
        self.run_with_observer(simulate, &mut NoopObserver)
    }

    /// Runs one pass, notifying `observer` as folders and files are processed.
    pub fn run_with_observer(&self, simulate: bool, observer: &mut dyn ScanObserver) -> ScanReport {
        let mut report = ScanReport::new(simulate);
        let observed_at = Utc::now();

        for folder in &self.folders {
            if !folder.is_dir() {
                debug!(folder = %folder.display(), "watched folder missing, skipping");
                report.folders_skipped.push(folder.clone());
                continue;
            }

            let paths = match self.list_files(folder) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "could not list folder, skipping");
                    report.folders_skipped.push(folder.clone());
                    continue;
                }
            };

            observer.folder_started(folder, paths.len());
            for path in paths {
                let file = FileEntry::from_path(folder, path, observed_at);
                report.files_scanned += 1;

                let entry = self.process_file(&file, folder, simulate);
                let flow = observer.file_processed(&file, entry.as_ref());
                if let Some(entry) = entry {
                    report.entries.push(entry);
                }

                if flow.is_break() {
                    debug!("scan cancelled by observer");
                    report.cancelled = true;
                    observer.folder_finished(folder);
                    return report;
                }
            }
            observer.folder_finished(folder);
        }

        report
    }

    /// Resolves, plans and executes the action for a single file.
    ///
    /// A matching move rule without destination is passed over and the
    /// following rules are tried. Any other match ends resolution; a rule
    /// with an unknown action therefore leaves the file alone.
    fn process_file(&self, file: &FileEntry, folder: &Path, simulate: bool) -> Option<ScanEntry> {
        let rule = matching_rules(&self.rules, file, folder).find(|rule| {
            let defers = rule.defers_to_next();
            if defers {
                debug!(file = %file.name, rule = %rule.name, "move rule has no destination, trying next rule");
            }
            !defers
        })?;

        let Some(action) = plan(rule, file) else {
            debug!(file = %file.name, rule = %rule.name, action = %rule.action, "rule matched with unknown action, leaving file");
            return None;
        };

        debug!(file = %file.name, rule = %rule.name, "rule matched");
        let entry = match ActionExecutor::execute(&action, simulate) {
            Ok(record) => ScanEntry::Action(record),
            Err(error) => {
                warn!(file = %file.name, error = %error, "action failed");
                ScanEntry::Failed(ActionFailure {
                    file_name: file.name.clone(),
                    path: file.path.clone(),
                    error,
                })
            }
        };
        Some(entry)
    }

    /// Paths of the regular files directly inside `folder` that pass the filter, sorted by name.
    ///
    /// Paths come straight from `read_dir`, so names that are not valid
    /// UTF-8 still point at the right file.
    fn list_files(&self, folder: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .filter(|entry| self.filter.should_include(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.path())
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Conditions;
    use crate::rule::RuleAction;
    use tempfile::TempDir;

    fn rule(extensions: &[&str], action: RuleAction, destination: Option<PathBuf>) -> Rule {
        Rule {
            name: format!("{:?}", extensions),
            conditions: Conditions {
                extensions: Some(extensions.iter().map(|e| e.to_string()).collect()),
                ..Default::default()
            },
            action,
            destination,
        }
    }

    fn janitor(folders: Vec<PathBuf>, rules: Vec<Rule>) -> Janitor {
        Janitor::new(CompiledConfig {
            folders,
            rules,
            filter: ScanFilter::default(),
        })
    }

    #[test]
    fn test_missing_folder_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let present = temp_dir.path().join("present");
        fs::create_dir(&present).expect("Failed to create directory");
        fs::write(present.join("a.tmp"), "x").expect("Failed to write test file");

        let missing = temp_dir.path().join("missing");
        let janitor = janitor(
            vec![missing.clone(), present.clone()],
            vec![rule(&[".tmp"], RuleAction::Delete, None)],
        );

        let report = janitor.run(false);
        assert_eq!(report.folders_skipped, vec![missing]);
        assert_eq!(report.records().count(), 1);
        assert!(!present.join("a.tmp").exists());
    }

    #[test]
    fn test_move_without_destination_falls_through_to_next_rule() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();
        fs::write(base.join("a.pdf"), "x").expect("Failed to write test file");

        let janitor = janitor(
            vec![base.clone()],
            vec![
                rule(&[".pdf"], RuleAction::Move, None),
                rule(&[".pdf"], RuleAction::Delete, None),
            ],
        );

        let report = janitor.run(false);
        let records: Vec<_> = report.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].verb, ActionVerb::Deleted);
    }

    #[test]
    fn test_unknown_action_stops_resolution() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().join("inbox");
        fs::create_dir(&base).expect("Failed to create directory");
        fs::write(base.join("keep.pdf"), "x").expect("Failed to write test file");

        let janitor = janitor(
            vec![base.clone()],
            vec![
                rule(&[".pdf"], RuleAction::Unknown("archive".into()), None),
                rule(&[".pdf"], RuleAction::Delete, None),
            ],
        );

        let report = janitor.run(false);
        assert!(report.entries.is_empty());
        assert_eq!(report.deleted_count(), 0);
        assert_eq!(report.files_scanned, 1);
        assert!(base.join("keep.pdf").exists());
    }

    #[test]
    fn test_move_without_destination_then_unknown_action_leaves_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();
        fs::write(base.join("a.pdf"), "x").expect("Failed to write test file");

        let janitor = janitor(
            vec![base.clone()],
            vec![
                rule(&[".pdf"], RuleAction::Move, None),
                rule(&[".pdf"], RuleAction::Unknown("archive".into()), None),
                rule(&[".pdf"], RuleAction::Delete, None),
            ],
        );

        let report = janitor.run(false);
        assert!(report.entries.is_empty());
        assert!(base.join("a.pdf").exists());
    }

    // Other unix filesystems may refuse non-UTF-8 names outright.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_is_acted_on() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().join("inbox");
        let dest = temp_dir.path().join("dest");
        fs::create_dir(&base).expect("Failed to create directory");
        let junk = OsStr::from_bytes(b"a\xff.tmp");
        let scan = OsStr::from_bytes(b"scan\xfe.pdf");
        fs::write(base.join(junk), "x").expect("Failed to write test file");
        fs::write(base.join(scan), "x").expect("Failed to write test file");

        let janitor = janitor(
            vec![base.clone()],
            vec![
                rule(&[".tmp"], RuleAction::Delete, None),
                rule(&[".pdf"], RuleAction::Move, Some(dest.clone())),
            ],
        );

        let report = janitor.run(false);
        assert!(!report.has_failures());
        assert_eq!(report.deleted_count(), 1);
        assert_eq!(report.moved_count(), 1);
        assert!(!base.join(junk).exists());
        assert!(!base.join(scan).exists());
        assert!(dest.join(scan).exists());
    }

    #[test]
    fn test_failure_does_not_stop_scan() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().join("inbox");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(&base).expect("Failed to create directory");
        fs::create_dir_all(&dest).expect("Failed to create directory");
        fs::write(base.join("a.txt"), "new").expect("Failed to write test file");
        fs::write(base.join("b.txt"), "new").expect("Failed to write test file");
        fs::write(dest.join("a.txt"), "existing").expect("Failed to write test file");

        let janitor = janitor(
            vec![base.clone()],
            vec![rule(&[".txt"], RuleAction::Move, Some(dest.clone()))],
        );

        let report = janitor.run(false);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.moved_count(), 1);
        assert!(matches!(&report.entries[0], ScanEntry::Failed(f) if f.file_name == "a.txt"));
        assert!(dest.join("b.txt").exists());
        assert!(base.join("a.txt").exists());
    }

    #[test]
    fn test_subdirectories_are_not_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();
        fs::create_dir(base.join("nested.tmp")).expect("Failed to create directory");

        let janitor = janitor(vec![base.clone()], vec![rule(&[".tmp"], RuleAction::Delete, None)]);
        let report = janitor.run(false);
        assert_eq!(report.files_scanned, 0);
        assert!(base.join("nested.tmp").is_dir());
    }

    struct StopAfter {
        remaining: usize,
        started: Vec<PathBuf>,
        finished: usize,
    }

    impl ScanObserver for StopAfter {
        fn folder_started(&mut self, folder: &Path, _file_count: usize) {
            self.started.push(folder.to_path_buf());
        }

        fn file_processed(&mut self, _file: &FileEntry, _entry: Option<&ScanEntry>) -> ControlFlow<()> {
            self.remaining -= 1;
            if self.remaining == 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }

        fn folder_finished(&mut self, _folder: &Path) {
            self.finished += 1;
        }
    }

    #[test]
    fn test_observer_can_stop_between_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().to_path_buf();
        for name in ["a.tmp", "b.tmp", "c.tmp"] {
            fs::write(base.join(name), "x").expect("Failed to write test file");
        }

        let janitor = janitor(vec![base.clone()], vec![rule(&[".tmp"], RuleAction::Delete, None)]);
        let mut observer = StopAfter {
            remaining: 2,
            started: Vec::new(),
            finished: 0,
        };
        let report = janitor.run_with_observer(false, &mut observer);

        assert!(report.cancelled);
        assert_eq!(report.deleted_count(), 2);
        assert_eq!(observer.started, vec![base.clone()]);
        assert_eq!(observer.finished, 1);
        assert!(base.join("c.tmp").exists());
    }
}
