//! Condition evaluation for janitor rules.
//!
//! A rule carries up to four condition kinds. Each kind that is present must
//! hold for the rule to match; a kind that is absent does not constrain the
//! file at all. Multi-valued kinds (extensions, keywords) match when any one
//! of their values matches.
//!
//! Evaluation is pure apart from the lazily cached modification time of the
//! file, which is only read when an age condition is actually checked.

use chrono::{DateTime, Utc};
use std::cell::OnceCell;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// A regular file found in a watched folder.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name, lossily converted to UTF-8.
    pub name: String,
    /// The watched folder the file was found in.
    pub folder: PathBuf,
    /// Reference instant ages are measured against (the start of the scan).
    pub observed_at: DateTime<Utc>,
    modified: OnceCell<Option<DateTime<Utc>>>,
}

impl FileEntry {
    /// Creates an entry whose modification time is read from disk on first use.
    pub fn new(folder: &Path, name: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            path: folder.join(&name),
            name,
            folder: folder.to_path_buf(),
            observed_at,
            modified: OnceCell::new(),
        }
    }

    /// Creates an entry for a file found on disk, keeping its exact path.
    ///
    /// `name` is a lossy UTF-8 view of the last component, used for matching
    /// and display only. Actions always target `path` as listed.
    pub fn from_path(folder: &Path, path: PathBuf, observed_at: DateTime<Utc>) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            folder: folder.to_path_buf(),
            observed_at,
            modified: OnceCell::new(),
        }
    }

    /// The file name exactly as it appears on disk.
    pub fn os_name(&self) -> &OsStr {
        self.path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }

    /// Creates an entry with a known modification time; the disk is never consulted.
    pub fn with_modified(
        folder: &Path,
        name: impl Into<String>,
        observed_at: DateTime<Utc>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        let entry = Self::new(folder, name, observed_at);
        let _ = entry.modified.set(modified);
        entry
    }

    /// Last modification time, or `None` if it could not be read.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        *self.modified.get_or_init(|| {
            match fs::metadata(&self.path).and_then(|meta| meta.modified()) {
                Ok(time) => Some(DateTime::<Utc>::from(time)),
                Err(e) => {
                    debug!(path = %self.path.display(), error = %e, "could not read modification time");
                    None
                }
            }
        })
    }

    /// Age of the file in fractional days.
    ///
    /// An unreadable modification time, or one in the future, counts as age 0.
    pub fn age_days(&self) -> f64 {
        match self.modified() {
            Some(modified) => {
                let age = self.observed_at.signed_duration_since(modified);
                (age.num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0)
            }
            None => 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn modified_resolved(&self) -> bool {
        self.modified.get().is_some()
    }
}

/// The condition set of one rule, already compiled.
///
/// `extensions` and `filename_contains` are stored lower-cased and
/// `source_folder` is stored normalized, see [`normalize_path`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub source_folder: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub filename_contains: Option<Vec<String>>,
    pub age_days: Option<f64>,
}

impl Conditions {
    /// Returns true if every present condition holds for `file` found in `current_folder`.
    ///
    /// The age check runs last so that the modification time is only read
    /// for files that passed every cheaper condition.
    pub fn evaluate(&self, file: &FileEntry, current_folder: &Path) -> bool {
        if let Some(source) = &self.source_folder
            && source.as_path() != current_folder
        {
            return false;
        }

        let name = file.name.to_lowercase();

        if let Some(extensions) = &self.extensions
            && !extensions.iter().any(|ext| name.ends_with(ext.as_str()))
        {
            return false;
        }

        if let Some(keywords) = &self.filename_contains
            && !keywords.iter().any(|keyword| name.contains(keyword.as_str()))
        {
            return false;
        }

        if let Some(threshold) = self.age_days
            && file.age_days() < threshold
        {
            return false;
        }

        true
    }

    /// True when no condition kind is present, so every file matches.
    pub fn is_unconstrained(&self) -> bool {
        self.source_folder.is_none()
            && self.extensions.is_none()
            && self.filename_contains.is_none()
            && self.age_days.is_none()
    }
}

/// Brings a path into the single form used for folder comparisons.
///
/// Existing paths are canonicalized. Paths that do not exist are made
/// absolute and cleaned lexically. Trailing separators and `.` components
/// never survive either way.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    lexical_normalize(&absolute)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
