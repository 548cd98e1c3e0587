//! Carrying out planned actions against the filesystem.
//!
//! The executor is the only part of the janitor that mutates anything on
//! disk. In simulate mode it performs no filesystem access at all and only
//! reports what would have happened.

use crate::planner::PlannedAction;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder shown in place of a destination for deletions.
pub const NO_DESTINATION: &str = "N/A";

/// The kind of effect an action had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionVerb {
    Moved,
    Deleted,
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionVerb::Moved => write!(f, "Moved"),
            ActionVerb::Deleted => write!(f, "Deleted"),
        }
    }
}

/// One completed (or simulated) action, kept for the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub verb: ActionVerb,
    pub file_name: String,
    /// Destination directory of a move; `None` for deletions.
    pub destination: Option<PathBuf>,
}

impl ActionRecord {
    /// The destination as shown to users, or [`NO_DESTINATION`].
    pub fn destination_display(&self) -> String {
        match &self.destination {
            Some(dest) => dest.display().to_string(),
            None => NO_DESTINATION.to_string(),
        }
    }
}

impl From<&PlannedAction> for ActionRecord {
    fn from(action: &PlannedAction) -> Self {
        match action {
            PlannedAction::Move {
                file_name,
                dest_dir,
                ..
            } => ActionRecord {
                verb: ActionVerb::Moved,
                file_name: file_name.clone(),
                destination: Some(dest_dir.clone()),
            },
            PlannedAction::Delete { file_name, .. } => ActionRecord {
                verb: ActionVerb::Deleted,
                file_name: file_name.clone(),
                destination: None,
            },
        }
    }
}

/// Errors that can occur while executing an action on a single file.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete {}: {source}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for action execution.
pub type ActionResult<T> = Result<T, ActionError>;

/// Applies planned actions to the filesystem.
pub struct ActionExecutor;

impl ActionExecutor {
    /// Executes `action`, or only describes it when `simulate` is set.
    ///
    /// Moves create the destination directory (recursively) when missing and
    /// refuse to overwrite an existing file. A rename that crosses filesystems
    /// falls back to copy and delete.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use janitor::executor::ActionExecutor;
    /// use janitor::planner::PlannedAction;
    /// use std::path::PathBuf;
    ///
    /// let action = PlannedAction::Delete {
    ///     file_name: "build.tmp".to_string(),
    ///     source: PathBuf::from("/home/user/Desktop/build.tmp"),
    /// };
    /// let record = ActionExecutor::execute(&action, true).unwrap();
    /// println!("{} {}", record.verb, record.file_name);
    /// ```
    pub fn execute(action: &PlannedAction, simulate: bool) -> ActionResult<ActionRecord> {
        if simulate {
            debug!(file = action.file_name(), ?action, "simulated action");
            return Ok(ActionRecord::from(action));
        }

        match action {
            PlannedAction::Move {
                source,
                dest_dir,
                dest_path,
                ..
            } => {
                fs::create_dir_all(dest_dir).map_err(|e| ActionError::DirectoryCreationFailed {
                    path: dest_dir.clone(),
                    source: e,
                })?;

                // A dangling symlink counts as occupied; `exists` would follow it.
                if fs::symlink_metadata(dest_path).is_ok() {
                    return Err(ActionError::DestinationExists {
                        path: dest_path.clone(),
                    });
                }

                move_file(source, dest_path).map_err(|e| ActionError::MoveFailed {
                    from: source.clone(),
                    to: dest_path.clone(),
                    source: e,
                })?;
                info!(from = %source.display(), to = %dest_path.display(), "moved file");
            }
            PlannedAction::Delete { source, .. } => {
                fs::remove_file(source).map_err(|e| ActionError::DeleteFailed {
                    path: source.clone(),
                    source: e,
                })?;
                info!(path = %source.display(), "deleted file");
            }
        }

        Ok(ActionRecord::from(action))
    }
}

fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(error = %e, "rename crosses filesystems, copying instead");
            copy_then_remove(source, dest)
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to `dest` and removes `source`.
///
/// On failure nothing is left at `dest`, so the file exists exactly once.
fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }
    Ok(())
}
