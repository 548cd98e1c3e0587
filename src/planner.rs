//! Turns a matched rule into a concrete action without touching the filesystem.

use crate::condition::FileEntry;
use crate::rule::{Rule, RuleAction};
use std::path::{Path, PathBuf};

/// An action decided for one file, not yet carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Move {
        file_name: String,
        source: PathBuf,
        dest_dir: PathBuf,
        dest_path: PathBuf,
    },
    Delete {
        file_name: String,
        source: PathBuf,
    },
}

impl PlannedAction {
    pub fn file_name(&self) -> &str {
        match self {
            PlannedAction::Move { file_name, .. } | PlannedAction::Delete { file_name, .. } => {
                file_name
            }
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            PlannedAction::Move { source, .. } | PlannedAction::Delete { source, .. } => source,
        }
    }
}

/// Plans the action `rule` prescribes for `file`.
///
/// Returns `None` for a move rule without a destination and for an unknown
/// action; neither is an error, the file is simply left alone by this rule.
pub fn plan(rule: &Rule, file: &FileEntry) -> Option<PlannedAction> {
    match &rule.action {
        RuleAction::Move => {
            let dest_dir = rule
                .destination
                .as_ref()
                .filter(|dest| !dest.as_os_str().is_empty())?;
            Some(PlannedAction::Move {
                file_name: file.name.clone(),
                source: file.path.clone(),
                dest_dir: dest_dir.clone(),
                dest_path: dest_dir.join(file.os_name()),
            })
        }
        RuleAction::Delete => Some(PlannedAction::Delete {
            file_name: file.name.clone(),
            source: file.path.clone(),
        }),
        RuleAction::Unknown(_) => None,
    }
}
