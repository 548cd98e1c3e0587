//! Rules and first-match-wins resolution.
//!
//! Rules are kept in the order they were declared. For a given file the
//! resolver walks that order and stops at the first rule whose conditions
//! all hold; later rules are never evaluated for that file. The one
//! exception is a move rule without a destination, which is passed over.

use crate::condition::{Conditions, FileEntry};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a rule does with a file it matches.
///
/// Deserialized from the `action` string of a rule. The comparison is
/// exact: anything other than `"move"` or `"delete"` (including `"Delete"`)
/// becomes [`RuleAction::Unknown`], which never produces an action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum RuleAction {
    #[default]
    Move,
    Delete,
    Unknown(String),
}

impl From<String> for RuleAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "move" => RuleAction::Move,
            "delete" => RuleAction::Delete,
            _ => RuleAction::Unknown(value),
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Move => write!(f, "move"),
            RuleAction::Delete => write!(f, "delete"),
            RuleAction::Unknown(action) => write!(f, "{}", action),
        }
    }
}

/// A compiled rule, ready to be matched against files.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Label used in log output. Falls back to `rule #<n>`.
    pub name: String,
    pub conditions: Conditions,
    pub action: RuleAction,
    /// Target directory for move rules. `None` when absent or empty.
    pub destination: Option<PathBuf>,
}

impl Rule {
    /// True if every condition of this rule holds for `file`.
    pub fn matches(&self, file: &FileEntry, current_folder: &Path) -> bool {
        self.conditions.evaluate(file, current_folder)
    }

    /// True if this rule can never result in an action, whatever it matches.
    pub fn is_inert(&self) -> bool {
        match self.action {
            RuleAction::Move => self.destination.is_none(),
            RuleAction::Delete => false,
            RuleAction::Unknown(_) => true,
        }
    }

    /// True if a match on this rule hands the file on to the following rules.
    ///
    /// Only a move without destination does so. Every other matching rule,
    /// including one with an unknown action, ends resolution for the file.
    pub fn defers_to_next(&self) -> bool {
        self.action == RuleAction::Move
            && self
                .destination
                .as_ref()
                .is_none_or(|dest| dest.as_os_str().is_empty())
    }
}

/// Lazily yields the rules matching `file`, in declaration order.
///
/// Each rule is evaluated only when the iterator is advanced to it, so
/// taking the first item never evaluates the rules behind it.
pub fn matching_rules<'a>(
    rules: &'a [Rule],
    file: &'a FileEntry,
    current_folder: &'a Path,
) -> impl Iterator<Item = &'a Rule> + 'a {
    rules
        .iter()
        .filter(move |rule| rule.matches(file, current_folder))
}

/// Returns the first rule, by declaration order, that matches `file`.
pub fn resolve<'a>(rules: &'a [Rule], file: &FileEntry, current_folder: &Path) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.matches(file, current_folder))
}
