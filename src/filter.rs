//! File filters applied before any rule is consulted.
//!
//! Filters let a config keep certain files out of the janitor's reach
//! entirely, whatever the rules say. Configured in the optional `filters`
//! section of the config document:
//!
//! ```json
//! "filters": {
//!   "include_hidden": false,
//!   "exclude": {
//!     "filenames": ["desktop.ini"],
//!     "patterns": ["*.crdownload", "*.part"],
//!     "regex": ["^~\\$"]
//!   }
//! }
//! ```
//!
//! Patterns and regexes are matched against the file name only, since the
//! janitor never descends into subdirectories.

use crate::config::ConfigError;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

/// The `filters` section as written in the config.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRules {
    /// Whether files starting with "." are considered. Defaults to true.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Files never handed to the rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns, e.g. `*.part`.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regular expressions.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Filters with every pattern compiled up front.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for ScanFilter {
    /// A filter that lets every file through.
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl ScanFilter {
    /// Compiles the configured filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first glob or regex that fails to compile.
    pub fn compile(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Returns true if the file named `file_name` should be evaluated against the rules.
    pub fn should_include(&self, file_name: &str) -> bool {
        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }
        if self.exclude_filenames.contains(file_name) {
            return false;
        }
        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }
        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}
