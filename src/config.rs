//! Janitor configuration: watched folders, ordered rules and filters.
//!
//! The config is a JSON document (or TOML, chosen by the `.toml` extension):
//!
//! ```json
//! {
//!   "folders_to_watch": ["~/Downloads", "~/Desktop"],
//!   "rules": [
//!     {
//!       "name": "old pdfs",
//!       "conditions": {"extensions": [".pdf"], "age_days": 7},
//!       "action": "move",
//!       "destination": "~/Archive"
//!     },
//!     {
//!       "conditions": {"source_folder": "~/Desktop", "filename_contains": ["tmp"]},
//!       "action": "delete"
//!     }
//!   ]
//! }
//! ```
//!
//! Rules keep their order: the first rule that matches a file wins.
//! An optional `filters` section is described in [`crate::filter`].

use crate::condition::{Conditions, normalize_path};
use crate::filter::{FilterRules, ScanFilter};
use crate::rule::{Rule, RuleAction};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name looked for in the current directory when no config is given.
pub const CONFIG_FILE_NAME: &str = "janitor_config.json";

/// Errors that can occur while loading or compiling the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {}: {source}", .path.display())]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// The config document as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JanitorConfig {
    #[serde(default)]
    pub folders_to_watch: Vec<String>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// One entry of the `rules` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub conditions: ConditionsConfig,

    /// `"move"` when absent.
    #[serde(default)]
    pub action: RuleAction,

    #[serde(default)]
    pub destination: Option<String>,
}

/// The `conditions` object of a rule. Absent keys do not constrain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionsConfig {
    #[serde(default)]
    pub source_folder: Option<String>,

    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    #[serde(default)]
    pub filename_contains: Option<Vec<String>>,

    #[serde(default)]
    pub age_days: Option<f64>,
}

/// A validated config with normalized paths, ready to drive a scan.
#[derive(Debug, Clone, Default)]
pub struct CompiledConfig {
    pub folders: Vec<PathBuf>,
    pub rules: Vec<Rule>,
    pub filter: ScanFilter,
}

impl JanitorConfig {
    /// Loads the configuration.
    ///
    /// Looks in the following order:
    /// 1. `config_path`, if given
    /// 2. `janitor_config.json` in the current directory
    /// 3. `~/.config/janitor/config.json`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config exists, or a parse error
    /// if the file found is not a valid config document.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("janitor")
                .join("config.json");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Err(ConfigError::NotFound(local_config))
    }

    /// Loads the configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(path = %path.display(), "loading configuration");
        Self::parse(&content, ConfigFormat::from_path(path), path)
    }

    /// Parses a config document; `origin` is only used in error messages.
    pub fn parse(content: &str, format: ConfigFormat, origin: &Path) -> ConfigResult<Self> {
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson {
                    path: origin.to_path_buf(),
                    source: e,
                })
            }
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::InvalidToml {
                path: origin.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Validates the config and brings it into the form the janitor runs on.
    ///
    /// Folder paths are `~`-expanded and normalized (duplicates after
    /// normalization are dropped). Rule extensions and keywords are
    /// lower-cased, so rule authors may write `.PDF` or `.pdf` alike.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite `age_days`, and for
    /// filter patterns that fail to compile.
    pub fn compile(self) -> ConfigResult<CompiledConfig> {
        let mut folders: Vec<PathBuf> = Vec::with_capacity(self.folders_to_watch.len());
        for folder in &self.folders_to_watch {
            let normalized = normalize_path(&expand_home(folder));
            if folders.contains(&normalized) {
                debug!(folder = %normalized.display(), "ignoring duplicate watched folder");
                continue;
            }
            folders.push(normalized);
        }

        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(i, rule)| rule.compile(i + 1))
            .collect::<ConfigResult<Vec<_>>>()?;

        let filter = ScanFilter::compile(self.filters)?;

        Ok(CompiledConfig {
            folders,
            rules,
            filter,
        })
    }
}

impl RuleConfig {
    /// Compiles this rule; `index` is its 1-based position in the rule list.
    pub fn compile(self, index: usize) -> ConfigResult<Rule> {
        let conditions = self.conditions;

        if let Some(age) = conditions.age_days
            && (!age.is_finite() || age < 0.0)
        {
            return Err(ConfigError::InvalidRule {
                index,
                reason: format!("age_days must be a non-negative number, got {}", age),
            });
        }

        let rule = Rule {
            name: self.name.unwrap_or_else(|| format!("rule #{}", index)),
            conditions: Conditions {
                source_folder: conditions
                    .source_folder
                    .map(|folder| normalize_path(&expand_home(&folder))),
                extensions: conditions.extensions.map(lowercase_all),
                filename_contains: conditions.filename_contains.map(lowercase_all),
                age_days: conditions.age_days,
            },
            action: self.action,
            destination: self
                .destination
                .filter(|dest| !dest.trim().is_empty())
                .map(|dest| expand_home(&dest)),
        };

        match &rule.action {
            RuleAction::Unknown(action) => {
                warn!(rule = %rule.name, action = %action, "unknown action, matching files will be left alone");
            }
            RuleAction::Move if rule.destination.is_none() => {
                warn!(rule = %rule.name, "move rule has no destination, matching files fall through to later rules");
            }
            _ => {}
        }

        Ok(rule)
    }
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
