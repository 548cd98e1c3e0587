//! janitor - rule-driven cleanup of watched folders
//!
//! This library scans a set of watched directories and, for each file, finds
//! the first rule in an ordered list whose conditions all hold (source
//! folder, extension, name keyword, age) and moves or deletes the file
//! accordingly. A simulate mode reports the same actions without touching
//! the filesystem.

pub mod cli;
pub mod condition;
pub mod config;
pub mod executor;
pub mod filter;
pub mod janitor;
pub mod output;
pub mod planner;
pub mod rule;

pub use condition::{Conditions, FileEntry, normalize_path};
pub use config::{CompiledConfig, ConfigError, JanitorConfig};
pub use executor::{ActionError, ActionExecutor, ActionRecord, ActionVerb};
pub use filter::ScanFilter;
pub use janitor::{Janitor, NoopObserver, ScanEntry, ScanObserver, ScanReport};
pub use planner::{PlannedAction, plan};
pub use rule::{Rule, RuleAction, resolve};

pub use cli::{RunOptions, run_cli};
