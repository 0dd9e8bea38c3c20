//! @dose
//! purpose: Configuration file parsing for doclit.toml. Holds the literal naming scheme
//!     (prefix, raw string delimiter) and the traversal knobs (depth limit, exclusions).
//!
//! when-editing:
//!     - !Config is loaded once at startup; CLI flags are applied on top of it in main
//!     - Exclusion patterns are globs matched against dotted member paths (mod.Class.method)
//!
//! invariants:
//!     - Config::load returns default config if doclit.toml doesn't exist
//!     - An explicitly requested config file that can't be read or parsed is an error
//!
//! gotchas:
//!     - Invalid exclude patterns are skipped with a warning, not rejected

use crate::emitter::{DEFAULT_DELIMITER, DEFAULT_PREFIX};
use crate::walker::WalkOptions;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "doclit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Main configuration structure matching doclit.toml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Prefix of every generated identifier
    pub prefix: String,

    /// Raw string delimiter token
    pub delimiter: String,

    /// Deepest level (below the module) whose members are explored
    pub max_depth: Option<usize>,

    /// Explore members of objects that carry no documentation
    pub descend_undocumented: bool,

    /// Glob patterns of dotted member paths to skip
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_depth: None,
            descend_undocumented: true,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from doclit.toml in the given directory
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load a specific configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Traversal options described by this config
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            max_depth: self.max_depth,
            descend_undocumented: self.descend_undocumented,
            exclude: build_exclude_globset(&self.exclude),
        }
    }
}

/// Build a GlobSet from exclusion patterns
pub fn build_exclude_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                warn!("invalid exclude pattern '{}': {}", pattern, e);
            }
        }
    }

    builder.build().ok()
}
