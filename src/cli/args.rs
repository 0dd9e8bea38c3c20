//! @dose
//! purpose: This module defines the command-line interface for doclit using the clap derive
//!     macros: the module path to document plus overrides for the doclit.toml settings.
//!
//! when-editing:
//!     - !Every override must also be applied in GenerateArgs::merge_config
//!     - Global flags (config, verbose) live on Cli, generation options on GenerateArgs
//!
//! invariants:
//!     - Exactly one positional argument: the module path
//!     - CLI values always win over config file values; --exclude patterns are added, not replaced
//!
//! gotchas:
//!     - The module path may be a .py file, a package directory, or a .json manifest

use crate::config::Config;
use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doclit")]
#[command(author, version, about = "Extract module docstrings into C++ raw string literals")]
pub struct Cli {
    /// Configuration file (defaults to ./doclit.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Args, Default, Clone)]
pub struct GenerateArgs {
    /// Python module, package directory, or JSON namespace manifest
    #[arg(value_name = "MODULE_PATH")]
    pub module: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Identifier prefix of the generated declarations
    #[arg(long)]
    pub prefix: Option<String>,

    /// Raw string delimiter token
    #[arg(long, value_name = "DELIM")]
    pub delimiter: Option<String>,

    /// Maximum traversal depth below the module
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Skip members whose dotted path matches glob pattern (can be repeated)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Omit the generation timestamp from the header
    #[arg(long)]
    pub no_timestamp: bool,
}

impl GenerateArgs {
    /// Apply command-line overrides on top of a loaded config
    pub fn merge_config(&self, config: &Config) -> Config {
        let mut merged = config.clone();
        if let Some(ref prefix) = self.prefix {
            merged.prefix = prefix.clone();
        }
        if let Some(ref delimiter) = self.delimiter {
            merged.delimiter = delimiter.clone();
        }
        if self.max_depth.is_some() {
            merged.max_depth = self.max_depth;
        }
        merged.exclude.extend(self.exclude.iter().cloned());
        merged
    }
}
