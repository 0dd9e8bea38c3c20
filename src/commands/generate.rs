//! @dose
//! purpose: Top-level generation. Loads the module, writes the header, streams every record
//!     the walker yields through the emitter, and finishes with the trailer count.
//!
//! when-editing:
//!     - !Records are emitted as they are discovered; the full sequence is never buffered
//!     - !The count in the trailer is the number of declarations actually written
//!     - File output goes through a temp file that is persisted only on success
//!
//! invariants:
//!     - Any load, traversal or emission failure aborts the whole run
//!     - Output is byte-identical across runs when the timestamp is fixed or omitted
//!
//! gotchas:
//!     - SOURCE_DATE_EPOCH replaces the local clock for reproducible builds
//!     - Partial output may reach stdout before an error; only files are all-or-nothing

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::emitter::Emitter;
use crate::loader::{LoadedModule, LoaderFactory};
use crate::walker::discover;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::env;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Environment variable carrying a fixed build time (seconds since the epoch)
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

const TIMESTAMP_FORMAT: &str = "%c";

/// Name and version written into the generated header
pub fn generator_identity() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Header timestamp: SOURCE_DATE_EPOCH if set and valid, else local time
pub fn generation_timestamp(source_date_epoch: Option<&str>) -> String {
    if let Some(epoch) = source_date_epoch {
        match epoch
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        {
            Some(fixed) => return fixed.format(TIMESTAMP_FORMAT).to_string(),
            None => warn!("ignoring invalid {} value {:?}", SOURCE_DATE_EPOCH, epoch),
        }
    }
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn run_generate(args: &GenerateArgs, config: &Config) -> Result<usize> {
    let factory = LoaderFactory::new();
    let module = factory
        .load(&args.module)
        .with_context(|| format!("Failed to load module {}", args.module.display()))?;

    let timestamp = if args.no_timestamp {
        None
    } else {
        let epoch = env::var(SOURCE_DATE_EPOCH).ok();
        Some(generation_timestamp(epoch.as_deref()))
    };

    let count = match args.output {
        Some(ref path) => write_file(path, &module, config, timestamp.as_deref())?,
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            generate(&module, config, timestamp.as_deref(), &mut out)?
        }
    };

    info!(
        module = %module.name,
        source = %module.source.display(),
        count,
        "generated documentation strings"
    );
    Ok(count)
}

/// Write the generated source to `path`, replacing it only if generation succeeds
fn write_file(
    path: &Path,
    module: &LoadedModule,
    config: &Config,
    timestamp: Option<&str>,
) -> Result<usize> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let count = {
        let mut out = BufWriter::new(temp.as_file_mut());
        let count = generate(module, config, timestamp, &mut out)?;
        out.flush().context("Failed to flush output")?;
        count
    };

    temp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(count)
}

/// Generate the full source for `module` into `out`, returning the declaration count
pub fn generate<W: Write>(
    module: &LoadedModule,
    config: &Config,
    timestamp: Option<&str>,
    out: W,
) -> Result<usize> {
    let mut emitter = Emitter::new(out, &config.prefix, &config.delimiter)?;
    emitter.write_header(&module.name, &generator_identity(), timestamp)?;

    let mut count = 0;
    for record in discover(&module.graph, &module.name, config.walk_options()) {
        emitter
            .emit(&record)
            .with_context(|| format!("Failed to emit documentation for {}", record.name))?;
        count += 1;
    }

    emitter.write_trailer(count, &module.name)?;
    Ok(count)
}
