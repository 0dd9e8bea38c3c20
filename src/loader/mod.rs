//! @dose
//! purpose: This module is the central hub for module loaders. It defines the ModuleLoader
//!     trait that turns a module path into an ObjectGraph, and the LoaderFactory that picks
//!     a loader based on the path's extension.
//!
//! when-editing:
//!     - !When adding a new loader, you must register it in LoaderFactory::new()
//!     - Each loader is stored as Arc<dyn ModuleLoader> and shared across extensions
//!
//! invariants:
//!     - Every extension maps to exactly one loader
//!     - Loading never touches process-wide state (no search path mutation, no cwd change)
//!
//! gotchas:
//!     - A directory containing __init__.py is a Python package and uses the Python loader
//!     - Extensions are stored without the leading dot (e.g., "py" not ".py")
//!
//! flows:
//!     - Load: LoaderFactory::load() -> get_loader() -> ModuleLoader::load_module()

mod manifest;
mod pystring;
mod python;

use crate::namespace::ObjectGraph;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use manifest::{Manifest, ManifestLoader, ManifestNode};
pub use python::{PythonLoader, PACKAGE_INIT};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse source: {0}")]
    Parser(String),
    #[error("Syntax error in {path} at line {line}")]
    Syntax { path: PathBuf, line: usize },
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Unresolved reference {reference:?} at {at}")]
    UnresolvedRef { reference: String, at: String },
    #[error("Unsupported module path: {0}")]
    Unsupported(PathBuf),
    #[error("Cannot derive a module name from {0}")]
    ModuleName(PathBuf),
}

/// A module turned into an object graph, ready for traversal
#[derive(Debug)]
pub struct LoadedModule {
    /// Name the module would be imported under
    pub name: String,
    pub graph: ObjectGraph,
    /// File the graph was read from
    pub source: PathBuf,
}

/// Trait for module loaders
pub trait ModuleLoader: Send + Sync {
    /// Returns the loader name (e.g., "python", "manifest")
    fn loader_name(&self) -> &'static str;

    /// Returns file extensions this loader handles
    fn file_extensions(&self) -> &[&'static str];

    /// Load the module at `path` into an object graph
    fn load_module(&self, path: &Path) -> Result<LoadedModule, LoadError>;
}

/// Module name derived from a path: the file name without directory and extension
pub fn module_name(path: &Path) -> Result<String, LoadError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LoadError::ModuleName(path.to_path_buf()))
}

/// Factory for module loaders
pub struct LoaderFactory {
    loaders: HashMap<String, Arc<dyn ModuleLoader>>,
}

impl LoaderFactory {
    pub fn new() -> Self {
        let mut loaders: HashMap<String, Arc<dyn ModuleLoader>> = HashMap::new();

        // Python source modules
        let py_loader: Arc<dyn ModuleLoader> = Arc::new(PythonLoader::new());
        for ext in py_loader.file_extensions() {
            loaders.insert(ext.to_string(), Arc::clone(&py_loader));
        }

        // JSON namespace manifests
        let manifest_loader: Arc<dyn ModuleLoader> = Arc::new(ManifestLoader::new());
        for ext in manifest_loader.file_extensions() {
            loaders.insert(ext.to_string(), Arc::clone(&manifest_loader));
        }

        Self { loaders }
    }

    /// Get loader for a module path based on extension
    pub fn get_loader(&self, path: &Path) -> Option<&dyn ModuleLoader> {
        if path.is_dir() {
            return path
                .join(PACKAGE_INIT)
                .is_file()
                .then(|| self.loaders.get("py").map(|l| l.as_ref()))
                .flatten();
        }
        let ext = path.extension()?.to_str()?;
        self.loaders.get(ext).map(|l| l.as_ref())
    }

    /// Check if a module path is supported
    pub fn is_supported(&self, path: &Path) -> bool {
        self.get_loader(path).is_some()
    }

    /// Get all supported extensions
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.loaders.keys().map(|s| s.as_str()).collect()
    }

    /// Load the module at `path` with the matching loader
    pub fn load(&self, path: &Path) -> Result<LoadedModule, LoadError> {
        let loader = self
            .get_loader(path)
            .ok_or_else(|| LoadError::Unsupported(path.to_path_buf()))?;
        loader.load_module(path)
    }
}

impl Default for LoaderFactory {
    fn default() -> Self {
        Self::new()
    }
}
