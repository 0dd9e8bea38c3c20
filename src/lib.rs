//! @dose
//! purpose: This is the library crate root for doclit, exposing the loaders, the namespace
//!     walker and the C++ emitter so they can be driven from the CLI or embedded elsewhere.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - Walking is generic over the Namespace trait; loaders are one way to build a namespace
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main
//!
//! flows:
//!     - Generate: LoaderFactory::load() -> discover() -> Emitter::emit() per record

pub mod cli;
pub mod commands;
pub mod config;
pub mod emitter;
pub mod loader;
pub mod namespace;
pub mod types;
pub mod walker;

// Re-export main types for convenience
pub use cli::{Cli, GenerateArgs};
pub use commands::run_generate;
pub use config::{Config, ConfigError};
pub use emitter::{EmitError, Emitter};
pub use loader::{LoadError, LoadedModule, LoaderFactory, ModuleLoader};
pub use namespace::{IntrospectError, Namespace, ObjectGraph, ObjectId};
pub use types::{Category, DescriptionRecord, QualifiedName};
pub use walker::{discover, WalkOptions, Walker};
