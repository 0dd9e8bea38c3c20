//! @dose
//! purpose: The introspection capability the walker consumes. Any concrete object graph
//!     (parsed source, a JSON dump of a compiled extension, a synthetic test graph) is
//!     adapted to the Namespace trait before traversal.
//!
//! when-editing:
//!     - !Handles must be identities: two handles compare equal iff they name the same object
//!     - Lookups may fail; the walker decides what a failure means, not the implementor
//!
//! invariants:
//!     - category() never fails, unknown objects are Category::Opaque
//!
//! gotchas:
//!     - members() order is not significant, the walker sorts by name itself

mod graph;

pub use graph::{ObjectGraph, ObjectId};

use crate::types::Category;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntrospectError {
    #[error("description lookup failed: {0}")]
    Description(String),
    #[error("member lookup failed: {0}")]
    Members(String),
    #[error("unknown object handle {0}")]
    UnknownHandle(usize),
}

/// Read-only view of an object graph
pub trait Namespace {
    type Handle: Copy + Eq + Hash + Debug;

    /// Handle of the root module object
    fn root(&self) -> Self::Handle;

    /// Named members of an object, in any order
    fn members(&self, handle: Self::Handle)
        -> Result<Vec<(String, Self::Handle)>, IntrospectError>;

    /// Description text attached to an object, if any
    fn description(&self, handle: Self::Handle) -> Result<Option<String>, IntrospectError>;

    fn category(&self, handle: Self::Handle) -> Category;
}
