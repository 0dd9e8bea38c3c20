//! @dose
//! purpose: Core data types shared by the walker, the emitter and the loaders: qualified
//!     name paths, description records, and the category tags used to filter traversal.
//!
//! when-editing:
//!     - !QualifiedName is never empty; the first segment is always the root module name
//!     - Category drives filtering in the walker, keep is_filtered() in sync with it
//!
//! invariants:
//!     - DescriptionRecord is immutable once produced and consumed exactly once
//!     - identifier() joins with '_' and dotted() joins with '.', nothing else differs
//!
//! gotchas:
//!     - Joining with '_' is not injective ("a_b"+"c" vs "a"+"b_c"), the emitter checks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered path of names from the root module down to a member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Path consisting of the root module name only
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// New path with `name` appended
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments below the root (the root itself is depth 0)
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    /// Segments joined with underscores, as used in generated identifiers
    pub fn identifier(&self) -> String {
        self.segments.join("_")
    }

    /// Segments joined with dots, as used in diagnostics and exclusion patterns
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// A (qualified name, description text) pair ready for emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionRecord {
    pub name: QualifiedName,
    pub text: String,
}

impl DescriptionRecord {
    pub fn new(name: QualifiedName, text: impl Into<String>) -> Self {
        Self {
            name,
            text: text.into(),
        }
    }
}

/// What kind of object a namespace handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// An importable namespace (another module reachable as an attribute)
    Module,
    Class,
    Function,
    Property,
    /// Literal primitive values: strings, numbers, containers, None
    Builtin,
    /// Anything the loader knows nothing about
    #[default]
    Opaque,
}

impl Category {
    /// Categories the walker never descends into nor collects descriptions from
    pub fn is_filtered(self) -> bool {
        matches!(self, Category::Builtin | Category::Module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_joins() {
        let name = QualifiedName::root("cXmlWrite")
            .child("XmlStream")
            .child("__enter__");
        assert_eq!(name.identifier(), "cXmlWrite_XmlStream___enter__");
        assert_eq!(name.dotted(), "cXmlWrite.XmlStream.__enter__");
        assert_eq!(name.to_string(), "cXmlWrite.XmlStream.__enter__");
        assert_eq!(name.depth(), 2);
    }

    #[test]
    fn test_root_depth_is_zero() {
        let name = QualifiedName::root("mod");
        assert_eq!(name.depth(), 0);
        assert_eq!(name.segments(), &["mod".to_string()]);
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = QualifiedName::root("mod");
        let _child = parent.child("foo");
        assert_eq!(parent.identifier(), "mod");
    }

    #[test]
    fn test_filtered_categories() {
        assert!(Category::Builtin.is_filtered());
        assert!(Category::Module.is_filtered());
        assert!(!Category::Class.is_filtered());
        assert!(!Category::Function.is_filtered());
        assert!(!Category::Property.is_filtered());
        assert!(!Category::Opaque.is_filtered());
    }

    #[test]
    fn test_category_deserializes_lowercase() {
        let category: Category = serde_json::from_str("\"property\"").unwrap();
        assert_eq!(category, Category::Property);
    }
}
