//! @dose
//! purpose: Loads a JSON manifest describing a module's object graph. Compiled extension
//!     modules can't be read statically, so an external introspection step dumps their
//!     namespace to JSON and this loader turns the dump into an ObjectGraph.
//!
//! when-editing:
//!     - !`ref` paths are dotted and relative to the module root; "" is the root itself
//!     - Ref paths are followed through bound members, so they may pass through aliases
//!     - A node with `ref` is an alias: its own kind, doc and members are ignored
//!
//! invariants:
//!     - Every `ref` resolves or loading fails; refs may point at other refs
//!     - `error` marks a node whose lookups failed when the dump was taken
//!
//! gotchas:
//!     - Member maps are BTreeMaps, so duplicate keys in the JSON keep the last value

use crate::loader::{module_name, LoadError, LoadedModule, ModuleLoader};
use crate::namespace::{ObjectGraph, ObjectId};
use crate::types::Category;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Top level of a manifest file
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Module name, defaults to the file stem
    pub name: Option<String>,
    pub doc: Option<String>,
    #[serde(default)]
    pub members: BTreeMap<String, ManifestNode>,
}

/// One member in a manifest
#[derive(Debug, Deserialize)]
pub struct ManifestNode {
    #[serde(default)]
    pub kind: Category,
    pub doc: Option<String>,
    #[serde(default)]
    pub members: BTreeMap<String, ManifestNode>,
    /// Dotted path of the object this member aliases
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Introspection failure recorded by the dumper
    pub error: Option<String>,
}

struct PendingRef {
    owner: ObjectId,
    name: String,
    path: String,
    target: String,
}

/// Loader for JSON namespace manifests
#[derive(Clone)]
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn new() -> Self {
        Self
    }

    /// Build the object graph described by `manifest`
    pub fn build_graph(&self, manifest: &Manifest) -> Result<ObjectGraph, LoadError> {
        let mut graph = ObjectGraph::new(manifest.doc.clone());
        let root = graph.root_id();

        let mut pending = Vec::new();
        add_members(&mut graph, root, "", &manifest.members, &mut pending);

        // A ref may go through other refs, retry while each pass binds something
        while !pending.is_empty() {
            let before = pending.len();
            let mut unresolved = Vec::new();
            for reference in pending {
                match resolve_path(&graph, &reference.target) {
                    Some(target) => graph.bind(reference.owner, &reference.name, target),
                    None => unresolved.push(reference),
                }
            }
            if unresolved.len() == before {
                let first = &unresolved[0];
                return Err(LoadError::UnresolvedRef {
                    reference: first.target.clone(),
                    at: first.path.clone(),
                });
            }
            pending = unresolved;
        }

        Ok(graph)
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow a dotted path from the root through bound members; "" is the root
fn resolve_path(graph: &ObjectGraph, path: &str) -> Option<ObjectId> {
    let mut id = graph.root_id();
    if path.is_empty() {
        return Some(id);
    }
    for segment in path.split('.') {
        id = graph.member(id, segment)?;
    }
    Some(id)
}

fn add_members(
    graph: &mut ObjectGraph,
    owner: ObjectId,
    prefix: &str,
    members: &BTreeMap<String, ManifestNode>,
    pending: &mut Vec<PendingRef>,
) {
    for (name, node) in members {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        if let Some(ref target) = node.reference {
            pending.push(PendingRef {
                owner,
                name: name.clone(),
                path,
                target: target.clone(),
            });
            continue;
        }

        let id = graph.insert(owner, name, node.kind, node.doc.as_deref());
        if let Some(ref error) = node.error {
            graph.mark_failed(id, error.clone());
        }
        add_members(graph, id, &path, &node.members, pending);
    }
}

impl ModuleLoader for ManifestLoader {
    fn loader_name(&self) -> &'static str {
        "manifest"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn load_module(&self, path: &Path) -> Result<LoadedModule, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| LoadError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;

        let graph = self.build_graph(&manifest)?;
        let name = match manifest.name {
            Some(name) => name,
            None => module_name(path)?,
        };
        debug!(module = %name, objects = graph.object_count(), "loaded manifest");

        Ok(LoadedModule {
            name,
            graph,
            source: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{IntrospectError, Namespace};
    use tempfile::TempDir;

    const MANIFEST_FIXTURE: &str = include_str!("../../test_fixtures/cXmlWrite.json");

    fn build(json: &str) -> Result<ObjectGraph, LoadError> {
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        ManifestLoader::new().build_graph(&manifest)
    }

    #[test]
    fn test_loader_name_and_extensions() {
        let loader = ManifestLoader::new();
        assert_eq!(loader.loader_name(), "manifest");
        assert_eq!(loader.file_extensions(), &["json"]);
    }

    #[test]
    fn test_nested_members() {
        let graph = build(
            r#"{
                "doc": "Root",
                "members": {
                    "XmlStream": {
                        "kind": "class",
                        "doc": "Stream",
                        "members": { "close": { "kind": "function", "doc": "Close" } }
                    },
                    "VERSION": { "kind": "builtin", "doc": "str doc" },
                    "thing": {}
                }
            }"#,
        )
        .unwrap();

        let root = graph.root_id();
        assert_eq!(graph.doc(root), Some("Root"));
        let stream = graph.member(root, "XmlStream").unwrap();
        assert_eq!(graph.category(stream), Category::Class);
        let close = graph.member(stream, "close").unwrap();
        assert_eq!(graph.doc(close), Some("Close"));
        assert_eq!(
            graph.category(graph.member(root, "VERSION").unwrap()),
            Category::Builtin
        );
        let thing = graph.member(root, "thing").unwrap();
        assert_eq!(graph.category(thing), Category::Opaque);
        assert_eq!(graph.doc(thing), None);
    }

    #[test]
    fn test_refs_share_identity() {
        let graph = build(
            r#"{
                "members": {
                    "Alias": { "ref": "Chain" },
                    "Chain": { "ref": "XmlStream" },
                    "XmlStream": {
                        "kind": "class",
                        "members": { "self_type": { "ref": "XmlStream" }, "module": { "ref": "" } }
                    }
                }
            }"#,
        )
        .unwrap();

        let root = graph.root_id();
        let stream = graph.member(root, "XmlStream").unwrap();
        assert_eq!(graph.member(root, "Alias"), Some(stream));
        assert_eq!(graph.member(root, "Chain"), Some(stream));
        assert_eq!(graph.member(stream, "self_type"), Some(stream));
        assert_eq!(graph.member(stream, "module"), Some(root));
    }

    #[test]
    fn test_ref_through_alias() {
        let graph = build(
            r#"{
                "members": {
                    "Stream": { "ref": "XmlStream" },
                    "XhtmlStream": {
                        "kind": "class",
                        "members": { "start": { "ref": "Stream.start" } }
                    },
                    "XmlStream": {
                        "kind": "class",
                        "members": { "start": { "kind": "function", "doc": "Open an element." } }
                    }
                }
            }"#,
        )
        .unwrap();

        let root = graph.root_id();
        let stream = graph.member(root, "XmlStream").unwrap();
        let start = graph.member(stream, "start").unwrap();
        let xhtml = graph.member(root, "XhtmlStream").unwrap();
        assert_eq!(graph.member(xhtml, "start"), Some(start));
        assert_eq!(graph.member(root, "Stream"), Some(stream));
    }

    #[test]
    fn test_unresolved_ref() {
        let err = build(r#"{ "members": { "a": { "ref": "missing.path" } } }"#).unwrap_err();
        match err {
            LoadError::UnresolvedRef { reference, at } => {
                assert_eq!(reference, "missing.path");
                assert_eq!(at, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ref_cycle_between_refs_is_unresolved() {
        let err = build(r#"{ "members": { "a": { "ref": "b" }, "b": { "ref": "a" } } }"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedRef { .. }));
    }

    #[test]
    fn test_error_marks_failed_lookups() {
        let graph = build(
            r#"{ "members": { "broken": { "kind": "function", "error": "AttributeError: __doc__" } } }"#,
        )
        .unwrap();
        let broken = graph.member(graph.root_id(), "broken").unwrap();
        assert_eq!(
            graph.description(broken),
            Err(IntrospectError::Description(
                "AttributeError: __doc__".to_string()
            ))
        );
    }

    #[test]
    fn test_fixture_loads() {
        let manifest: Manifest = serde_json::from_str(MANIFEST_FIXTURE).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("cXmlWrite"));
        let graph = ManifestLoader::new().build_graph(&manifest).unwrap();
        let stream = graph.member(graph.root_id(), "XmlStream").unwrap();
        assert!(graph.doc(stream).is_some());
    }

    #[test]
    fn test_load_module_name_defaults_to_stem() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pbXmlWrite.json");
        fs::write(&path, r#"{ "doc": "pybind11 wrapper" }"#).unwrap();

        let loaded = ManifestLoader::new().load_module(&path).unwrap();
        assert_eq!(loaded.name, "pbXmlWrite");
        assert_eq!(loaded.graph.doc(loaded.graph.root_id()), Some("pybind11 wrapper"));
    }

    #[test]
    fn test_load_module_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ManifestLoader::new().load_module(&path).unwrap_err();
        assert!(matches!(err, LoadError::Manifest { .. }));
    }
}
