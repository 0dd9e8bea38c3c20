//! @dose
//! purpose: Namespace Walker. Lazily walks an object graph from its root and yields one
//!     DescriptionRecord per documented object, in a deterministic pre-order.
//!
//! when-editing:
//!     - !Members are visited sorted by name at every level; output stability depends on it
//!     - !A record for a member is yielded before any record of its descendants
//!     - Builtin and Module categories are skipped entirely (no record, no descent)
//!
//! invariants:
//!     - Magic names (__x__) contribute their own record but are never descended into
//!     - An object already on the current branch is never descended into again
//!     - The stack only ever holds the chain of ancestors of the member being visited
//!
//! error-handling:
//!     - A failed description lookup is logged, treated as absent and the branch is skipped
//!     - A failed member lookup is logged and the branch contributes no children
//!
//! gotchas:
//!     - The root is not classified; only members go through the category filter
//!     - max_depth counts segments below the root, so max_depth = 0 yields the root only

use crate::namespace::Namespace;
use crate::types::{DescriptionRecord, QualifiedName};
use globset::GlobSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Names flanked by double underscores, e.g. `__eq__` or `__init__`
static MAGIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^__.+__$").unwrap());

/// Check whether a member name is a special/magic name
pub fn is_magic_name(name: &str) -> bool {
    MAGIC_NAME.is_match(name)
}

/// Knobs that bound or prune the traversal
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Deepest path depth (below the root) whose children are still explored
    pub max_depth: Option<usize>,
    /// Explore members of objects that have no description
    pub descend_undocumented: bool,
    /// Dotted paths matching this set are skipped entirely
    pub exclude: Option<GlobSet>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            descend_undocumented: true,
            exclude: None,
        }
    }
}

struct Frame<H> {
    path: QualifiedName,
    handle: H,
    members: std::vec::IntoIter<(String, H)>,
}

/// Lazy pre-order traversal yielding description records
pub struct Walker<'a, N: Namespace> {
    namespace: &'a N,
    options: WalkOptions,
    pending_root: Option<DescriptionRecord>,
    stack: Vec<Frame<N::Handle>>,
    emitted: usize,
}

/// Start walking `namespace` from its root, naming the root `root_name`
pub fn discover<'a, N: Namespace>(
    namespace: &'a N,
    root_name: &str,
    options: WalkOptions,
) -> Walker<'a, N> {
    let root = namespace.root();
    let path = QualifiedName::root(root_name);

    let pending_root = match namespace.description(root) {
        Ok(text) => text.map(|text| DescriptionRecord::new(path.clone(), text)),
        Err(e) => {
            warn!(path = %path, error = %e, "root description unavailable");
            None
        }
    };

    let mut walker = Walker {
        namespace,
        options,
        pending_root,
        stack: Vec::new(),
        emitted: 0,
    };

    if walker.within_depth(&path) {
        walker.push_frame(path, root);
    }
    walker
}

impl<'a, N: Namespace> Walker<'a, N> {
    /// Number of records yielded so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn push_frame(&mut self, path: QualifiedName, handle: N::Handle) {
        match self.namespace.members(handle) {
            Ok(mut members) => {
                // Stable, so duplicate names keep their source order
                members.sort_by(|a, b| a.0.cmp(&b.0));
                self.stack.push(Frame {
                    path,
                    handle,
                    members: members.into_iter(),
                });
            }
            Err(e) => {
                warn!(path = %path, error = %e, "member lookup failed, not descending");
            }
        }
    }

    fn within_depth(&self, path: &QualifiedName) -> bool {
        self.options
            .max_depth
            .map_or(true, |max| path.depth() < max)
    }

    fn is_excluded(&self, path: &QualifiedName) -> bool {
        self.options
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(path.dotted()))
    }

    fn on_branch(&self, handle: N::Handle) -> bool {
        self.stack.iter().any(|frame| frame.handle == handle)
    }

    fn should_descend(
        &self,
        path: &QualifiedName,
        name: &str,
        handle: N::Handle,
        documented: bool,
    ) -> bool {
        if is_magic_name(name) {
            return false;
        }
        if !documented && !self.options.descend_undocumented {
            return false;
        }
        if !self.within_depth(path) {
            debug!(path = %path, "max depth reached");
            return false;
        }
        if self.on_branch(handle) {
            debug!(path = %path, "cycle detected, not descending");
            return false;
        }
        true
    }

    fn visit(
        &mut self,
        path: QualifiedName,
        name: &str,
        handle: N::Handle,
    ) -> Option<DescriptionRecord> {
        let category = self.namespace.category(handle);
        if category.is_filtered() {
            debug!(path = %path, ?category, "filtered");
            return None;
        }
        if self.is_excluded(&path) {
            debug!(path = %path, "excluded by pattern");
            return None;
        }

        let text = match self.namespace.description(handle) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path, error = %e, "description lookup failed, skipping member");
                return None;
            }
        };

        if self.should_descend(&path, name, handle, text.is_some()) {
            self.push_frame(path.clone(), handle);
        }

        text.map(|text| DescriptionRecord::new(path, text))
    }
}

impl<'a, N: Namespace> Iterator for Walker<'a, N> {
    type Item = DescriptionRecord;

    fn next(&mut self) -> Option<DescriptionRecord> {
        if let Some(record) = self.pending_root.take() {
            self.emitted += 1;
            return Some(record);
        }

        loop {
            let frame = self.stack.last_mut()?;
            let Some((name, handle)) = frame.members.next() else {
                self.stack.pop();
                continue;
            };
            let path = frame.path.child(&name);

            if let Some(record) = self.visit(path, &name, handle) {
                self.emitted += 1;
                return Some(record);
            }
        }
    }
}
