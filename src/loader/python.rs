//! @dose
//! purpose: Loads a Python module by reading its source with tree-sitter and rebuilding the
//!     namespace Python would create when importing it: module docstring, classes,
//!     functions, properties, literal attributes and imported names.
//!
//! when-editing:
//!     - !Later bindings of a name replace earlier ones, like re-assignment in Python
//!     - !A class name is bound after its body is processed, so the body can't see itself
//!     - Inherited members are merged after the whole module is processed
//!
//! invariants:
//!     - Only module and class bodies contribute members; function bodies never do
//!     - if/try/with/for/while blocks bind into the enclosing body, all branches included
//!     - Docstrings are the first non-comment statement of a body, decoded like __doc__
//!     - Aliases share the ObjectId of their target, never a copy
//!
//! gotchas:
//!     - `import a.b` binds `a`, not `a.b`
//!     - `from x import y` can't be classified statically, y becomes Opaque
//!     - `@x.setter` keeps the property bound to x (and its docstring)
//!
//! flows:
//!     - Parse: tree-sitter-python, reject sources with syntax errors
//!     - Populate: walk module body, then class bodies recursively
//!     - Inherit: copy base class members into derived classes, own names win

use crate::loader::pystring::decode_literal;
use crate::loader::{module_name, LoadError, LoadedModule, ModuleLoader};
use crate::namespace::{ObjectGraph, ObjectId};
use crate::types::Category;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser};

/// Package initializer loaded when the module path is a directory
pub const PACKAGE_INIT: &str = "__init__.py";

/// Loader for Python source modules and packages
#[derive(Clone)]
pub struct PythonLoader;

impl PythonLoader {
    pub fn new() -> Self {
        Self
    }

    fn create_parser(&self) -> Result<Parser, LoadError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| LoadError::Parser(e.to_string()))?;
        Ok(parser)
    }

    /// Build the object graph for Python `source`
    pub fn load_source(&self, source: &str, path: &Path) -> Result<ObjectGraph, LoadError> {
        // Python normalizes newlines before tokenizing
        let source = source.replace("\r\n", "\n");

        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| LoadError::Parser("Failed to parse source".to_string()))?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error(root)
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            return Err(LoadError::Syntax {
                path: path.to_path_buf(),
                line,
            });
        }

        let mut builder = GraphBuilder::new(&source, docstring(root, &source));
        let module = builder.graph.root_id();
        builder.populate(module, root);
        builder.inherit();
        Ok(builder.graph)
    }
}

impl Default for PythonLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for PythonLoader {
    fn loader_name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn load_module(&self, path: &Path) -> Result<LoadedModule, LoadError> {
        let (file, name) = if path.is_dir() {
            (path.join(PACKAGE_INIT), module_name(path)?)
        } else {
            (path.to_path_buf(), module_name(path)?)
        };

        let source = fs::read_to_string(&file).map_err(|source| LoadError::Io {
            path: file.clone(),
            source,
        })?;
        let graph = self.load_source(&source, &file)?;
        debug!(module = %name, objects = graph.object_count(), "loaded python module");

        Ok(LoadedModule {
            name,
            graph,
            source: file,
        })
    }
}

/// Classes awaiting the inheritance pass, with their resolved base classes
struct ClassInfo {
    id: ObjectId,
    bases: Vec<ObjectId>,
}

struct GraphBuilder<'s> {
    source: &'s str,
    graph: ObjectGraph,
    classes: Vec<ClassInfo>,
}

impl<'s> GraphBuilder<'s> {
    fn new(source: &'s str, doc: Option<String>) -> Self {
        Self {
            source,
            graph: ObjectGraph::new(doc),
            classes: Vec::new(),
        }
    }

    fn text(&self, node: Node) -> &'s str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    /// Process the statements of a module or class body
    fn populate(&mut self, scope: ObjectId, body: Node) {
        for statement in named_children(body) {
            match statement.kind() {
                "function_definition" => self.define_function(scope, statement, &[]),
                "class_definition" => self.define_class(scope, statement),
                "decorated_definition" => {
                    let decorators: Vec<Node> = named_children(statement)
                        .into_iter()
                        .filter(|n| n.kind() == "decorator")
                        .collect();
                    let Some(definition) = statement.child_by_field_name("definition") else {
                        continue;
                    };
                    match definition.kind() {
                        "function_definition" => {
                            self.define_function(scope, definition, &decorators)
                        }
                        "class_definition" => self.define_class(scope, definition),
                        _ => {}
                    }
                }
                "expression_statement" => {
                    for expression in named_children(statement) {
                        if expression.kind() == "assignment" {
                            self.assign(scope, expression);
                        }
                    }
                }
                "import_statement" => self.import(scope, statement),
                "import_from_statement" => self.import_from(scope, statement),
                "if_statement" | "try_statement" | "with_statement" | "for_statement"
                | "while_statement" => self.populate_branches(scope, statement),
                _ => {}
            }
        }
    }

    /// Blocks of a compound statement bind into the enclosing scope, every branch
    /// is read in source order
    fn populate_branches(&mut self, scope: ObjectId, statement: Node) {
        for child in named_children(statement) {
            match child.kind() {
                "block" => self.populate(scope, child),
                "elif_clause" | "else_clause" | "except_clause" | "except_group_clause"
                | "finally_clause" => self.populate_branches(scope, child),
                _ => {}
            }
        }
    }

    fn define_function(&mut self, scope: ObjectId, node: Node, decorators: &[Node]) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };

        // @name.setter / .getter / .deleter re-binds the existing property
        if decorators.iter().any(|d| self.is_accessor_of(scope, d, name)) {
            return;
        }

        let category = if decorators.iter().any(|d| self.is_property_decorator(d)) {
            Category::Property
        } else {
            Category::Function
        };
        let doc = docstring_of(node, self.source);
        let id = self.graph.add_object(category, doc);
        self.graph.bind(scope, name, id);
    }

    fn define_class(&mut self, scope: ObjectId, node: Node) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };

        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                named_children(args)
                    .into_iter()
                    .filter(|arg| arg.kind() == "identifier")
                    .filter_map(|arg| self.resolve(scope, self.text(arg)))
                    .filter(|id| self.graph.category_of(*id) == Category::Class)
                    .collect()
            })
            .unwrap_or_default();

        let doc = docstring_of(node, self.source);
        let id = self.graph.add_object(Category::Class, doc);
        if let Some(body) = node.child_by_field_name("body") {
            self.populate(id, body);
        }
        self.graph.bind(scope, name, id);
        self.classes.push(ClassInfo { id, bases });
    }

    fn assign(&mut self, scope: ObjectId, node: Node) {
        // a = b = value nests assignments on the right
        let mut targets = Vec::new();
        let mut current = node;
        let value = loop {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(left);
            }
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                Some(right) => break right,
                // Bare annotation, no binding happens
                None => return,
            }
        };

        let target_id = self.evaluate(scope, value);
        for target in targets {
            match target.kind() {
                "identifier" => {
                    let name = self.text(target);
                    self.graph.bind(scope, name, target_id);
                }
                "attribute" => self.assign_attribute(scope, target, target_id),
                "pattern_list" | "tuple_pattern" | "list_pattern" => {
                    for element in named_children(target) {
                        if element.kind() == "identifier" {
                            let name = self.text(element);
                            let id = self.graph.add_object(Category::Opaque, None);
                            self.graph.bind(scope, name, id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// `Owner.attr = value` attaches a member to an already bound object
    fn assign_attribute(&mut self, scope: ObjectId, target: Node, value: ObjectId) {
        let (Some(object), Some(attribute)) = (
            target.child_by_field_name("object"),
            target.child_by_field_name("attribute"),
        ) else {
            return;
        };
        if object.kind() != "identifier" {
            return;
        }
        let Some(owner) = self.resolve(scope, self.text(object)) else {
            return;
        };
        if matches!(
            self.graph.category_of(owner),
            Category::Class | Category::Function
        ) {
            let name = self.text(attribute);
            self.graph.bind(owner, name, value);
        }
    }

    /// Object an expression evaluates to, as far as static reading can tell
    fn evaluate(&mut self, scope: ObjectId, value: Node) -> ObjectId {
        match value.kind() {
            "identifier" => {
                if let Some(existing) = self.resolve(scope, self.text(value)) {
                    return existing;
                }
                self.graph.add_object(Category::Opaque, None)
            }
            "parenthesized_expression" => match value.named_child(0) {
                Some(inner) => self.evaluate(scope, inner),
                None => self.graph.add_object(Category::Builtin, None),
            },
            "lambda" => self.graph.add_object(Category::Function, None),
            "call" => self.evaluate_call(scope, value),
            kind if is_builtin_literal(kind) => self.graph.add_object(Category::Builtin, None),
            "unary_operator" => {
                let numeric = value
                    .child_by_field_name("argument")
                    .is_some_and(|arg| matches!(arg.kind(), "integer" | "float"));
                let category = if numeric {
                    Category::Builtin
                } else {
                    Category::Opaque
                };
                self.graph.add_object(category, None)
            }
            _ => self.graph.add_object(Category::Opaque, None),
        }
    }

    /// `property(...)`, `staticmethod(f)` and `classmethod(f)` are understood;
    /// any other call produces an opaque object
    fn evaluate_call(&mut self, scope: ObjectId, call: Node) -> ObjectId {
        let function = call.child_by_field_name("function").map(|f| self.text(f));
        let args = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();
        let first_positional = args
            .iter()
            .find(|a| a.kind() == "identifier")
            .and_then(|a| self.resolve(scope, self.text(*a)));

        match function {
            Some("staticmethod" | "classmethod") => match first_positional {
                Some(wrapped) => wrapped,
                None => self.graph.add_object(Category::Opaque, None),
            },
            Some("property") => {
                let explicit_doc = args
                    .iter()
                    .filter(|a| a.kind() == "keyword_argument")
                    .find(|a| {
                        a.child_by_field_name("name")
                            .is_some_and(|n| self.text(n) == "doc")
                    })
                    .and_then(|a| a.child_by_field_name("value"))
                    .and_then(|v| string_value(v, self.source));
                let doc = explicit_doc.or_else(|| {
                    first_positional.and_then(|getter| self.graph.doc(getter).map(str::to_string))
                });
                self.graph.add_object(Category::Property, doc)
            }
            _ => self.graph.add_object(Category::Opaque, None),
        }
    }

    fn import(&mut self, scope: ObjectId, node: Node) {
        for imported in named_children(node) {
            let bound = match imported.kind() {
                // import a.b.c binds a
                "dotted_name" => imported
                    .named_child(0)
                    .map(|first| self.text(first)),
                "aliased_import" => imported
                    .child_by_field_name("alias")
                    .map(|alias| self.text(alias)),
                _ => None,
            };
            if let Some(name) = bound {
                let id = self.graph.add_object(Category::Module, None);
                self.graph.bind(scope, name, id);
            }
        }
    }

    fn import_from(&mut self, scope: ObjectId, node: Node) {
        let module = node.child_by_field_name("module_name").map(|n| n.id());
        for imported in named_children(node) {
            if Some(imported.id()) == module {
                continue;
            }
            let bound = match imported.kind() {
                "dotted_name" => Some(self.text(imported)),
                "aliased_import" => imported
                    .child_by_field_name("alias")
                    .map(|alias| self.text(alias)),
                _ => None,
            };
            if let Some(name) = bound {
                let id = self.graph.add_object(Category::Opaque, None);
                self.graph.bind(scope, name, id);
            }
        }
    }

    /// Name lookup: the current scope first, then module globals
    fn resolve(&self, scope: ObjectId, name: &str) -> Option<ObjectId> {
        self.graph
            .member(scope, name)
            .or_else(|| self.graph.member(self.graph.root_id(), name))
    }

    fn decorator_expression(&self, decorator: &Node<'_>) -> Option<String> {
        decorator.named_child(0).map(|e| self.text(e).to_string())
    }

    fn is_property_decorator(&self, decorator: &Node<'_>) -> bool {
        let Some(expression) = self.decorator_expression(decorator) else {
            return false;
        };
        let last = expression.rsplit('.').next().unwrap_or_default();
        matches!(last, "property" | "cached_property" | "abstractproperty")
    }

    fn is_accessor_of(&self, scope: ObjectId, decorator: &Node<'_>, name: &str) -> bool {
        let Some(expression) = self.decorator_expression(decorator) else {
            return false;
        };
        let Some((object, accessor)) = expression.split_once('.') else {
            return false;
        };
        object == name
            && matches!(accessor, "setter" | "getter" | "deleter")
            && self
                .graph
                .member(scope, name)
                .is_some_and(|id| self.graph.category_of(id) == Category::Property)
    }

    /// Merge members of base classes into derived classes. Classes are handled in
    /// definition order, so every base already carries its own inherited members.
    fn inherit(&mut self) {
        let classes = std::mem::take(&mut self.classes);
        for class in &classes {
            for base in &class.bases {
                let inherited = self.graph.members_of(*base).to_vec();
                for (name, member) in inherited {
                    self.graph.bind_if_absent(class.id, &name, member);
                }
            }
        }
        self.classes = classes;
    }
}

fn is_builtin_literal(kind: &str) -> bool {
    matches!(
        kind,
        "string"
            | "concatenated_string"
            | "integer"
            | "float"
            | "true"
            | "false"
            | "none"
            | "list"
            | "tuple"
            | "dictionary"
            | "set"
            | "list_comprehension"
            | "dictionary_comprehension"
            | "set_comprehension"
    )
}

fn named_children(node: Node) -> Vec<Node> {
    let mut children = Vec::new();
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            children.push(child);
        }
    }
    children
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() || child.is_missing() {
                if let Some(found) = first_error(child) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Value of a string or implicitly concatenated string expression
fn string_value(node: Node, source: &str) -> Option<String> {
    let text = |n: Node| &source[n.start_byte()..n.end_byte()];
    match node.kind() {
        "string" => decode_literal(text(node)),
        "concatenated_string" => named_children(node)
            .into_iter()
            .filter(|part| part.kind() == "string")
            .map(|part| decode_literal(text(part)))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
        _ => None,
    }
}

/// Docstring of a module, class or function body
fn docstring(body: Node, source: &str) -> Option<String> {
    let first = named_children(body)
        .into_iter()
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    string_value(first.named_child(0)?, source)
}

fn docstring_of(definition: Node, source: &str) -> Option<String> {
    definition
        .child_by_field_name("body")
        .and_then(|body| docstring(body, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    const XMLWRITER_FIXTURE: &str = include_str!("../../test_fixtures/xmlwriter.py");

    fn load(source: &str) -> ObjectGraph {
        PythonLoader::new()
            .load_source(source, Path::new("test.py"))
            .unwrap()
    }

    fn lookup(graph: &ObjectGraph, path: &[&str]) -> ObjectId {
        let mut id = graph.root_id();
        for segment in path {
            id = graph
                .member(id, segment)
                .unwrap_or_else(|| panic!("missing member {segment}"));
        }
        id
    }

    fn doc(graph: &ObjectGraph, path: &[&str]) -> Option<String> {
        graph.description(lookup(graph, path)).unwrap()
    }

    #[test]
    fn test_loader_name_and_extensions() {
        let loader = PythonLoader::new();
        assert_eq!(loader.loader_name(), "python");
        assert_eq!(loader.file_extensions(), &["py"]);
    }

    #[test]
    fn test_module_docstring() {
        let graph = load("#!/usr/bin/env python\n# comment\n\"\"\"Module doc.\"\"\"\nx = 1\n");
        assert_eq!(graph.doc(graph.root_id()), Some("Module doc."));
    }

    #[test]
    fn test_no_module_docstring() {
        let graph = load("x = 1\n\"\"\"Not a docstring.\"\"\"\n");
        assert_eq!(graph.doc(graph.root_id()), None);
    }

    #[test]
    fn test_functions_and_classes() {
        let graph = load(
            r#"
def top():
    """Top level."""

class Writer:
    """Writes things."""

    def write(self, text):
        """Write text."""
        def helper():
            """Nested helpers are not members."""

    async def flush(self):
        pass
"#,
        );

        assert_eq!(doc(&graph, &["top"]).as_deref(), Some("Top level."));
        assert_eq!(doc(&graph, &["Writer"]).as_deref(), Some("Writes things."));
        assert_eq!(doc(&graph, &["Writer", "write"]).as_deref(), Some("Write text."));
        assert_eq!(doc(&graph, &["Writer", "flush"]), None);
        assert_eq!(graph.category(lookup(&graph, &["Writer"])), Category::Class);
        assert_eq!(graph.category(lookup(&graph, &["top"])), Category::Function);
        assert!(graph.member(lookup(&graph, &["Writer", "write"]), "helper").is_none());
    }

    #[test]
    fn test_docstring_is_raw_doc_value() {
        let graph = load("def f():\n    \"\"\"First line.\n\n    Indented body.\n    \"\"\"\n");
        assert_eq!(
            doc(&graph, &["f"]).as_deref(),
            Some("First line.\n\n    Indented body.\n    ")
        );
    }

    #[test]
    fn test_concatenated_docstring() {
        let graph = load("def f():\n    \"one \" 'two'\n");
        assert_eq!(doc(&graph, &["f"]).as_deref(), Some("one two"));
    }

    #[test]
    fn test_fstring_and_bytes_are_not_docstrings() {
        let graph = load("def f():\n    f\"{1}\"\n\ndef g():\n    b\"raw\"\n");
        assert_eq!(doc(&graph, &["f"]), None);
        assert_eq!(doc(&graph, &["g"]), None);
    }

    #[test]
    fn test_crlf_source() {
        let graph = load("def f():\r\n    \"\"\"Line one.\r\n    Line two.\"\"\"\r\n");
        assert_eq!(
            doc(&graph, &["f"]).as_deref(),
            Some("Line one.\n    Line two.")
        );
    }

    #[test]
    fn test_properties() {
        let graph = load(
            r#"
class Element:
    @property
    def name(self):
        """The element name."""
        return self._name

    @name.setter
    def name(self, value):
        """Setter docs are ignored."""
        self._name = value

    def _get_size(self):
        """Size in bytes."""

    size = property(_get_size)
    kind = property(doc="Element kind.")

    @staticmethod
    def create():
        """Factory."""
"#,
        );

        let name = lookup(&graph, &["Element", "name"]);
        assert_eq!(graph.category(name), Category::Property);
        assert_eq!(doc(&graph, &["Element", "name"]).as_deref(), Some("The element name."));
        assert_eq!(doc(&graph, &["Element", "size"]).as_deref(), Some("Size in bytes."));
        assert_eq!(
            graph.category(lookup(&graph, &["Element", "size"])),
            Category::Property
        );
        assert_eq!(doc(&graph, &["Element", "kind"]).as_deref(), Some("Element kind."));
        assert_eq!(
            graph.category(lookup(&graph, &["Element", "create"])),
            Category::Function
        );
    }

    #[test]
    fn test_literal_attributes_are_builtin() {
        let graph = load(
            r#"
VERSION = "1.0"
LEVEL = -1
RATIO = 0.5
FLAGS = {"a": 1}
NAMES = [n for n in "abc"]
DEFAULT = None
ENABLED = True
"#,
        );
        for name in ["VERSION", "LEVEL", "RATIO", "FLAGS", "NAMES", "DEFAULT", "ENABLED"] {
            assert_eq!(
                graph.category(lookup(&graph, &[name])),
                Category::Builtin,
                "{name}"
            );
        }
    }

    #[test]
    fn test_aliases_share_identity() {
        let graph = load(
            r#"
class XmlStream:
    """Stream."""

Stream = XmlStream
A = B = XmlStream
"#,
        );
        let original = lookup(&graph, &["XmlStream"]);
        assert_eq!(lookup(&graph, &["Stream"]), original);
        assert_eq!(lookup(&graph, &["A"]), original);
        assert_eq!(lookup(&graph, &["B"]), original);
    }

    #[test]
    fn test_unknown_values_are_opaque() {
        let graph = load("writer = make_writer()\nalias = undefined_name\na, b = 1, 2\nx: int\n");
        assert_eq!(graph.category(lookup(&graph, &["writer"])), Category::Opaque);
        assert_eq!(graph.category(lookup(&graph, &["alias"])), Category::Opaque);
        assert_eq!(graph.category(lookup(&graph, &["a"])), Category::Opaque);
        assert_eq!(graph.category(lookup(&graph, &["b"])), Category::Opaque);
        assert!(graph.member(graph.root_id(), "x").is_none());
    }

    #[test]
    fn test_imports() {
        let graph = load(
            r#"
import os
import os.path
import xml.etree.ElementTree as ET
from datetime import datetime, timedelta as td
from . import sibling
"#,
        );
        assert_eq!(graph.category(lookup(&graph, &["os"])), Category::Module);
        assert_eq!(graph.category(lookup(&graph, &["ET"])), Category::Module);
        assert!(graph.member(graph.root_id(), "xml").is_none());
        assert_eq!(graph.category(lookup(&graph, &["datetime"])), Category::Opaque);
        assert_eq!(graph.category(lookup(&graph, &["td"])), Category::Opaque);
        assert_eq!(graph.category(lookup(&graph, &["sibling"])), Category::Opaque);
        assert!(graph.member(graph.root_id(), "timedelta").is_none());
    }

    #[test]
    fn test_inheritance() {
        let graph = load(
            r#"
class Base:
    """Base."""
    def close(self):
        """Close the base."""
    def write(self):
        """Base write."""

class Derived(Base):
    """Derived."""
    def write(self):
        """Derived write."""

class Leaf(Derived, metaclass=Meta):
    pass
"#,
        );

        let base_close = lookup(&graph, &["Base", "close"]);
        assert_eq!(lookup(&graph, &["Derived", "close"]), base_close);
        assert_eq!(doc(&graph, &["Derived", "write"]).as_deref(), Some("Derived write."));
        assert_eq!(lookup(&graph, &["Leaf", "close"]), base_close);
        assert_eq!(doc(&graph, &["Leaf", "write"]).as_deref(), Some("Derived write."));
    }

    #[test]
    fn test_attribute_assignment_can_create_cycles() {
        let graph = load(
            r#"
class Node:
    """A node."""

Node.default_type = Node
"#,
        );
        let node = lookup(&graph, &["Node"]);
        assert_eq!(graph.member(node, "default_type"), Some(node));
    }

    #[test]
    fn test_class_name_not_visible_in_own_body() {
        let graph = load("class C:\n    me = C\n");
        let me = lookup(&graph, &["C", "me"]);
        assert_ne!(me, lookup(&graph, &["C"]));
        assert_eq!(graph.category(me), Category::Opaque);
    }

    #[test]
    fn test_rebinding_replaces() {
        let graph = load("def f():\n    \"\"\"old\"\"\"\n\ndef f():\n    \"\"\"new\"\"\"\n");
        assert_eq!(doc(&graph, &["f"]).as_deref(), Some("new"));
        assert_eq!(graph.members_of(graph.root_id()).len(), 1);
    }

    #[test]
    fn test_syntax_error() {
        let err = PythonLoader::new()
            .load_source("def ok():\n    pass\n\ndef broken(:\n", Path::new("bad.py"))
            .unwrap_err();
        match err {
            LoadError::Syntax { path, line } => {
                assert_eq!(path, PathBuf::from("bad.py"));
                assert!(line >= 4, "error reported on line {line}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conditional_and_fallback_definitions() {
        let graph = load(
            r#"
import sys

if sys.version_info >= (3,):
    def text(value):
        """Coerce to str."""
elif sys.platform == "win32":
    def wide(value):
        """Coerce to wide str."""
else:
    text = None

try:
    from cXmlWrite import XmlStream
except ImportError:
    class XmlStream:
        """Pure Python fallback."""
finally:
    ACCELERATED = False

with open(__file__) as handle:
    SOURCE_LINES = 1

for _name in ("a", "b"):
    def helper():
        """Loop helper."""
"#,
        );

        // The else branch comes last, so its binding replaces the function
        assert_eq!(graph.category(lookup(&graph, &["text"])), Category::Builtin);
        assert_eq!(doc(&graph, &["wide"]).as_deref(), Some("Coerce to wide str."));
        assert_eq!(graph.category(lookup(&graph, &["XmlStream"])), Category::Class);
        assert_eq!(doc(&graph, &["XmlStream"]).as_deref(), Some("Pure Python fallback."));
        assert_eq!(graph.category(lookup(&graph, &["ACCELERATED"])), Category::Builtin);
        assert_eq!(graph.category(lookup(&graph, &["SOURCE_LINES"])), Category::Builtin);
        assert_eq!(doc(&graph, &["helper"]).as_deref(), Some("Loop helper."));
    }

    #[test]
    fn test_conditional_method_in_class_body() {
        let graph = load(
            r#"
class Writer:
    if True:
        def write(self):
            """Write it."""
"#,
        );
        assert_eq!(doc(&graph, &["Writer", "write"]).as_deref(), Some("Write it."));
    }

    #[test]
    fn test_empty_source() {
        let graph = load("");
        assert_eq!(graph.doc(graph.root_id()), None);
        assert!(graph.members_of(graph.root_id()).is_empty());
    }

    #[test]
    fn test_fixture() {
        let graph = load(XMLWRITER_FIXTURE);
        assert!(graph
            .doc(graph.root_id())
            .is_some_and(|d| d.contains("XML/HTML/SVG")));
        assert_eq!(
            graph.category(lookup(&graph, &["XmlStream"])),
            Category::Class
        );
        assert!(doc(&graph, &["XmlStream", "__enter__"]).is_some());
        assert!(doc(&graph, &["XhtmlStream", "charData"]).is_some());
        assert_eq!(
            graph.category(lookup(&graph, &["XmlStream", "id"])),
            Category::Property
        );
    }

    #[test]
    fn test_load_module_from_file_and_package() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let file = temp_dir.path().join("svgwriter.py");
        fs::write(&file, "\"\"\"SVG.\"\"\"\n").unwrap();

        let loaded = PythonLoader::new().load_module(&file).unwrap();
        assert_eq!(loaded.name, "svgwriter");
        assert_eq!(loaded.graph.doc(loaded.graph.root_id()), Some("SVG."));

        let package = temp_dir.path().join("xmlwriter");
        fs::create_dir(&package).unwrap();
        fs::write(package.join(PACKAGE_INIT), "\"\"\"Package.\"\"\"\n").unwrap();

        let loaded = PythonLoader::new().load_module(&package).unwrap();
        assert_eq!(loaded.name, "xmlwriter");
        assert_eq!(loaded.graph.doc(loaded.graph.root_id()), Some("Package."));
        assert_eq!(loaded.source, package.join(PACKAGE_INIT));
    }

    #[test]
    fn test_load_module_missing_file() {
        let err = PythonLoader::new()
            .load_module(Path::new("/nonexistent/module.py"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
