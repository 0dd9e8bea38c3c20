//! @dose
//! purpose: Arena-backed ObjectGraph, the Namespace implementation every loader builds.
//!
//! invariants:
//!     - The root module object is always index 0
//!     - An object is never removed; rebinding a name only changes which id it points at
//!
//! gotchas:
//!     - A failed object still reports its category, only description and members error

use super::{IntrospectError, Namespace};
use crate::types::Category;

/// Index of an object inside an ObjectGraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);


#[derive(Debug, Clone)]
struct Object {
    category: Category,
    doc: Option<String>,
    members: Vec<(String, ObjectId)>,
    /// Set when introspecting the real object failed
    failure: Option<String>,
}

/// Arena-backed object graph. Members reference other objects by id, so shared
/// and self-referential structures are representable.
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    objects: Vec<Object>,
}

impl ObjectGraph {
    /// Create a graph containing only the root module object
    pub fn new(doc: Option<String>) -> Self {
        Self {
            objects: vec![Object {
                category: Category::Module,
                doc,
                members: Vec::new(),
                failure: None,
            }],
        }
    }

    pub fn root_id(&self) -> ObjectId {
        ObjectId(0)
    }

    /// Number of objects in the arena, the root included
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Add a detached object and return its id
    pub fn add_object(&mut self, category: Category, doc: Option<String>) -> ObjectId {
        self.objects.push(Object {
            category,
            doc,
            members: Vec::new(),
            failure: None,
        });
        ObjectId(self.objects.len() - 1)
    }

    /// Add a new object and bind it as `owner.name`
    pub fn insert(
        &mut self,
        owner: ObjectId,
        name: &str,
        category: Category,
        doc: Option<&str>,
    ) -> ObjectId {
        let id = self.add_object(category, doc.map(str::to_string));
        self.bind(owner, name, id);
        id
    }

    /// Bind `owner.name` to `member`, replacing any previous binding of that name
    pub fn bind(&mut self, owner: ObjectId, name: &str, member: ObjectId) {
        let members = &mut self.objects[owner.0].members;
        match members.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = member,
            None => members.push((name.to_string(), member)),
        }
    }

    /// Bind `owner.name` only if the name is not bound yet. Returns whether it bound.
    pub fn bind_if_absent(&mut self, owner: ObjectId, name: &str, member: ObjectId) -> bool {
        if self.member(owner, name).is_some() {
            return false;
        }
        self.objects[owner.0].members.push((name.to_string(), member));
        true
    }

    /// Look up `owner.name`
    pub fn member(&self, owner: ObjectId, name: &str) -> Option<ObjectId> {
        self.objects
            .get(owner.0)?
            .members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    /// Members of an object in binding order
    pub fn members_of(&self, id: ObjectId) -> &[(String, ObjectId)] {
        self.objects
            .get(id.0)
            .map(|o| o.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn doc(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(id.0)?.doc.as_deref()
    }

    pub fn category_of(&self, id: ObjectId) -> Category {
        self.objects
            .get(id.0)
            .map(|o| o.category)
            .unwrap_or_default()
    }

    /// Make every lookup on this object fail with `message`
    pub fn mark_failed(&mut self, id: ObjectId, message: impl Into<String>) {
        self.objects[id.0].failure = Some(message.into());
    }

    fn get(&self, id: ObjectId) -> Result<&Object, IntrospectError> {
        self.objects
            .get(id.0)
            .ok_or(IntrospectError::UnknownHandle(id.0))
    }
}

impl Namespace for ObjectGraph {
    type Handle = ObjectId;

    fn root(&self) -> ObjectId {
        self.root_id()
    }

    fn members(&self, handle: ObjectId) -> Result<Vec<(String, ObjectId)>, IntrospectError> {
        let object = self.get(handle)?;
        if let Some(ref failure) = object.failure {
            return Err(IntrospectError::Members(failure.clone()));
        }
        Ok(object.members.clone())
    }

    fn description(&self, handle: ObjectId) -> Result<Option<String>, IntrospectError> {
        let object = self.get(handle)?;
        if let Some(ref failure) = object.failure {
            return Err(IntrospectError::Description(failure.clone()));
        }
        Ok(object.doc.clone())
    }

    fn category(&self, handle: ObjectId) -> Category {
        self.category_of(handle)
    }
}
