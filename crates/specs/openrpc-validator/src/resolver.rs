//! Reference resolution against a document's `components`.
//!
//! A lookup is a single map access, but the entry found may itself be a
//! reference. The resolver follows such chains to a concrete node, tracking
//! the pointers it has visited so a cycle fails instead of looping. The
//! visited set belongs to one call and is never shared.

use crate::error::ResolveError;
use crate::reference::component_parts;
use crate::schema::{SchemaArena, SchemaId, SchemaNode, SchemaObject};
use crate::{Component, ComponentKind, Components, OrReference, Reference};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// One step of a chain: either the value sought or the next pointer.
enum Step<V> {
    Target(V),
    Next(String),
}

/// Read-only view over a components index and the schema arena it refers to.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    components: Option<&'a Components>,
    arena: &'a SchemaArena,
}

impl<'a> Resolver<'a> {
    pub fn new(components: Option<&'a Components>, arena: &'a SchemaArena) -> Self {
        Self { components, arena }
    }

    pub fn components(&self) -> Option<&'a Components> {
        self.components
    }

    pub fn arena(&self) -> &'a SchemaArena {
        self.arena
    }

    /// Resolve a pointer to a concrete component of type `T`.
    pub fn resolve<T: Component>(&self, reference: &Reference) -> Result<Arc<T>, ResolveError> {
        self.follow(reference.as_str(), T::KIND, |name| {
            let entry = self.components.and_then(T::table)?.get(name)?;
            Some(match entry {
                OrReference::Concrete(target) | OrReference::Resolved { target, .. } => {
                    Step::Target(Arc::clone(target))
                }
                OrReference::Pending(next) => Step::Next(next.reference.clone()),
            })
        })
    }

    /// Resolve a schema pointer, skipping over schemas that are nothing but
    /// another `$ref`.
    pub fn resolve_schema(&self, reference: &str) -> Result<SchemaId, ResolveError> {
        self.follow(reference, ComponentKind::Schemas, |name| {
            let id = self.components?.schema(name)?;
            let next = self
                .arena
                .get(id)
                .and_then(SchemaNode::as_object)
                .and_then(SchemaObject::pure_reference);
            Some(match next {
                Some(next) => Step::Next(next.to_string()),
                None => Step::Target(id),
            })
        })
    }

    /// Follow a schema pointer through every component whose root carries a
    /// `$ref`, whatever other keywords sit beside it.
    ///
    /// Such a chain validates the same instance at every hop, so a repeated
    /// pointer can never terminate.
    pub fn follow_schema_refs(&self, reference: &str) -> Result<SchemaId, ResolveError> {
        self.follow(reference, ComponentKind::Schemas, |name| {
            let id = self.components?.schema(name)?;
            let next = self
                .arena
                .get(id)
                .and_then(SchemaNode::as_object)
                .and_then(|object| object.reference.as_deref());
            Some(match next {
                Some(next) => Step::Next(next.to_string()),
                None => Step::Target(id),
            })
        })
    }

    fn follow<V>(
        &self,
        start: &str,
        kind: ComponentKind,
        mut lookup: impl FnMut(&str) -> Option<Step<V>>,
    ) -> Result<V, ResolveError> {
        let mut visited = HashSet::new();
        let mut chain = Vec::new();
        let mut current = start.to_string();

        loop {
            if !visited.insert(current.clone()) {
                chain.push(current);
                return Err(ResolveError::Cycle { chain });
            }
            chain.push(current.clone());
            trace!(reference = %current, depth = chain.len(), "resolving reference");

            let Some((kind_key, name)) = component_parts(&current) else {
                return Err(ResolveError::dangling(
                    &current,
                    "expected a pointer of the form `#/components/<kind>/<identifier>`",
                ));
            };
            let Some(found) = ComponentKind::from_key(kind_key) else {
                return Err(ResolveError::dangling(
                    &current,
                    format!("unknown component kind `{}`", kind_key),
                ));
            };
            if found != kind {
                return Err(ResolveError::dangling(
                    &current,
                    format!("points into components.{}, expected components.{}", found, kind),
                ));
            }

            match lookup(name) {
                Some(Step::Target(target)) => return Ok(target),
                Some(Step::Next(next)) => current = next,
                None => {
                    return Err(ResolveError::dangling(
                        &current,
                        format!("components.{} has no entry `{}`", kind, name),
                    ));
                }
            }
        }
    }
}
