//! Components Object: the resolution target of every `$ref`.

use crate::{
    ComponentKind, ContentDescriptor, ErrorObject, Example, ExamplePairing, Extensions, Link,
    OrReference, SchemaId, Tag,
};
use std::collections::BTreeMap;

/// Reusable objects keyed by identifier, one mapping per component kind.
///
/// Entries other than schemas are themselves X-or-Reference, so a component
/// may point at another component of the same kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    pub schemas: Option<BTreeMap<String, SchemaId>>,
    pub links: Option<BTreeMap<String, OrReference<Link>>>,
    pub errors: Option<BTreeMap<String, OrReference<ErrorObject>>>,
    pub examples: Option<BTreeMap<String, OrReference<Example>>>,
    pub example_pairings: Option<BTreeMap<String, OrReference<ExamplePairing>>>,
    pub content_descriptors: Option<BTreeMap<String, OrReference<ContentDescriptor>>>,
    pub tags: Option<BTreeMap<String, OrReference<Tag>>>,
    pub extensions: Extensions,
}

/// A type stored in one of the non-schema component mappings.
pub trait Component: Sized {
    const KIND: ComponentKind;

    fn table(components: &Components) -> Option<&BTreeMap<String, OrReference<Self>>>;

    fn table_mut(components: &mut Components)
    -> Option<&mut BTreeMap<String, OrReference<Self>>>;
}

macro_rules! component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn table(components: &Components) -> Option<&BTreeMap<String, OrReference<Self>>> {
                components.$field.as_ref()
            }

            fn table_mut(
                components: &mut Components,
            ) -> Option<&mut BTreeMap<String, OrReference<Self>>> {
                components.$field.as_mut()
            }
        }
    };
}

component!(Link, Links, links);
component!(ErrorObject, Errors, errors);
component!(Example, Examples, examples);
component!(ExamplePairing, ExamplePairings, example_pairings);
component!(ContentDescriptor, ContentDescriptors, content_descriptors);
component!(Tag, Tags, tags);

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self, name: &str) -> Option<SchemaId> {
        self.schemas.as_ref()?.get(name).copied()
    }

    /// The entry stored under `name`, exactly as written.
    pub fn entry<T: Component>(&self, name: &str) -> Option<&OrReference<T>> {
        T::table(self)?.get(name)
    }

    /// The concrete value under `name`, if the entry is concrete or resolved.
    pub fn get<T: Component>(&self, name: &str) -> Option<&T> {
        self.entry::<T>(name)?.get()
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: SchemaId) -> Self {
        self.schemas
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn insert<T: Component>(&mut self, name: impl Into<String>, entry: OrReference<T>) {
        if T::table(self).is_none() {
            self.init_table(T::KIND);
        }
        if let Some(table) = T::table_mut(self) {
            table.insert(name.into(), entry);
        }
    }

    pub fn with<T: Component>(mut self, name: impl Into<String>, entry: OrReference<T>) -> Self {
        self.insert(name, entry);
        self
    }

    fn init_table(&mut self, kind: ComponentKind) {
        match kind {
            ComponentKind::Schemas => {
                self.schemas.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::Links => {
                self.links.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::Errors => {
                self.errors.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::Examples => {
                self.examples.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::ExamplePairings => {
                self.example_pairings.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::ContentDescriptors => {
                self.content_descriptors.get_or_insert_with(BTreeMap::new);
            }
            ComponentKind::Tags => {
                self.tags.get_or_insert_with(BTreeMap::new);
            }
        }
    }

    /// Total number of entries across every mapping.
    pub fn len(&self) -> usize {
        fn count<T>(table: &Option<BTreeMap<String, T>>) -> usize {
            table.as_ref().map_or(0, BTreeMap::len)
        }
        count(&self.schemas)
            + count(&self.links)
            + count(&self.errors)
            + count(&self.examples)
            + count(&self.example_pairings)
            + count(&self.content_descriptors)
            + count(&self.tags)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
