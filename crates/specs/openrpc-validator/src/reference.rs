//! Reference Object and the component pointers it carries.
//!
//! Within an OpenRPC document a reference has the fixed shape
//! `#/components/<kind>/<identifier>`.

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The component mappings a reference can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Schemas,
    Links,
    Errors,
    Examples,
    ExamplePairings,
    ContentDescriptors,
    Tags,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        Self::Schemas,
        Self::Links,
        Self::Errors,
        Self::Examples,
        Self::ExamplePairings,
        Self::ContentDescriptors,
        Self::Tags,
    ];

    /// Key of this mapping inside `components`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Schemas => "schemas",
            Self::Links => "links",
            Self::Errors => "errors",
            Self::Examples => "examples",
            Self::ExamplePairings => "examplePairings",
            Self::ContentDescriptors => "contentDescriptors",
            Self::Tags => "tags",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A `{"$ref": "..."}` indirection into `components`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
pub struct Reference {
    /// The reference string.
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// Pointer to a named component.
    pub fn component(kind: ComponentKind, name: &str) -> Self {
        Self::new(format!("#/components/{}/{}", kind.key(), name))
    }

    pub fn schema(name: &str) -> Self {
        Self::component(ComponentKind::Schemas, name)
    }

    pub fn content_descriptor(name: &str) -> Self {
        Self::component(ComponentKind::ContentDescriptors, name)
    }

    pub fn error(name: &str) -> Self {
        Self::component(ComponentKind::Errors, name)
    }

    pub fn example(name: &str) -> Self {
        Self::component(ComponentKind::Examples, name)
    }

    pub fn example_pairing(name: &str) -> Self {
        Self::component(ComponentKind::ExamplePairings, name)
    }

    pub fn link(name: &str) -> Self {
        Self::component(ComponentKind::Links, name)
    }

    pub fn tag(name: &str) -> Self {
        Self::component(ComponentKind::Tags, name)
    }

    pub fn as_str(&self) -> &str {
        &self.reference
    }

    /// Split into `(kind key, identifier)`; `None` when the pointer does not
    /// have the `#/components/<kind>/<identifier>` shape.
    pub fn component_parts(&self) -> Option<(&str, &str)> {
        component_parts(&self.reference)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

pub(crate) fn component_parts(reference: &str) -> Option<(&str, &str)> {
    let path = reference.strip_prefix("#/components/")?;
    let (kind, name) = path.split_once('/')?;
    if kind.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((kind, name))
}
