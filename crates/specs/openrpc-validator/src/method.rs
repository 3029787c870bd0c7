//! Method Object.

use crate::{
    ContentDescriptor, ErrorObject, ExamplePairing, Extensions, ExternalDocumentation, Link,
    OrReference, Server, Tag,
};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Describes the interface for the given method name.
/// The method name is used as the method field of the JSON-RPC body.
/// It therefore MUST be unique.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Method {
    /// The canonical name for the method.
    pub name: String,

    /// Tags for logical grouping of methods.
    #[builder(default)]
    pub tags: Vec<OrReference<Tag>>,

    pub summary: Option<String>,

    pub description: Option<String>,

    pub external_docs: Option<ExternalDocumentation>,

    /// Parameters in positional order. All optional params (content
    /// descriptors with `required: false`) MUST follow all required ones.
    #[builder(default)]
    pub params: Vec<OrReference<ContentDescriptor>>,

    /// Absent for notifications.
    pub result: Option<OrReference<ContentDescriptor>>,

    pub deprecated: Option<bool>,

    /// Overrides the document-level servers for this method.
    pub servers: Option<Vec<Server>>,

    /// Application defined errors. Codes MUST be unique within the method.
    #[builder(default)]
    pub errors: Vec<OrReference<ErrorObject>>,

    #[builder(default)]
    pub links: Vec<OrReference<Link>>,

    /// Defaults to `either` when absent.
    pub param_structure: Option<ParamStructure>,

    #[builder(default)]
    pub examples: Vec<OrReference<ExamplePairing>>,

    #[builder(default)]
    pub extensions: Extensions,
}

/// The expected shape of the JSON-RPC `params` member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamStructure {
    ByName,
    ByPosition,
    #[default]
    Either,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name.into()).build()
    }

    pub fn param_structure(&self) -> ParamStructure {
        self.param_structure.unwrap_or_default()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }

    /// A method without a result is only usable as a notification.
    pub fn is_notification(&self) -> bool {
        self.result.is_none()
    }

    /// Resolved parameters, in order.
    pub fn params(&self) -> impl Iterator<Item = &ContentDescriptor> {
        self.params.iter().filter_map(OrReference::get)
    }

    pub fn result(&self) -> Option<&ContentDescriptor> {
        self.result.as_ref().and_then(OrReference::get)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter_map(OrReference::get)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ErrorObject> {
        self.errors.iter().filter_map(OrReference::get)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter_map(OrReference::get)
    }

    pub fn examples(&self) -> impl Iterator<Item = &ExamplePairing> {
        self.examples.iter().filter_map(OrReference::get)
    }

    /// Indices of required params that follow an optional one.
    pub fn misplaced_required_params(&self) -> Vec<usize> {
        let mut seen_optional = false;
        let mut misplaced = Vec::new();
        for (index, param) in self.params.iter().enumerate() {
            let Some(param) = param.get() else {
                continue;
            };
            if !param.is_required() {
                seen_optional = true;
            } else if seen_optional {
                misplaced.push(index);
            }
        }
        misplaced
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.tags.iter().any(OrReference::is_pending)
            || self.params.iter().any(OrReference::is_pending)
            || self.result.as_ref().is_some_and(OrReference::is_pending)
            || self.errors.iter().any(OrReference::is_pending)
            || self.links.iter().any(OrReference::is_pending)
            || self.examples.iter().any(OrReference::is_pending)
            || self.examples().any(ExamplePairing::has_pending)
    }
}
