use crate::{Extensions, ExternalDocumentation};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Adds metadata to a single tag that is used by the Method Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Tag {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name.into()).build()
    }
}
