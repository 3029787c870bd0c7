use crate::Extensions;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Additional external documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ExternalDocumentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The URL for the target documentation.
    pub url: String,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}
