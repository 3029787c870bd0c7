//! Link Object.

use crate::{Extensions, Server};
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A possible design-time link from a method result to another method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Link {
    /// Canonical name of the link.
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the target method. Relative method values are not permitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Parameter name to a constant or a runtime expression such as
    /// `$params.user_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, Value>>,

    /// A server object to be used by the target method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Link {
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name.into()).build()
    }

    /// Parameters whose value is a runtime expression (a string starting with `$`).
    pub fn runtime_expressions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .flatten()
            .filter_map(|(name, value)| match value {
                Value::String(expression) if expression.starts_with('$') => {
                    Some((name.as_str(), expression.as_str()))
                }
                _ => None,
            })
    }
}
