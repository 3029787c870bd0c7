//! Server Object and Server Variable Object.

use crate::Extensions;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An object representing a Server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Server {
    /// A URL to the target host. It MAY contain `{name}` placeholders that
    /// are filled from `variables`, and MAY be relative.
    pub url: String,

    /// A name to be used as the canonical name for the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Values substituted into the URL template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, ServerVariable>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

/// A variable for server URL template substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ServerVariable {
    /// Used when no alternative value is supplied.
    pub default: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed values, when the set is limited.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self::builder().url(url.into()).build()
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), variable);
        self
    }

    /// The `{name}` placeholders of the URL, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut found = Vec::new();
        let mut rest = self.url.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let name = &after[..close];
            if !name.is_empty() && !found.contains(&name) {
                found.push(name);
            }
            rest = &after[close + 1..];
        }
        found
    }

    /// Placeholders with no matching entry in `variables`.
    pub fn undeclared_variables(&self) -> Vec<&str> {
        self.placeholders()
            .into_iter()
            .filter(|name| {
                !self
                    .variables
                    .as_ref()
                    .is_some_and(|variables| variables.contains_key(*name))
            })
            .collect()
    }

    /// The URL with every declared placeholder replaced by its default.
    pub fn resolve_url(&self) -> String {
        let mut resolved = self.url.clone();
        if let Some(variables) = &self.variables {
            for (name, variable) in variables {
                resolved = resolved.replace(&format!("{{{}}}", name), &variable.default);
            }
        }
        resolved
    }
}

impl ServerVariable {
    pub fn new(default: impl Into<String>) -> Self {
        Self::builder().default(default.into()).build()
    }
}
