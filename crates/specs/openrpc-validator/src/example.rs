//! Example Object and Example Pairing Object.

use crate::{Extensions, OrReference};
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A literal example value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Example {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Embedded literal example.
    pub value: Value,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

/// A set of example params and result, pairing a request with its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ExamplePairing {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub params: Vec<OrReference<Example>>,

    /// Absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OrReference<Example>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Example {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::builder().name(name.into()).value(value.into()).build()
    }
}

impl ExamplePairing {
    /// Resolved example params, in order.
    pub fn params(&self) -> impl Iterator<Item = &Example> {
        self.params.iter().filter_map(OrReference::get)
    }

    pub fn result(&self) -> Option<&Example> {
        self.result.as_ref().and_then(OrReference::get)
    }

    pub fn is_notification(&self) -> bool {
        self.result.is_none()
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.params.iter().any(OrReference::is_pending)
            || self.result.as_ref().is_some_and(OrReference::is_pending)
    }
}
