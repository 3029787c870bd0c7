//! Validator configuration.
//!
//! Options are plain data so that callers can load them from any source
//! serde understands; the core itself never reads files or the environment.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// How keywords sitting next to a schema `$ref` are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefSiblings {
    /// Draft-07: siblings are evaluated in addition to the referenced schema.
    #[default]
    Evaluate,
    /// `$ref` is an exclusive pointer; siblings are ignored.
    Ignore,
}

/// Whether a Reference Object in an X-or-Reference slot may carry extra keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSiblings {
    #[default]
    Tolerate,
    Reject,
}

/// Which `format` checks are registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatMode {
    /// No checks; every format is an annotation.
    #[default]
    Annotate,
    /// Register the built-in `email`, `uri` and `regex` checks.
    Builtin,
}

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    #[builder(default)]
    pub ref_siblings: RefSiblings,

    #[builder(default)]
    pub reference_siblings: ReferenceSiblings,

    /// Recursion bound for the schema validator.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Check the document against the embedded OpenRPC meta-schema.
    #[builder(default = true)]
    pub meta_schema: bool,

    #[builder(default)]
    pub formats: FormatMode,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            ref_siblings: RefSiblings::default(),
            reference_siblings: ReferenceSiblings::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            meta_schema: true,
            formats: FormatMode::default(),
        }
    }
}
