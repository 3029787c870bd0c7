//! Lint configuration.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - a TOML file passed with `--config`
//! - environment variables with the `OPENRPC_LINT_` prefix
//!
//! Command-line flags are applied on top by [`crate::cli::Args`].

use crate::error::LintError;
use crate::report::OutputFormat;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use openrpc_validator::{
    DEFAULT_MAX_DEPTH, FormatMode, RefSiblings, ReferenceSiblings, ValidatorOptions,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const ENV_PREFIX: &str = "OPENRPC_LINT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Whether keywords beside a schema `$ref` are evaluated
    pub ref_siblings: RefSiblings,

    /// Whether Reference Objects may carry extra keys
    pub reference_siblings: ReferenceSiblings,

    pub max_depth: usize,

    /// Check documents against the OpenRPC meta-schema
    pub meta_schema: bool,

    pub formats: FormatMode,

    /// Report layout (text, json)
    pub output: OutputFormat,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            ref_siblings: RefSiblings::default(),
            reference_siblings: ReferenceSiblings::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            meta_schema: true,
            formats: FormatMode::default(),
            output: OutputFormat::default(),
        }
    }
}

impl LintConfig {
    /// Load from an optional TOML file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, LintError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        // OPENRPC_LINT_MAX_DEPTH=64, OPENRPC_LINT_META_SCHEMA=false, ...
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions::builder()
            .ref_siblings(self.ref_siblings)
            .reference_siblings(self.reference_siblings)
            .max_depth(self.max_depth)
            .meta_schema(self.meta_schema)
            .formats(self.formats)
            .build()
    }
}
