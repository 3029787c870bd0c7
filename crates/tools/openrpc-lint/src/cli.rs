use crate::config::LintConfig;
use crate::error::LintError;
use crate::linter::Linter;
use crate::report::{FileReport, OutputFormat, render};
use clap::Parser;
use openrpc_validator::{FormatMode, RefSiblings, ReferenceSiblings};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Validate OpenRPC documents
#[derive(Parser, Debug, Clone)]
#[command(name = "openrpc-lint")]
#[command(about = "Validate OpenRPC documents and report every problem found")]
#[command(version = "0.1.0")]
pub struct Args {
    /// OpenRPC documents to check (JSON)
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report layout
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Treatment of keywords beside a schema `$ref`
    #[arg(long, value_parser = parse_ref_siblings, value_name = "evaluate|ignore")]
    pub ref_siblings: Option<RefSiblings>,

    /// Reject Reference Objects that carry keys besides `$ref`
    #[arg(long)]
    pub strict_references: bool,

    /// Check the `email`, `uri` and `regex` formats
    #[arg(long)]
    pub builtin_formats: bool,

    /// Skip the structural check against the OpenRPC meta-schema
    #[arg(long)]
    pub no_meta_schema: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_ref_siblings(value: &str) -> Result<RefSiblings, String> {
    match value {
        "evaluate" => Ok(RefSiblings::Evaluate),
        "ignore" => Ok(RefSiblings::Ignore),
        other => Err(format!("expected `evaluate` or `ignore`, got `{}`", other)),
    }
}

/// Reports plus their rendering.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub reports: Vec<FileReport>,
    pub output: String,
}

impl Outcome {
    pub fn all_valid(&self) -> bool {
        self.reports.iter().all(|report| report.valid)
    }
}

impl Args {
    /// Configuration with flags applied over file and environment values.
    pub fn settings(&self) -> Result<LintConfig, LintError> {
        let mut config = LintConfig::load(self.config.as_deref())?;

        if let Some(format) = self.format {
            config.output = format;
        }
        if let Some(ref_siblings) = self.ref_siblings {
            config.ref_siblings = ref_siblings;
        }
        if self.strict_references {
            config.reference_siblings = ReferenceSiblings::Reject;
        }
        if self.builtin_formats {
            config.formats = FormatMode::Builtin;
        }
        if self.no_meta_schema {
            config.meta_schema = false;
        }
        Ok(config)
    }

    pub async fn run(&self) -> Result<Outcome, LintError> {
        self.run_with(CancellationToken::new()).await
    }

    pub async fn run_with(&self, cancel: CancellationToken) -> Result<Outcome, LintError> {
        let config = self.settings()?;
        debug!(inputs = self.inputs.len(), ?config, "Starting lint");

        let linter = Linter::new(config.validator_options(), cancel);
        let reports = linter.lint(&self.inputs).await?;
        let output = render(&reports, config.output)?;
        Ok(Outcome { reports, output })
    }
}
