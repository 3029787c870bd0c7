use crate::error::LintError;
use crate::report::FileReport;
use openrpc_validator::{Assembler, OpenRpcError, ValidatorOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Validates files concurrently, one blocking task per document.
#[derive(Debug, Clone)]
pub struct Linter {
    assembler: Assembler,
    cancel: CancellationToken,
}

impl Linter {
    pub fn new(options: ValidatorOptions, cancel: CancellationToken) -> Self {
        Self {
            assembler: Assembler::new()
                .with_options(options)
                .with_cancellation(cancel.clone()),
            cancel,
        }
    }

    /// Reports come back in the order of `files`.
    pub async fn lint(&self, files: &[PathBuf]) -> Result<Vec<FileReport>, LintError> {
        let mut tasks = JoinSet::new();

        for (index, file) in files.iter().enumerate() {
            let text = read(file).await?;
            let assembler = self.assembler.clone();
            let file = file.clone();
            tasks.spawn_blocking(move || (index, lint_text(&assembler, file, &text)));
        }

        let mut reports: Vec<Option<FileReport>> = vec![None; files.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, report) = joined?;
            reports[index] = Some(report?);
        }

        if self.cancel.is_cancelled() {
            return Err(LintError::Cancelled);
        }

        let reports: Vec<FileReport> = reports.into_iter().flatten().collect();
        info!(
            files = reports.len(),
            invalid = reports.iter().filter(|report| !report.valid).count(),
            "Lint finished"
        );
        Ok(reports)
    }
}

async fn read(path: &Path) -> Result<String, LintError> {
    debug!("Reading {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LintError::InputFileRead {
            path: path.to_path_buf(),
            source,
        })
}

fn lint_text(assembler: &Assembler, file: PathBuf, text: &str) -> Result<FileReport, LintError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return Ok(FileReport::unparsable(file, err.to_string())),
    };

    match assembler.assemble(&value) {
        Ok(document) => {
            debug!(
                "{}: {} v{} is valid",
                file.display(),
                document.info.title,
                document.info.version
            );
            Ok(FileReport::valid(file))
        }
        Err(OpenRpcError::Invalid(diagnostics)) => {
            debug!("{}: {} problem(s)", file.display(), diagnostics.len());
            Ok(FileReport::invalid(file, diagnostics.into_vec()))
        }
        Err(OpenRpcError::Cancelled) => Err(LintError::Cancelled),
        Err(OpenRpcError::MetaSchema { message }) => Err(LintError::MetaSchema(message)),
    }
}
