use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a lint run before every file has a report
#[derive(Error, Debug)]
pub enum LintError {
    #[error("Failed to read OpenRPC file at {path}: {source}")]
    InputFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Validation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Embedded meta-schema is unusable: {0}")]
    MetaSchema(String),

    #[error("Lint run was cancelled")]
    Cancelled,
}
