//! Command-line linting for OpenRPC documents.
//!
//! Reads files, parses them as JSON and hands them to
//! [`openrpc_validator::Assembler`], printing every diagnostic found.

pub mod cli;
pub mod config;
pub mod error;
pub mod linter;
pub mod report;

pub use cli::{Args, Outcome};
pub use config::LintConfig;
pub use error::LintError;
pub use linter::Linter;
pub use report::{FileReport, OutputFormat};
