//! Error types for OpenRPC document validation and reference resolution.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, JsonPath};
use thiserror::Error;

/// Errors returned by the validator and the assembler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenRpcError {
    /// The input failed validation; carries every diagnostic, sorted by path
    #[error("document is invalid ({} diagnostic(s))", .0.len())]
    Invalid(Diagnostics),

    /// The caller cancelled the run before it finished
    #[error("validation was cancelled")]
    Cancelled,

    /// The embedded meta-schema could not be loaded
    #[error("embedded meta-schema is unusable: {message}")]
    MetaSchema {
        /// What went wrong while loading it
        message: String,
    },
}

impl OpenRpcError {
    pub fn meta_schema(message: impl Into<String>) -> Self {
        Self::MetaSchema {
            message: message.into(),
        }
    }

    /// The diagnostics carried by an `Invalid` error.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Invalid(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }
}

/// Result type for validation operations.
pub type OpenRpcResult<T> = Result<T, OpenRpcError>;

/// Failure to turn a `$ref` string into a component.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The pointer does not name an existing component
    #[error("dangling reference `{reference}`: {reason}")]
    Dangling {
        /// The pointer that failed to resolve
        reference: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Following the chain revisited a pointer
    #[error("reference cycle: {}", .chain.join(" -> "))]
    Cycle {
        /// Pointers in visit order, ending with the repeated one
        chain: Vec<String>,
    },
}

impl ResolveError {
    pub fn dangling(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dangling {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Dangling { .. } => DiagnosticKind::DanglingReference,
            Self::Cycle { .. } => DiagnosticKind::ReferenceCycle,
        }
    }

    /// Report this failure at `path`.
    pub fn into_diagnostic(self, path: JsonPath) -> Diagnostic {
        Diagnostic::new(self.kind(), path, "$ref", self.to_string())
    }
}
