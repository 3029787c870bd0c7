//! OpenRPC Validator
//!
//! Typed OpenRPC documents, assembled from a parsed JSON value and checked
//! in one pass.
//!
//! This crate provides:
//! - The OpenRPC document model, with every X-or-Reference slot resolved
//! - A JSON Schema draft-07 validator over an arena of compiled schemas
//! - Reference resolution within `components`, with cycle detection
//! - Document-level checks: unique method names, unique error codes per
//!   method, required-before-optional params and server URL variables
//! - Structured diagnostics that name the path, the rule and a message
//!
//! # Example
//!
//! ```rust
//! use openrpc_validator::{Assembler, DiagnosticKind, OpenRpcError};
//! use serde_json::json;
//!
//! let document = json!({
//!     "openrpc": "1.3.2",
//!     "info": {"title": "Example API", "version": "1.0.0"},
//!     "methods": [
//!         {"name": "subtract", "params": []},
//!         {"name": "subtract", "params": []}
//!     ]
//! });
//!
//! match Assembler::new().assemble(&document) {
//!     Err(OpenRpcError::Invalid(diagnostics)) => {
//!         assert_eq!(diagnostics.count(DiagnosticKind::DuplicateIdentifier), 1);
//!     }
//!     other => panic!("expected a duplicate method name, got {other:?}"),
//! }
//! ```

pub mod assembler;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod format;
pub mod meta_schema;
pub mod options;
pub mod resolver;
pub mod schema;
pub mod validator;

mod number;

// Document model
mod components;
mod content_descriptor;
mod error_object;
mod example;
mod extensions;
mod external_docs;
mod info;
mod link;
mod method;
mod or_reference;
mod reference;
mod server;
mod tag;

pub use components::*;
pub use content_descriptor::*;
pub use error_object::*;
pub use example::*;
pub use extensions::*;
pub use external_docs::*;
pub use info::*;
pub use link::*;
pub use method::*;
pub use or_reference::*;
pub use reference::*;
pub use server::*;
pub use tag::*;

pub use assembler::{assemble, Assembler};
pub use diagnostic::*;
pub use document::*;
pub use error::*;
pub use format::{FormatCheck, FormatRegistry};
pub use meta_schema::{meta_schema, MetaSchema};
pub use options::*;
pub use resolver::Resolver;
pub use schema::{SchemaArena, SchemaId, SchemaNode, SchemaObject};
pub use validator::SchemaValidator;

/// OpenRPC specification version constants
pub mod version {
    /// Newest OpenRPC specification version the model covers
    pub const CURRENT: &str = "1.3.2";

    /// Any `1.x.y` release.
    pub fn is_supported(version: &str) -> bool {
        let parts: Vec<&str> = version.split('.').collect();
        parts.len() == 3
            && parts[0] == "1"
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert!(version::is_supported(version::CURRENT));
        assert!(version::is_supported("1.0.0"));
        assert!(version::is_supported("1.4.10"));
        assert!(!version::is_supported("2.0.0"));
        assert!(!version::is_supported("1.3"));
        assert!(!version::is_supported("1.3.x"));
    }
}
