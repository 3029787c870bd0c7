//! Error Object for application-defined JSON-RPC errors.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Defines an application level error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ErrorObject {
    /// A number that indicates the error type that occurred.
    pub code: i64,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error. Opaque to this crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self::builder().code(code).message(message.into()).build()
    }

    /// True for codes inside the range JSON-RPC keeps for protocol errors.
    pub fn is_reserved(&self) -> bool {
        error_codes::RESERVED.contains(&self.code)
    }
}

/// Predefined JSON-RPC 2.0 error codes.
pub mod error_codes {
    use super::RangeInclusive;

    /// Codes from -32768 to -32000 are reserved for protocol-level errors.
    pub const RESERVED: RangeInclusive<i64> = -32768..=-32000;

    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}
