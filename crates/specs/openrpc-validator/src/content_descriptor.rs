//! Content Descriptor Object.

use crate::{Extensions, SchemaId};
use bon::Builder;

/// A named schema with required and deprecated flags, describing a method
/// parameter or result.
///
/// The schema lives in the owning document's [`SchemaArena`](crate::SchemaArena).
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ContentDescriptor {
    /// Name of the content being described. For by-name params this is the key.
    pub name: String,

    pub summary: Option<String>,

    pub description: Option<String>,

    /// Schema describing the content.
    pub schema: SchemaId,

    /// Defaults to false when absent.
    pub required: Option<bool>,

    /// Defaults to false when absent.
    pub deprecated: Option<bool>,

    #[builder(default)]
    pub extensions: Extensions,
}

impl ContentDescriptor {
    pub fn new(name: impl Into<String>, schema: SchemaId) -> Self {
        Self::builder().name(name.into()).schema(schema).build()
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaArena;
    use serde_json::json;

    #[test]
    fn test_flags_default_to_false() {
        let (_arena, schema) = SchemaArena::from_value(&json!({"type": "integer"})).unwrap();
        let descriptor = ContentDescriptor::new("a", schema);
        assert!(!descriptor.is_required());
        assert!(!descriptor.is_deprecated());
        assert_eq!(descriptor.required, None);

        let descriptor = ContentDescriptor::builder()
            .name("b".to_string())
            .schema(schema)
            .required(true)
            .build();
        assert!(descriptor.is_required());
    }
}
