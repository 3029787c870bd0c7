//! Specification extensions.
//!
//! Every OpenRPC object may carry patterned `x-` fields. When an object is
//! read, only `x-` keys land here; other unknown keys are the meta-schema's
//! business and are dropped from the typed model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const EXTENSION_PREFIX: &str = "x-";

/// `x-` fields attached to an object.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Extensions(HashMap<String, Value>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an extension field. Returns `false`, leaving the map
    /// unchanged, when `key` lacks the `x-` prefix.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if !is_extension_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Builder pattern for adding extensions
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = HashMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self(
            fields
                .into_iter()
                .filter(|(key, _)| is_extension_key(key))
                .collect(),
        ))
    }
}

/// `x-` followed by at least one character.
pub fn is_extension_key(key: &str) -> bool {
    key.len() > EXTENSION_PREFIX.len() && key.starts_with(EXTENSION_PREFIX)
}

/// Pull the extension fields out of a raw object.
pub(crate) fn collect(map: &serde_json::Map<String, Value>) -> Extensions {
    Extensions(
        map.iter()
            .filter(|(key, _)| is_extension_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_requires_prefix() {
        let mut extensions = Extensions::new();
        assert!(extensions.insert("x-internal-id", 42));
        assert!(!extensions.insert("internal-id", 42));
        assert!(!extensions.insert("x-", 1));
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions.get("x-internal-id"), Some(&json!(42)));
    }

    #[test]
    fn test_flattened_deserialize_keeps_only_extensions() {
        #[derive(Deserialize)]
        struct Holder {
            name: String,
            #[serde(flatten)]
            extensions: Extensions,
        }

        let holder: Holder = serde_json::from_value(json!({
            "name": "n",
            "x-owner": "team",
            "unknown": true
        }))
        .unwrap();

        assert_eq!(holder.name, "n");
        assert_eq!(holder.extensions.len(), 1);
        assert!(holder.extensions.contains_key("x-owner"));
    }
}
