//! X-or-Reference slots and the rule that tells them apart.
//!
//! An object is a Reference if and only if it carries a string-valued `$ref`.
//! The rule is checked before any field of X is read, so a Reference never
//! turns into a mostly-empty X.

use crate::reference::Reference;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// What a union slot holds, decided from the raw value alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<'a> {
    Reference {
        reference: &'a str,
        /// Keys other than `$ref`, in document order.
        extra_keys: Vec<&'a str>,
    },
    Concrete(&'a Value),
}

pub fn disambiguate(value: &Value) -> Shape<'_> {
    if let Value::Object(map) = value {
        if let Some(Value::String(reference)) = map.get("$ref") {
            let extra_keys = map
                .keys()
                .map(String::as_str)
                .filter(|key| *key != "$ref")
                .collect();
            return Shape::Reference {
                reference,
                extra_keys,
            };
        }
    }
    Shape::Concrete(value)
}

/// A slot that holds either a concrete `T` or a pointer to one.
///
/// The assembler turns every `Pending` pointer into `Resolved`; consumers of
/// an assembled document read through [`OrReference::get`] and never look at
/// `$ref` again.
#[derive(Debug, Clone, PartialEq)]
pub enum OrReference<T> {
    Concrete(Arc<T>),
    Pending(Reference),
    Resolved { reference: Reference, target: Arc<T> },
}

impl<T> OrReference<T> {
    pub fn concrete(value: T) -> Self {
        Self::Concrete(Arc::new(value))
    }

    pub fn pending(reference: Reference) -> Self {
        Self::Pending(reference)
    }

    /// The concrete value, if there is one yet.
    pub fn get(&self) -> Option<&T> {
        self.target().map(Arc::as_ref)
    }

    pub fn target(&self) -> Option<&Arc<T>> {
        match self {
            Self::Concrete(value) => Some(value),
            Self::Resolved { target, .. } => Some(target),
            Self::Pending(_) => None,
        }
    }

    /// The pointer this slot was written with, if any.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Self::Pending(reference) | Self::Resolved { reference, .. } => Some(reference),
            Self::Concrete(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Resolve a pending pointer in place. Other states are left untouched.
    pub fn resolve_with<E>(
        &mut self,
        resolve: impl FnOnce(&Reference) -> Result<Arc<T>, E>,
    ) -> Result<(), E> {
        if let Self::Pending(reference) = self {
            let target = resolve(reference)?;
            *self = Self::Resolved {
                reference: reference.clone(),
                target,
            };
        }
        Ok(())
    }
}

impl<T> From<Reference> for OrReference<T> {
    fn from(reference: Reference) -> Self {
        Self::Pending(reference)
    }
}

impl<T: Serialize> Serialize for OrReference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Concrete(value) => value.serialize(serializer),
            Self::Pending(reference) | Self::Resolved { reference, .. } => {
                reference.serialize(serializer)
            }
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for OrReference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match disambiguate(&value) {
            Shape::Reference { reference, .. } => Ok(Self::Pending(Reference::new(reference))),
            Shape::Concrete(_) => T::deserialize(value)
                .map(Self::concrete)
                .map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tag;
    use serde_json::json;

    #[test]
    fn test_ref_presence_decides() {
        let value = json!({"$ref": "#/components/tags/Foo"});
        assert_eq!(
            disambiguate(&value),
            Shape::Reference {
                reference: "#/components/tags/Foo",
                extra_keys: vec![]
            }
        );
    }

    #[test]
    fn test_extra_keys_are_reported_not_reinterpreted() {
        let value = json!({"$ref": "#/components/tags/Foo", "description": "extra"});
        match disambiguate(&value) {
            Shape::Reference {
                reference,
                extra_keys,
            } => {
                assert_eq!(reference, "#/components/tags/Foo");
                assert_eq!(extra_keys, vec!["description"]);
            }
            other => panic!("expected a reference, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_ref_is_concrete() {
        let value = json!({"$ref": 5, "name": "x"});
        assert!(matches!(disambiguate(&value), Shape::Concrete(_)));
        assert!(matches!(disambiguate(&json!("text")), Shape::Concrete(_)));
    }

    #[test]
    fn test_deserialize_applies_the_rule() {
        let slot: OrReference<Tag> =
            serde_json::from_value(json!({"$ref": "#/components/tags/Foo", "name": "ignored"}))
                .unwrap();
        assert_eq!(slot.reference(), Some(&Reference::tag("Foo")));
        assert!(slot.get().is_none());

        let slot: OrReference<Tag> = serde_json::from_value(json!({"name": "math"})).unwrap();
        assert_eq!(slot.get().map(|tag| tag.name.as_str()), Some("math"));
    }

    #[test]
    fn test_resolve_with_is_idempotent() {
        let mut slot: OrReference<Tag> = Reference::tag("Foo").into();
        let target = Arc::new(Tag::new("Foo"));

        slot.resolve_with(|_| Ok::<_, ()>(target.clone())).unwrap();
        let once = slot.clone();
        slot.resolve_with(|_| Err(())).unwrap();

        assert_eq!(slot, once);
        assert_eq!(slot.get().map(|tag| tag.name.as_str()), Some("Foo"));
        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!({"$ref": "#/components/tags/Foo"})
        );
    }
}
