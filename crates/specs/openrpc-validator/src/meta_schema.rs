//! The embedded OpenRPC meta-schema.
//!
//! Written in the same `#/components/schemas/<name>` form as the documents it
//! checks, so the ordinary resolver and validator run it without a second
//! pointer syntax. It is parsed once per process.

use crate::diagnostic::{Diagnostics, JsonPath};
use crate::error::{OpenRpcError, OpenRpcResult};
use crate::resolver::Resolver;
use crate::schema::{SchemaArena, SchemaId};
use crate::validator::SchemaValidator;
use crate::Components;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

const SOURCE: &str = include_str!("../meta-schema/openrpc.json");

static META_SCHEMA: Lazy<Result<MetaSchema, String>> = Lazy::new(|| load(SOURCE));

/// The compiled meta-schema: its own arena and components plus the name of
/// the document-level definition.
#[derive(Debug)]
pub struct MetaSchema {
    arena: SchemaArena,
    components: Components,
    root: SchemaId,
}

/// The process-wide meta-schema, compiled on first use.
pub fn meta_schema() -> OpenRpcResult<&'static MetaSchema> {
    META_SCHEMA
        .as_ref()
        .map_err(|message| OpenRpcError::meta_schema(message.clone()))
}

impl MetaSchema {
    /// The definition every OpenRPC document is checked against.
    pub fn root(&self) -> SchemaId {
        self.root
    }

    /// A named definition, e.g. `methodObject` or `JSONSchema`.
    pub fn definition(&self, name: &str) -> Option<SchemaId> {
        self.components.schema(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &str> {
        self.components
            .schemas
            .iter()
            .flat_map(|schemas| schemas.keys())
            .map(String::as_str)
    }

    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    pub fn validator(&self) -> SchemaValidator<'_> {
        SchemaValidator::new(&self.arena, Some(&self.components))
    }
}

fn load(source: &str) -> Result<MetaSchema, String> {
    let value: Value = serde_json::from_str(source).map_err(|e| e.to_string())?;
    let root_name = value
        .get("root")
        .and_then(Value::as_str)
        .ok_or("missing `root` definition name")?;
    let Some(Value::Object(schemas)) = value.pointer("/components/schemas") else {
        return Err("missing `components.schemas`".to_string());
    };

    let mut arena = SchemaArena::new();
    let mut components = Components::new();
    let mut diagnostics = Diagnostics::new();
    for (name, schema) in schemas {
        let origin: JsonPath = ["components", "schemas", name.as_str()].into_iter().collect();
        let id = arena.compile(schema, origin, &mut diagnostics);
        components = components.with_schema(name.clone(), id);
    }
    if !diagnostics.is_empty() {
        return Err(diagnostics.to_string());
    }

    let resolver = Resolver::new(Some(&components), &arena);
    for (_, reference) in arena.references() {
        resolver.resolve_schema(reference).map_err(|e| e.to_string())?;
    }

    let root = components
        .schema(root_name)
        .ok_or_else(|| format!("root definition `{}` does not exist", root_name))?;

    debug!(
        definitions = schemas.len(),
        nodes = arena.len(),
        "compiled OpenRPC meta-schema"
    );
    Ok(MetaSchema {
        arena,
        components,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: &Value) -> Vec<(String, String)> {
        let meta = meta_schema().unwrap();
        meta.validator()
            .collect(meta.root(), value, JsonPath::root())
            .unwrap()
            .iter()
            .map(|d| (d.path.to_string(), d.rule.clone()))
            .collect()
    }

    fn minimal() -> Value {
        json!({
            "openrpc": "1.3.2",
            "info": {"title": "calc", "version": "1.0.0"},
            "methods": []
        })
    }

    #[test]
    fn test_embedded_meta_schema_loads() {
        let meta = meta_schema().unwrap();
        assert!(meta.definition("methodObject").is_some());
        assert!(meta.definition("JSONSchema").is_some());
        assert!(meta.definitions().any(|name| name == "openrpcDocument"));
    }

    #[test]
    fn test_minimal_document_passes() {
        assert!(rules(&minimal()).is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected_extensions_allowed() {
        let mut document = minimal();
        document["x-vendor"] = json!({"anything": true});
        assert!(rules(&document).is_empty());

        document["bogus"] = json!(1);
        assert_eq!(
            rules(&document),
            vec![("$".to_string(), "additionalProperties".to_string())]
        );
    }

    #[test]
    fn test_openrpc_version_pattern() {
        let mut document = minimal();
        document["openrpc"] = json!("2.0");
        assert_eq!(
            rules(&document),
            vec![("$.openrpc".to_string(), "pattern".to_string())]
        );
    }

    #[test]
    fn test_union_slots_accept_references() {
        let mut document = minimal();
        document["methods"] = json!([{
            "name": "add",
            "params": [
                {"$ref": "#/components/contentDescriptors/A"},
                {"name": "b", "schema": {"type": "integer"}}
            ],
            "result": {"name": "sum", "schema": true}
        }]);
        assert!(rules(&document).is_empty());

        document["methods"][0]["params"][1] = json!({"name": "b"});
        assert_eq!(
            rules(&document),
            vec![("$.methods[0].params[1]".to_string(), "required".to_string())]
        );
    }

    #[test]
    fn test_schema_keywords_are_checked() {
        let mut document = minimal();
        document["components"] = json!({
            "schemas": {"Bad": {"type": "integer", "minimum": "zero", "multipleOf": 0}}
        });
        let found = rules(&document);
        assert!(found.contains(&(
            "$.components.schemas.Bad.minimum".to_string(),
            "type".to_string()
        )));
        assert!(found.contains(&(
            "$.components.schemas.Bad.multipleOf".to_string(),
            "exclusiveMinimum".to_string()
        )));
    }
}
