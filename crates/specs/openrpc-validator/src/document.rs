//! The OpenRPC Document: root of the typed model.

use crate::diagnostic::{Diagnostic, Diagnostics, JsonPath};
use crate::error::{OpenRpcError, OpenRpcResult, ResolveError};
use crate::resolver::Resolver;
use crate::schema::SchemaArena;
use crate::validator::SchemaValidator;
use crate::{
    Component, ComponentKind, Components, ContentDescriptor, ExamplePairing, Extensions,
    ExternalDocumentation, Info, Method, OrReference, ParamStructure, Server,
};
use serde_json::Value;
use std::sync::Arc;

/// `$schema` value assumed when a document does not declare one.
pub const DEFAULT_SCHEMA_URI: &str = "https://meta.open-rpc.org/";

/// A fully assembled OpenRPC document.
///
/// Owns the arena holding every schema of the document; content descriptors
/// and component schemas refer into it by id.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRpcDocument {
    /// Semantic version of the OpenRPC specification the document uses.
    pub openrpc: String,

    pub info: Info,

    pub external_docs: Option<ExternalDocumentation>,

    /// Connectivity information for the target servers.
    pub servers: Option<Vec<Server>>,

    pub methods: Vec<OrReference<Method>>,

    pub components: Option<Components>,

    /// The `$schema` field.
    pub schema_uri: Option<String>,

    pub extensions: Extensions,

    pub schemas: SchemaArena,
}

impl OpenRpcDocument {
    pub fn new(openrpc: impl Into<String>, info: Info) -> Self {
        Self {
            openrpc: openrpc.into(),
            info,
            external_docs: None,
            servers: None,
            methods: Vec::new(),
            components: None,
            schema_uri: None,
            extensions: Extensions::default(),
            schemas: SchemaArena::new(),
        }
    }

    /// Resolved methods, in document order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter_map(OrReference::get)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods().find(|method| method.name == name)
    }

    pub fn servers(&self) -> &[Server] {
        self.servers.as_deref().unwrap_or_default()
    }

    pub fn schema_uri(&self) -> &str {
        self.schema_uri.as_deref().unwrap_or(DEFAULT_SCHEMA_URI)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.components.as_ref(), &self.schemas)
    }

    /// A validator over this document's schemas.
    pub fn validator(&self) -> SchemaValidator<'_> {
        SchemaValidator::new(&self.schemas, self.components.as_ref())
    }

    /// True once no slot anywhere in the model still holds a bare pointer.
    pub fn is_resolved(&self) -> bool {
        let methods = self.methods.iter().all(|slot| match slot.get() {
            Some(method) => !method.has_pending(),
            None => false,
        });
        methods
            && self
                .components
                .as_ref()
                .is_none_or(|components| !components_pending(components))
    }

    /// Validate a value against a content descriptor's schema.
    pub fn validate_content(
        &self,
        descriptor: &ContentDescriptor,
        value: &Value,
    ) -> OpenRpcResult<()> {
        self.validator().validate(descriptor.schema, value)
    }

    /// Validate the `params` member of a JSON-RPC request for `method`.
    ///
    /// Positional params are checked when the method allows `by-position`,
    /// named params when it allows `by-name`. Absent params count as an
    /// empty list.
    pub fn validate_params(&self, method: &Method, params: &Value) -> OpenRpcResult<()> {
        let validator = self.validator();
        let structure = method.param_structure();
        let mut diagnostics = Diagnostics::new();

        match params {
            Value::Array(values) if structure != ParamStructure::ByName => {
                let mut expected = 0;
                for (index, descriptor) in method.params().enumerate() {
                    expected += 1;
                    let path = JsonPath::root().join(index);
                    match values.get(index) {
                        Some(value) => {
                            diagnostics.extend(validator.collect(descriptor.schema, value, path)?)
                        }
                        None if descriptor.is_required() => diagnostics.push(
                            Diagnostic::missing_field(path, "required", &descriptor.name),
                        ),
                        None => {}
                    }
                }
                if values.len() > expected {
                    diagnostics.push(Diagnostic::schema(
                        JsonPath::root(),
                        "maxItems",
                        format!("{} params given, method accepts {}", values.len(), expected),
                    ));
                }
            }
            Value::Object(map) if structure != ParamStructure::ByPosition => {
                for descriptor in method.params() {
                    let path = JsonPath::root().join(descriptor.name.as_str());
                    match map.get(&descriptor.name) {
                        Some(value) => {
                            diagnostics.extend(validator.collect(descriptor.schema, value, path)?)
                        }
                        None if descriptor.is_required() => diagnostics.push(
                            Diagnostic::missing_field(path, "required", &descriptor.name),
                        ),
                        None => {}
                    }
                }
                for key in map.keys() {
                    if !method.params().any(|descriptor| &descriptor.name == key) {
                        diagnostics.push(Diagnostic::schema(
                            JsonPath::root().join(key.as_str()),
                            "additionalProperties",
                            format!("`{}` is not a parameter of `{}`", key, method.name),
                        ));
                    }
                }
            }
            Value::Null => {
                for descriptor in method.params().filter(|d| d.is_required()) {
                    diagnostics.push(Diagnostic::missing_field(
                        JsonPath::root(),
                        "required",
                        &descriptor.name,
                    ));
                }
            }
            _ => diagnostics.push(Diagnostic::schema(
                JsonPath::root(),
                "paramStructure",
                format!(
                    "`{}` expects params {}",
                    method.name,
                    match structure {
                        ParamStructure::ByName => "by name",
                        ParamStructure::ByPosition => "by position",
                        ParamStructure::Either => "as an array or an object",
                    }
                ),
            )),
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(OpenRpcError::Invalid(diagnostics.sorted()))
        }
    }

    /// Replace every pending pointer with its target.
    ///
    /// Component tables are resolved first so that method slots receive
    /// fully resolved targets. Schema pointers stay as ids and are only
    /// checked. Running this on an already resolved document changes nothing.
    pub fn resolve_references(&mut self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();

        if let Some(components) = self.components.as_mut() {
            resolve_components(components, &self.schemas, &mut diagnostics);
        }

        let resolver = Resolver::new(self.components.as_ref(), &self.schemas);
        for (index, slot) in self.methods.iter_mut().enumerate() {
            let path = JsonPath::root().join("methods").join(index);
            match slot {
                OrReference::Pending(reference) => diagnostics.push(
                    ResolveError::dangling(
                        reference.as_str(),
                        "methods cannot be referenced; components has no methods mapping",
                    )
                    .into_diagnostic(path),
                ),
                OrReference::Concrete(method) | OrReference::Resolved { target: method, .. } => {
                    if method.has_pending() {
                        resolve_method(Arc::make_mut(method), &resolver, &path, &mut diagnostics);
                    }
                }
            }
        }

        // Sibling keywords do not break a cycle between component roots.
        for (id, reference) in self.schemas.references() {
            if let Err(err) = resolver.follow_schema_refs(reference) {
                let path = self.schemas.origin(id).cloned().unwrap_or_default();
                diagnostics.push(err.into_diagnostic(path));
            }
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(diagnostics.sorted())
        }
    }
}

fn components_pending(components: &Components) -> bool {
    fn table<T: Component>(components: &Components) -> bool {
        T::table(components)
            .into_iter()
            .flatten()
            .any(|(_, entry)| entry.is_pending())
    }
    table::<crate::Link>(components)
        || table::<crate::ErrorObject>(components)
        || table::<crate::Example>(components)
        || table::<ExamplePairing>(components)
        || table::<ContentDescriptor>(components)
        || table::<crate::Tag>(components)
        || components
            .example_pairings
            .iter()
            .flatten()
            .filter_map(|(_, entry)| entry.get())
            .any(ExamplePairing::has_pending)
}

fn resolve_components(components: &mut Components, arena: &SchemaArena, out: &mut Diagnostics) {
    // Examples first: pairings embed example slots and must see resolved targets.
    resolve_table::<crate::Example>(components, arena, out);

    let examples = Components {
        examples: components.examples.clone(),
        ..Components::default()
    };
    let resolver = Resolver::new(Some(&examples), arena);
    if let Some(pairings) = components.example_pairings.as_mut() {
        for (name, entry) in pairings.iter_mut() {
            let OrReference::Concrete(pairing) = entry else {
                continue;
            };
            if pairing.has_pending() {
                let path = table_path(ComponentKind::ExamplePairings, name);
                resolve_pairing(Arc::make_mut(pairing), &resolver, &path, out);
            }
        }
    }

    resolve_table::<ExamplePairing>(components, arena, out);
    resolve_table::<crate::Link>(components, arena, out);
    resolve_table::<crate::ErrorObject>(components, arena, out);
    resolve_table::<ContentDescriptor>(components, arena, out);
    resolve_table::<crate::Tag>(components, arena, out);
}

/// Resolve the pending entries of one table. Lookups borrow the whole index,
/// so outcomes are computed first and written back afterwards.
fn resolve_table<T: Component>(
    components: &mut Components,
    arena: &SchemaArena,
    out: &mut Diagnostics,
) {
    let outcomes: Vec<_> = {
        let resolver = Resolver::new(Some(components), arena);
        T::table(components)
            .into_iter()
            .flatten()
            .filter_map(|(name, entry)| match entry {
                OrReference::Pending(reference) => {
                    Some((name.clone(), resolver.resolve::<T>(reference)))
                }
                _ => None,
            })
            .collect()
    };

    let Some(table) = T::table_mut(components) else {
        return;
    };
    for (name, outcome) in outcomes {
        let Some(entry) = table.get_mut(&name) else {
            continue;
        };
        if let Err(err) = entry.resolve_with(|_| outcome) {
            out.push(err.into_diagnostic(table_path(T::KIND, &name)));
        }
    }
}

fn table_path(kind: ComponentKind, name: &str) -> JsonPath {
    ["components", kind.key(), name].into_iter().collect()
}

fn resolve_slot<T: Component>(
    slot: &mut OrReference<T>,
    resolver: &Resolver<'_>,
    path: JsonPath,
    out: &mut Diagnostics,
) {
    if let Err(err) = slot.resolve_with(|reference| resolver.resolve::<T>(reference)) {
        out.push(err.into_diagnostic(path));
    }
}

fn resolve_pairing(
    pairing: &mut ExamplePairing,
    resolver: &Resolver<'_>,
    base: &JsonPath,
    out: &mut Diagnostics,
) {
    let params = base.join("params");
    for (index, slot) in pairing.params.iter_mut().enumerate() {
        resolve_slot(slot, resolver, params.join(index), out);
    }
    if let Some(slot) = pairing.result.as_mut() {
        resolve_slot(slot, resolver, base.join("result"), out);
    }
}

fn resolve_method(
    method: &mut Method,
    resolver: &Resolver<'_>,
    base: &JsonPath,
    out: &mut Diagnostics,
) {
    let list = |field: &str, index: usize| base.join(field).join(index);

    for (index, slot) in method.tags.iter_mut().enumerate() {
        resolve_slot(slot, resolver, list("tags", index), out);
    }
    for (index, slot) in method.params.iter_mut().enumerate() {
        resolve_slot(slot, resolver, list("params", index), out);
    }
    if let Some(slot) = method.result.as_mut() {
        resolve_slot(slot, resolver, base.join("result"), out);
    }
    for (index, slot) in method.errors.iter_mut().enumerate() {
        resolve_slot(slot, resolver, list("errors", index), out);
    }
    for (index, slot) in method.links.iter_mut().enumerate() {
        resolve_slot(slot, resolver, list("links", index), out);
    }
    for (index, slot) in method.examples.iter_mut().enumerate() {
        if let OrReference::Concrete(pairing) = slot {
            if pairing.has_pending() {
                resolve_pairing(Arc::make_mut(pairing), resolver, &list("examples", index), out);
            }
        }
        resolve_slot(slot, resolver, list("examples", index), out);
    }
}
