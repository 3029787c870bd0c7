//! Builds a typed [`OpenRpcDocument`] from a parsed value tree.
//!
//! The assembler never stops at the first problem. Every stage appends to
//! one diagnostic list, and the document is returned only when that list
//! ends up empty.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, JsonPath};
use crate::document::OpenRpcDocument;
use crate::error::{OpenRpcError, OpenRpcResult};
use crate::extensions;
use crate::format::FormatRegistry;
use crate::meta_schema::meta_schema;
use crate::options::{ReferenceSiblings, ValidatorOptions};
use crate::or_reference::{disambiguate, Shape};
use crate::schema::SchemaArena;
use crate::{
    version, Component, Components, ContentDescriptor, ErrorObject, Example, ExamplePairing,
    Info, Link, Method, OrReference, ParamStructure, Reference, Server, Tag,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fields without which a value is not an OpenRPC document.
const REQUIRED_FIELDS: [&str; 3] = ["openrpc", "info", "methods"];

/// Turns a value tree into an [`OpenRpcDocument`].
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    options: ValidatorOptions,
    formats: Option<FormatRegistry>,
    cancel: Option<CancellationToken>,
}

/// Assemble with default options.
pub fn assemble(root: &Value) -> OpenRpcResult<OpenRpcDocument> {
    Assembler::new().assemble(root)
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Format checks used by the meta-schema pass.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Some(formats);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Build and check a document.
    ///
    /// Fails with [`OpenRpcError::Invalid`] carrying every diagnostic found,
    /// sorted by path, or with [`OpenRpcError::Cancelled`].
    pub fn assemble(&self, root: &Value) -> OpenRpcResult<OpenRpcDocument> {
        let Value::Object(map) = root else {
            return Err(OpenRpcError::Invalid(Diagnostics::from(vec![
                Diagnostic::schema(
                    JsonPath::root(),
                    "type",
                    "an OpenRPC document must be an object",
                ),
            ])));
        };

        debug!(
            methods = map.get("methods").and_then(|methods| methods.as_array()).map_or(0, Vec::len),
            "assembling OpenRPC document"
        );

        let mut build = Build {
            assembler: self,
            diagnostics: Diagnostics::new(),
            arena: SchemaArena::new(),
        };

        for field in REQUIRED_FIELDS {
            if !map.contains_key(field) {
                build.diagnostics.push(Diagnostic::missing_field(
                    JsonPath::root().join(field),
                    "required",
                    field,
                ));
            }
        }

        if self.options.meta_schema {
            build.meta_schema_pass(root)?;
        }

        let mut document = build.document(map)?;

        if let Err(unresolved) = document.resolve_references() {
            build.diagnostics.extend(unresolved);
        }
        build.check_invariants(&document);

        let diagnostics = build.diagnostics.sorted();
        debug!(
            methods = document.methods.len(),
            components = document.components.as_ref().map_or(0, Components::len),
            schemas = document.schemas.len(),
            diagnostics = diagnostics.len(),
            "assembly finished"
        );

        if diagnostics.is_empty() {
            Ok(document)
        } else {
            Err(OpenRpcError::Invalid(diagnostics))
        }
    }

    fn check_cancelled(&self) -> OpenRpcResult<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                debug!("document assembly cancelled");
                Err(OpenRpcError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

/// State of one `assemble` call.
struct Build<'a> {
    assembler: &'a Assembler,
    diagnostics: Diagnostics,
    arena: SchemaArena,
}

impl Build<'_> {
    fn options(&self) -> &ValidatorOptions {
        &self.assembler.options
    }

    fn meta_schema_pass(&mut self, root: &Value) -> OpenRpcResult<()> {
        let meta = meta_schema()?;
        let mut validator = meta.validator().with_options(self.options().clone());
        if let Some(formats) = &self.assembler.formats {
            validator = validator.with_formats(formats.clone());
        }
        if let Some(token) = &self.assembler.cancel {
            validator = validator.with_cancellation(token.clone());
        }

        let found = validator.collect(meta.root(), root, JsonPath::root())?;
        // Root-level `required` failures are already reported as missing fields.
        self.diagnostics.extend(
            found
                .into_iter()
                .filter(|d| !(d.path.is_root() && d.rule == "required")),
        );
        Ok(())
    }

    fn document(&mut self, map: &Map<String, Value>) -> OpenRpcResult<OpenRpcDocument> {
        let root = JsonPath::root();

        let components = match map.get("components") {
            Some(Value::Object(components)) => Some(self.components(components)),
            Some(_) => {
                self.structure(&root.join("components"), "`components` must be an object");
                None
            }
            None => None,
        };

        let openrpc = match map.get("openrpc") {
            Some(Value::String(openrpc)) => {
                if !self.options().meta_schema && !version::is_supported(openrpc) {
                    self.diagnostics.push(Diagnostic::schema(
                        root.join("openrpc"),
                        "pattern",
                        format!("unsupported OpenRPC version `{}`", openrpc),
                    ));
                }
                openrpc.clone()
            }
            Some(_) => {
                self.structure(&root.join("openrpc"), "`openrpc` must be a string");
                String::new()
            }
            None => String::new(),
        };

        let info = match map.get("info") {
            Some(info) => self.deserialize::<Info>(info, &root.join("info")),
            None => None,
        };

        let mut document =
            OpenRpcDocument::new(openrpc, info.unwrap_or_else(|| Info::new("", "")));
        document.components = components;
        document.external_docs = map
            .get("externalDocs")
            .and_then(|docs| self.deserialize(docs, &root.join("externalDocs")));
        document.servers = map
            .get("servers")
            .and_then(|servers| self.servers(servers, &root.join("servers")));
        document.schema_uri = map.get("$schema").and_then(Value::as_str).map(str::to_string);
        document.extensions = extensions::collect(map);

        match map.get("methods") {
            Some(Value::Array(methods)) => {
                let base = root.join("methods");
                for (index, method) in methods.iter().enumerate() {
                    self.assembler.check_cancelled()?;
                    let path = base.join(index);
                    if let Some(slot) = self.slot(method, &path, Self::method) {
                        document.methods.push(slot);
                    }
                }
            }
            Some(_) => self.structure(&root.join("methods"), "`methods` must be an array"),
            None => {}
        }

        document.schemas = std::mem::take(&mut self.arena);
        Ok(document)
    }

    fn components(&mut self, map: &Map<String, Value>) -> Components {
        let base = JsonPath::root().join("components");
        let mut components = Components::new();

        if let Some(Value::Object(schemas)) = map.get("schemas") {
            let path = base.join("schemas");
            for (name, schema) in schemas {
                let id = self
                    .arena
                    .compile(schema, path.join(name.as_str()), &mut self.diagnostics);
                components = components.with_schema(name.clone(), id);
            }
        }

        self.table::<Link>(map, &base, &mut components, Self::deserialize);
        self.table::<ErrorObject>(map, &base, &mut components, Self::deserialize);
        self.table::<Example>(map, &base, &mut components, Self::deserialize);
        self.table::<ContentDescriptor>(map, &base, &mut components, Self::content_descriptor);
        self.table::<Tag>(map, &base, &mut components, Self::deserialize);
        self.table::<ExamplePairing>(map, &base, &mut components, Self::example_pairing);

        components.extensions = extensions::collect(map);
        components
    }

    fn table<T: Component>(
        &mut self,
        map: &Map<String, Value>,
        base: &JsonPath,
        components: &mut Components,
        build: fn(&mut Self, &Value, &JsonPath) -> Option<T>,
    ) {
        let key = T::KIND.key();
        let Some(Value::Object(entries)) = map.get(key) else {
            return;
        };
        let path = base.join(key);
        for (name, entry) in entries {
            if let Some(slot) = self.slot(entry, &path.join(name.as_str()), build) {
                components.insert(name.clone(), slot);
            }
        }
    }

    /// Fill an X-or-Reference slot. The `$ref` check comes before any field
    /// of X is read.
    fn slot<T>(
        &mut self,
        value: &Value,
        path: &JsonPath,
        build: fn(&mut Self, &Value, &JsonPath) -> Option<T>,
    ) -> Option<OrReference<T>> {
        match disambiguate(value) {
            Shape::Reference {
                reference,
                extra_keys,
            } => {
                self.reference_siblings(path, &extra_keys);
                Some(OrReference::pending(Reference::new(reference)))
            }
            Shape::Concrete(value) => build(self, value, path).map(OrReference::concrete),
        }
    }

    fn reference_siblings(&mut self, path: &JsonPath, extra_keys: &[&str]) {
        if extra_keys.is_empty() {
            return;
        }
        match self.options().reference_siblings {
            ReferenceSiblings::Tolerate => {
                warn!(path = %path, keys = ?extra_keys, "reference object carries sibling keys; they are ignored");
            }
            ReferenceSiblings::Reject => self.diagnostics.push(Diagnostic::schema(
                path.clone(),
                "$ref",
                format!(
                    "a reference object must contain only `$ref`, found {}",
                    extra_keys.join(", ")
                ),
            )),
        }
    }

    /// Report a construction failure unless an earlier pass already
    /// explained the problem at or below `path`.
    fn structure(&mut self, path: &JsonPath, message: impl Into<String>) {
        if !self.diagnostics.has_within(path) {
            self.diagnostics
                .push(Diagnostic::schema(path.clone(), "structure", message));
        }
    }

    fn deserialize<T: DeserializeOwned>(&mut self, value: &Value, path: &JsonPath) -> Option<T> {
        match serde_json::from_value(value.clone()) {
            Ok(built) => Some(built),
            Err(err) => {
                self.structure(path, err.to_string());
                None
            }
        }
    }

    fn servers(&mut self, value: &Value, path: &JsonPath) -> Option<Vec<Server>> {
        let Value::Array(servers) = value else {
            self.structure(path, "`servers` must be an array");
            return None;
        };
        Some(
            servers
                .iter()
                .enumerate()
                .filter_map(|(index, server)| self.deserialize(server, &path.join(index)))
                .collect(),
        )
    }

    fn list<T>(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &JsonPath,
        build: fn(&mut Self, &Value, &JsonPath) -> Option<T>,
    ) -> Vec<OrReference<T>> {
        let Some(value) = map.get(key) else {
            return Vec::new();
        };
        let path = path.join(key);
        let Value::Array(items) = value else {
            self.structure(&path, format!("`{}` must be an array", key));
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.slot(item, &path.join(index), build))
            .collect()
    }

    fn example_pairing(&mut self, value: &Value, path: &JsonPath) -> Option<ExamplePairing> {
        if let Some(Value::Array(params)) = value.get("params") {
            for (index, param) in params.iter().enumerate() {
                if let Shape::Reference { extra_keys, .. } = disambiguate(param) {
                    self.reference_siblings(&path.join("params").join(index), &extra_keys);
                }
            }
        }
        if let Some(Shape::Reference { extra_keys, .. }) = value.get("result").map(disambiguate) {
            self.reference_siblings(&path.join("result"), &extra_keys);
        }
        self.deserialize(value, path)
    }

    fn content_descriptor(&mut self, value: &Value, path: &JsonPath) -> Option<ContentDescriptor> {
        let Value::Object(map) = value else {
            self.structure(path, "a content descriptor must be an object");
            return None;
        };
        let Some(name) = map.get("name").and_then(Value::as_str) else {
            self.structure(path, "missing string field `name`");
            return None;
        };
        let Some(schema) = map.get("schema") else {
            self.structure(path, "missing field `schema`");
            return None;
        };
        let schema = self
            .arena
            .compile(schema, path.join("schema"), &mut self.diagnostics);

        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Some(
            ContentDescriptor::builder()
                .name(name.to_string())
                .schema(schema)
                .maybe_summary(string("summary"))
                .maybe_description(string("description"))
                .maybe_required(map.get("required").and_then(Value::as_bool))
                .maybe_deprecated(map.get("deprecated").and_then(Value::as_bool))
                .extensions(extensions::collect(map))
                .build(),
        )
    }

    fn method(&mut self, value: &Value, path: &JsonPath) -> Option<Method> {
        let Value::Object(map) = value else {
            self.structure(path, "a method must be an object");
            return None;
        };
        let Some(name) = map.get("name").and_then(Value::as_str) else {
            self.structure(path, "missing string field `name`");
            return None;
        };

        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let summary = string("summary");
        let description = string("description");

        let tags = self.list(map, "tags", path, Self::deserialize::<Tag>);
        let params = self.list(map, "params", path, Self::content_descriptor);
        let result = map
            .get("result")
            .and_then(|result| self.slot(result, &path.join("result"), Self::content_descriptor));
        let errors = self.list(map, "errors", path, Self::deserialize::<ErrorObject>);
        let links = self.list(map, "links", path, Self::deserialize::<Link>);
        let examples = self.list(map, "examples", path, Self::example_pairing);

        let servers = map
            .get("servers")
            .and_then(|servers| self.servers(servers, &path.join("servers")));
        let external_docs = map
            .get("externalDocs")
            .and_then(|docs| self.deserialize(docs, &path.join("externalDocs")));
        let param_structure = map.get("paramStructure").and_then(|structure| {
            self.deserialize::<ParamStructure>(structure, &path.join("paramStructure"))
        });

        Some(
            Method::builder()
                .name(name.to_string())
                .tags(tags)
                .maybe_summary(summary)
                .maybe_description(description)
                .maybe_external_docs(external_docs)
                .params(params)
                .maybe_result(result)
                .maybe_deprecated(map.get("deprecated").and_then(Value::as_bool))
                .maybe_servers(servers)
                .errors(errors)
                .links(links)
                .maybe_param_structure(param_structure)
                .examples(examples)
                .extensions(extensions::collect(map))
                .build(),
        )
    }

    fn check_invariants(&mut self, document: &OpenRpcDocument) {
        let methods_path = JsonPath::root().join("methods");
        let mut names: HashMap<&str, usize> = HashMap::new();

        for (index, slot) in document.methods.iter().enumerate() {
            let Some(method) = slot.get() else {
                continue;
            };
            let path = methods_path.join(index);

            if let Some(first) = names.get(method.name.as_str()) {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateIdentifier,
                    path.join("name"),
                    "uniqueMethodNames",
                    format!(
                        "method `{}` is already defined at methods[{}]",
                        method.name, first
                    ),
                ));
            } else {
                names.insert(&method.name, index);
            }

            self.unique_error_codes(method, &path);
            self.unique_param_names(method, &path);

            for position in method.misplaced_required_params() {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ParamOrderingViolation,
                    path.join("params").join(position),
                    "paramOrdering",
                    "a required param may not follow an optional one",
                ));
            }

            for (position, server) in method.servers.iter().flatten().enumerate() {
                self.server_variables(server, &path.join("servers").join(position));
            }
            for (position, link) in method.links.iter().enumerate() {
                if let OrReference::Concrete(link) = link {
                    if let Some(server) = &link.server {
                        self.server_variables(
                            server,
                            &path.join("links").join(position).join("server"),
                        );
                    }
                }
            }
        }

        for (index, server) in document.servers().iter().enumerate() {
            self.server_variables(server, &JsonPath::root().join("servers").join(index));
        }

        let links = document
            .components
            .as_ref()
            .and_then(|components| components.links.as_ref());
        for (name, entry) in links.into_iter().flatten() {
            if let OrReference::Concrete(link) = entry {
                if let Some(server) = &link.server {
                    let path: JsonPath = ["components", "links", name.as_str(), "server"]
                        .into_iter()
                        .collect();
                    self.server_variables(server, &path);
                }
            }
        }
    }

    fn unique_error_codes(&mut self, method: &Method, path: &JsonPath) {
        let mut seen: HashMap<i64, usize> = HashMap::new();
        for (position, error) in method.errors.iter().enumerate() {
            let Some(error) = error.get() else {
                continue;
            };
            if let Some(first) = seen.get(&error.code) {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateIdentifier,
                    path.join("errors").join(position),
                    "uniqueErrorCodes",
                    format!(
                        "error code {} is already used by errors[{}] of `{}`",
                        error.code, first, method.name
                    ),
                ));
            } else {
                seen.insert(error.code, position);
            }
        }
    }

    fn unique_param_names(&mut self, method: &Method, path: &JsonPath) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, param) in method.params.iter().enumerate() {
            let Some(param) = param.get() else {
                continue;
            };
            if let Some(first) = seen.get(param.name.as_str()) {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateIdentifier,
                    path.join("params").join(position),
                    "uniqueParamNames",
                    format!(
                        "param `{}` is already declared at params[{}]",
                        param.name, first
                    ),
                ));
            } else {
                seen.insert(&param.name, position);
            }
        }
    }

    fn server_variables(&mut self, server: &Server, path: &JsonPath) {
        for name in server.undeclared_variables() {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingRequiredField,
                path.join("variables").join(name),
                "serverVariables",
                format!("`{{{}}}` appears in the url but is not declared in `variables`", name),
            ));
        }
    }
}
