//! Recursive-descent JSON Schema validator.
//!
//! Every keyword of a node is evaluated independently and every failure is
//! collected, so one run reports all problems found. Only conditional and
//! combinator keywords evaluate sub-schemas silently, and they report a
//! single failure of their own.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, JsonPath, PathSegment};
use crate::error::{OpenRpcError, OpenRpcResult};
use crate::format::FormatRegistry;
use crate::number;
use crate::options::{FormatMode, RefSiblings, ValidatorOptions};
use crate::resolver::Resolver;
use crate::schema::{Dependency, Items, SchemaArena, SchemaId, SchemaNode, SchemaObject, SimpleType};
use crate::Components;
use once_cell::sync::Lazy;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static NO_FORMATS: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::new);
static BUILTIN_FORMATS: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::with_builtin);

/// Validates values against the schemas of one arena.
#[derive(Debug, Clone)]
pub struct SchemaValidator<'a> {
    arena: &'a SchemaArena,
    resolver: Resolver<'a>,
    options: ValidatorOptions,
    formats: Option<FormatRegistry>,
    cancel: Option<CancellationToken>,
}

/// Per-run state. Nothing here outlives a single `collect` call.
struct Run {
    /// (schema, instance address) pairs currently entered through `$ref`.
    active: HashSet<(SchemaId, usize)>,
    depth: usize,
    cancelled: bool,
}

impl<'a> SchemaValidator<'a> {
    /// `components` is where `$ref` pointers are resolved.
    pub fn new(arena: &'a SchemaArena, components: Option<&'a Components>) -> Self {
        Self {
            arena,
            resolver: Resolver::new(components, arena),
            options: ValidatorOptions::default(),
            formats: None,
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Use this registry instead of the one selected by the options.
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

    fn formats(&self) -> &FormatRegistry {
        match (&self.formats, self.options.formats) {
            (Some(formats), _) => formats,
            (None, FormatMode::Builtin) => &BUILTIN_FORMATS,
            (None, FormatMode::Annotate) => &NO_FORMATS,
        }
    }

    /// `Ok(())` when `value` satisfies `schema`, otherwise every failure
    /// sorted by path.
    pub fn validate(&self, schema: SchemaId, value: &Value) -> OpenRpcResult<()> {
        let diagnostics = self.collect(schema, value, JsonPath::root())?;
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(OpenRpcError::Invalid(diagnostics))
        }
    }

    /// All failures of `value` against `schema`, with paths rooted at `base`.
    /// Fails only when cancelled.
    pub fn collect(
        &self,
        schema: SchemaId,
        value: &Value,
        base: JsonPath,
    ) -> OpenRpcResult<Diagnostics> {
        let mut run = Run {
            active: HashSet::new(),
            depth: 0,
            cancelled: false,
        };
        let mut path = base;
        let mut out = Vec::new();
        self.node(&mut run, schema, value, &mut path, &mut out);

        if run.cancelled {
            debug!("schema validation cancelled");
            return Err(OpenRpcError::Cancelled);
        }
        Ok(Diagnostics::from(out).sorted())
    }

    /// True when `value` satisfies `schema`; failures are discarded.
    pub fn is_valid(&self, schema: SchemaId, value: &Value) -> bool {
        matches!(self.collect(schema, value, JsonPath::root()), Ok(d) if d.is_empty())
    }

    fn node(
        &self,
        run: &mut Run,
        id: SchemaId,
        value: &Value,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        if run.cancelled {
            return;
        }
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            run.cancelled = true;
            return;
        }
        let Some(node) = self.arena.get(id) else {
            return;
        };
        if run.depth >= self.options.max_depth {
            out.push(Diagnostic::schema(
                path.clone(),
                "maxDepth",
                format!("schema nesting exceeds {} levels", self.options.max_depth),
            ));
            return;
        }

        run.depth += 1;
        match node {
            SchemaNode::Bool(true) => {}
            SchemaNode::Bool(false) => {
                out.push(Diagnostic::schema(path.clone(), "false", "no value is allowed here"))
            }
            SchemaNode::Object(schema) => self.object(run, schema, value, path, out),
        }
        run.depth -= 1;
    }

    /// Evaluate without reporting.
    fn passes(&self, run: &mut Run, id: SchemaId, value: &Value, path: &mut JsonPath) -> bool {
        let mut scratch = Vec::new();
        self.node(run, id, value, path, &mut scratch);
        scratch.is_empty()
    }

    fn child(
        &self,
        run: &mut Run,
        id: SchemaId,
        value: &Value,
        path: &mut JsonPath,
        segment: impl Into<PathSegment>,
        out: &mut Vec<Diagnostic>,
    ) {
        path.push(segment);
        self.node(run, id, value, path, out);
        path.pop();
    }

    fn object(
        &self,
        run: &mut Run,
        schema: &SchemaObject,
        value: &Value,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        if let Some(reference) = &schema.reference {
            self.reference(run, reference, value, path, out);
            if self.options.ref_siblings == RefSiblings::Ignore {
                return;
            }
        }

        self.value_keywords(schema, value, path, out);
        match value {
            Value::Number(n) => self.numeric(schema, n, path, out),
            Value::String(s) => self.string(schema, s, path, out),
            Value::Array(items) => self.array(run, schema, items, path, out),
            Value::Object(map) => self.properties(run, schema, value, map, path, out),
            _ => {}
        }

        if let Some(format) = &schema.format {
            if let Err(message) = self.formats().check(format, value) {
                out.push(Diagnostic::schema(path.clone(), "format", message));
            }
        }

        self.conditional(run, schema, value, path, out);
        self.combinators(run, schema, value, path, out);
    }

    fn reference(
        &self,
        run: &mut Run,
        reference: &str,
        value: &Value,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        let target = match self.resolver.resolve_schema(reference) {
            Ok(target) => target,
            Err(err) => {
                out.push(err.into_diagnostic(path.clone()));
                return;
            }
        };

        let key = (target, value as *const Value as usize);
        if !run.active.insert(key) {
            out.push(Diagnostic::new(
                DiagnosticKind::ReferenceCycle,
                path.clone(),
                "$ref",
                format!("`{}` re-enters itself without consuming any input", reference),
            ));
            return;
        }
        self.node(run, target, value, path, out);
        run.active.remove(&key);
    }

    fn value_keywords(
        &self,
        schema: &SchemaObject,
        value: &Value,
        path: &JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        if let Some(types) = &schema.types {
            if !types.iter().any(|t| t.matches(value)) {
                let expected: Vec<_> = types.iter().map(|t| t.as_str()).collect();
                out.push(Diagnostic::schema(
                    path.clone(),
                    "type",
                    format!(
                        "expected {}, found {}",
                        expected.join(" or "),
                        SimpleType::of(value)
                    ),
                ));
            }
        }

        if let Some(values) = &schema.enum_values {
            if !values.iter().any(|candidate| number::json_eq(candidate, value)) {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "enum",
                    format!("{} is not one of the allowed values", value),
                ));
            }
        }

        if let Some(expected) = &schema.const_value {
            if !number::json_eq(expected, value) {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "const",
                    format!("expected {}, found {}", expected, value),
                ));
            }
        }
    }

    fn numeric(
        &self,
        schema: &SchemaObject,
        n: &Number,
        path: &JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        let mut fail = |keyword: &str, message: String| {
            out.push(Diagnostic::schema(path.clone(), keyword, message));
        };

        if let Some(divisor) = &schema.multiple_of {
            if !number::is_multiple_of(n, divisor) {
                fail("multipleOf", format!("{} is not a multiple of {}", n, divisor));
            }
        }
        if let Some(limit) = &schema.maximum {
            if number::compare(n, limit) == Some(Ordering::Greater) {
                fail("maximum", format!("{} is greater than {}", n, limit));
            }
        }
        if let Some(limit) = &schema.exclusive_maximum {
            if number::compare(n, limit) != Some(Ordering::Less) {
                fail("exclusiveMaximum", format!("{} is not less than {}", n, limit));
            }
        }
        if let Some(limit) = &schema.minimum {
            if number::compare(n, limit) == Some(Ordering::Less) {
                fail("minimum", format!("{} is less than {}", n, limit));
            }
        }
        if let Some(limit) = &schema.exclusive_minimum {
            if number::compare(n, limit) != Some(Ordering::Greater) {
                fail("exclusiveMinimum", format!("{} is not greater than {}", n, limit));
            }
        }
    }

    fn string(&self, schema: &SchemaObject, s: &str, path: &JsonPath, out: &mut Vec<Diagnostic>) {
        let length = s.chars().count() as u64;
        if let Some(max) = schema.max_length {
            if length > max {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "maxLength",
                    format!("length {} exceeds {}", length, max),
                ));
            }
        }
        if let Some(min) = schema.min_length {
            if length < min {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "minLength",
                    format!("length {} is below {}", length, min),
                ));
            }
        }
        if let Some(pattern) = &schema.pattern {
            if !pattern.is_match(s) {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "pattern",
                    format!("`{}` does not match `{}`", s, pattern.as_str()),
                ));
            }
        }
    }

    fn array(
        &self,
        run: &mut Run,
        schema: &SchemaObject,
        items: &[Value],
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        match &schema.items {
            Some(Items::Single(id)) => {
                for (index, item) in items.iter().enumerate() {
                    self.child(run, *id, item, path, index, out);
                }
            }
            Some(Items::Tuple(ids)) => {
                for (index, (item, id)) in items.iter().zip(ids).enumerate() {
                    self.child(run, *id, item, path, index, out);
                }
                if let Some(additional) = schema.additional_items {
                    for (index, item) in items.iter().enumerate().skip(ids.len()) {
                        if self.is_false(additional) {
                            out.push(Diagnostic::schema(
                                path.clone(),
                                "additionalItems",
                                format!(
                                    "item {} is beyond the {} positional schemas",
                                    index,
                                    ids.len()
                                ),
                            ));
                        } else {
                            self.child(run, additional, item, path, index, out);
                        }
                    }
                }
            }
            None => {}
        }

        let count = items.len() as u64;
        if let Some(max) = schema.max_items {
            if count > max {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "maxItems",
                    format!("{} items exceed the maximum of {}", count, max),
                ));
            }
        }
        if let Some(min) = schema.min_items {
            if count < min {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "minItems",
                    format!("{} items are below the minimum of {}", count, min),
                ));
            }
        }

        if schema.unique_items == Some(true) {
            for (later, item) in items.iter().enumerate() {
                if let Some(earlier) = items[..later]
                    .iter()
                    .position(|other| number::json_eq(other, item))
                {
                    out.push(Diagnostic::schema(
                        path.clone(),
                        "uniqueItems",
                        format!("items {} and {} are equal", earlier, later),
                    ));
                }
            }
        }

        if let Some(contains) = schema.contains {
            let mut found = false;
            for (index, item) in items.iter().enumerate() {
                path.push(index);
                found = self.passes(run, contains, item, path);
                path.pop();
                if found {
                    break;
                }
            }
            if !found {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "contains",
                    "no item matches the `contains` schema",
                ));
            }
        }
    }

    fn properties(
        &self,
        run: &mut Run,
        schema: &SchemaObject,
        value: &Value,
        map: &Map<String, Value>,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        for (key, child) in map {
            let mut matched = false;

            if let Some(id) = schema.properties.as_ref().and_then(|p| p.get(key)) {
                matched = true;
                self.child(run, *id, child, path, key.as_str(), out);
            }
            for (pattern, id) in schema.pattern_properties.iter().flatten() {
                if pattern.is_match(key) {
                    matched = true;
                    self.child(run, *id, child, path, key.as_str(), out);
                }
            }

            // Only keys matched by neither `properties` nor a pattern.
            if let (false, Some(additional)) = (matched, schema.additional_properties) {
                if self.is_false(additional) {
                    out.push(Diagnostic::schema(
                        path.clone(),
                        "additionalProperties",
                        format!("property `{}` is not allowed", key),
                    ));
                } else {
                    self.child(run, additional, child, path, key.as_str(), out);
                }
            }
        }

        for name in schema.required.iter().flatten() {
            if !map.contains_key(name) {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "required",
                    format!("missing required property `{}`", name),
                ));
            }
        }

        let count = map.len() as u64;
        if let Some(max) = schema.max_properties {
            if count > max {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "maxProperties",
                    format!("{} properties exceed the maximum of {}", count, max),
                ));
            }
        }
        if let Some(min) = schema.min_properties {
            if count < min {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "minProperties",
                    format!("{} properties are below the minimum of {}", count, min),
                ));
            }
        }

        for (key, dependency) in schema.dependencies.iter().flatten() {
            if !map.contains_key(key) {
                continue;
            }
            match dependency {
                Dependency::Required(names) => {
                    for name in names.iter().filter(|name| !map.contains_key(*name)) {
                        out.push(Diagnostic::schema(
                            path.clone(),
                            "dependencies",
                            format!("property `{}` requires `{}`", key, name),
                        ));
                    }
                }
                // Applies to the whole object, not to the triggering property.
                Dependency::Schema(id) => self.node(run, *id, value, path, out),
            }
        }

        if let Some(names) = schema.property_names {
            for key in map.keys() {
                let name = Value::String(key.clone());
                self.child(run, names, &name, path, key.as_str(), out);
            }
        }
    }

    fn conditional(
        &self,
        run: &mut Run,
        schema: &SchemaObject,
        value: &Value,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(condition) = schema.if_schema else {
            return;
        };
        let branch = if self.passes(run, condition, value, path) {
            schema.then_schema
        } else {
            schema.else_schema
        };
        if let Some(branch) = branch {
            self.node(run, branch, value, path, out);
        }
    }

    fn combinators(
        &self,
        run: &mut Run,
        schema: &SchemaObject,
        value: &Value,
        path: &mut JsonPath,
        out: &mut Vec<Diagnostic>,
    ) {
        for id in schema.all_of.iter().flatten() {
            self.node(run, *id, value, path, out);
        }

        if let Some(alternatives) = &schema.any_of {
            let matched = alternatives
                .iter()
                .any(|id| self.passes(run, *id, value, path));
            if !matched {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "anyOf",
                    format!(
                        "value matches none of the {} alternatives",
                        alternatives.len()
                    ),
                ));
            }
        }

        if let Some(alternatives) = &schema.one_of {
            let matching: Vec<usize> = alternatives
                .iter()
                .enumerate()
                .filter(|(_, id)| self.passes(run, **id, value, path))
                .map(|(index, _)| index)
                .collect();
            match matching.len() {
                1 => {}
                0 => out.push(Diagnostic::schema(
                    path.clone(),
                    "oneOf",
                    format!(
                        "value matches none of the {} alternatives",
                        alternatives.len()
                    ),
                )),
                _ => out.push(Diagnostic::schema(
                    path.clone(),
                    "oneOf",
                    format!(
                        "value matches alternatives {:?}, expected exactly one",
                        matching
                    ),
                )),
            }
        }

        if let Some(negated) = schema.not {
            if self.passes(run, negated, value, path) {
                out.push(Diagnostic::schema(
                    path.clone(),
                    "not",
                    "value matches a schema it must not match",
                ));
            }
        }
    }

    fn is_false(&self, id: SchemaId) -> bool {
        matches!(self.arena.get(id), Some(SchemaNode::Bool(false)))
    }
}
