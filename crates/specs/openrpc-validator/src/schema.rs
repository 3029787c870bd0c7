//! JSON Schema (draft-07) nodes stored in an arena.
//!
//! A schema contains schemas. Rather than nesting owning boxes, every node
//! lives in a [`SchemaArena`] and refers to its children by [`SchemaId`].
//! Component schemas are shared by id, and dropping the arena frees the
//! whole graph at once regardless of depth.

use crate::diagnostic::{Diagnostic, Diagnostics, JsonPath};
use crate::number;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Index of a node inside a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SchemaId(u32);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive kinds accepted by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SimpleType {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// "integer" accepts any number with a zero fractional part.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Null, Value::Null) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => number::is_integer(n),
            (Self::String, Value::String(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    /// The most specific kind of a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if number::is_integer(n) => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled `pattern` or `patternProperties` key.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored search.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    /// One schema for every element.
    Single(SchemaId),
    /// Positional schemas; `additionalItems` covers the rest.
    Tuple(Vec<SchemaId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    Required(Vec<String>),
    Schema(SchemaId),
}

/// The keyword set of an object-shaped schema. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaObject {
    // identity
    pub id: Option<String>,
    pub schema: Option<String>,
    pub reference: Option<String>,
    pub comment: Option<String>,

    // metadata
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub read_only: Option<bool>,
    pub examples: Option<Vec<Value>>,

    // numbers
    pub multiple_of: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub minimum: Option<Number>,
    pub exclusive_minimum: Option<Number>,

    // strings
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<Pattern>,

    // arrays
    pub items: Option<Items>,
    pub additional_items: Option<SchemaId>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub contains: Option<SchemaId>,

    // objects
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub required: Option<Vec<String>>,
    pub properties: Option<BTreeMap<String, SchemaId>>,
    pub pattern_properties: Option<Vec<(Pattern, SchemaId)>>,
    pub additional_properties: Option<SchemaId>,
    pub dependencies: Option<BTreeMap<String, Dependency>>,
    pub property_names: Option<SchemaId>,
    pub definitions: Option<BTreeMap<String, SchemaId>>,

    // values
    pub const_value: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub types: Option<Vec<SimpleType>>,

    // conditionals and combinators
    pub if_schema: Option<SchemaId>,
    pub then_schema: Option<SchemaId>,
    pub else_schema: Option<SchemaId>,
    pub all_of: Option<Vec<SchemaId>>,
    pub any_of: Option<Vec<SchemaId>>,
    pub one_of: Option<Vec<SchemaId>>,
    pub not: Option<SchemaId>,

    // content hints
    pub format: Option<String>,
    pub content_media_type: Option<String>,
    pub content_encoding: Option<String>,
}

impl SchemaObject {
    /// True when any keyword besides `$ref` and the annotations is present.
    pub fn has_assertions(&self) -> bool {
        self.multiple_of.is_some()
            || self.maximum.is_some()
            || self.exclusive_maximum.is_some()
            || self.minimum.is_some()
            || self.exclusive_minimum.is_some()
            || self.max_length.is_some()
            || self.min_length.is_some()
            || self.pattern.is_some()
            || self.items.is_some()
            || self.additional_items.is_some()
            || self.max_items.is_some()
            || self.min_items.is_some()
            || self.unique_items.is_some()
            || self.contains.is_some()
            || self.max_properties.is_some()
            || self.min_properties.is_some()
            || self.required.is_some()
            || self.properties.is_some()
            || self.pattern_properties.is_some()
            || self.additional_properties.is_some()
            || self.dependencies.is_some()
            || self.property_names.is_some()
            || self.const_value.is_some()
            || self.enum_values.is_some()
            || self.types.is_some()
            || self.if_schema.is_some()
            || self.all_of.is_some()
            || self.any_of.is_some()
            || self.one_of.is_some()
            || self.not.is_some()
            || self.format.is_some()
    }

    /// A `$ref` with nothing else to check: one link of a reference chain.
    pub fn pure_reference(&self) -> Option<&str> {
        match &self.reference {
            Some(reference) if !self.has_assertions() => Some(reference),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `true` accepts everything, `false` nothing.
    Bool(bool),
    Object(Box<SchemaObject>),
}

impl SchemaNode {
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Bool(_) => None,
        }
    }
}

/// Owner of every schema node of a document.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
    origins: Vec<JsonPath>,
    regex_cache: HashMap<String, Pattern>,
}

impl PartialEq for SchemaArena {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.origins == other.origins
    }
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a single standalone schema into a fresh arena.
    pub fn from_value(value: &Value) -> Result<(Self, SchemaId), Diagnostics> {
        let mut arena = Self::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.compile(value, JsonPath::root(), &mut diagnostics);
        if diagnostics.is_empty() {
            Ok((arena, root))
        } else {
            Err(diagnostics.sorted())
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: SchemaId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    /// Where in the input this node was compiled from.
    pub fn origin(&self, id: SchemaId) -> Option<&JsonPath> {
        self.origins.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &SchemaNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (SchemaId(index as u32), node))
    }

    /// Every node carrying a `$ref`, in allocation order.
    pub fn references(&self) -> impl Iterator<Item = (SchemaId, &str)> {
        self.iter().filter_map(|(id, node)| {
            node.as_object()
                .and_then(|object| object.reference.as_deref())
                .map(|reference| (id, reference))
        })
    }

    pub fn alloc(&mut self, node: SchemaNode, origin: JsonPath) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.origins.push(origin);
        id
    }

    /// Compile a value into nodes of this arena.
    ///
    /// Keywords whose values have the wrong JSON type are skipped; structural
    /// problems are the meta-schema's to report. Regular expressions that do
    /// not compile are reported into `diagnostics`.
    pub fn compile(
        &mut self,
        value: &Value,
        origin: JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> SchemaId {
        match value {
            Value::Bool(b) => self.alloc(SchemaNode::Bool(*b), origin),
            Value::Object(map) => {
                let object = self.compile_object(map, &origin, diagnostics);
                self.alloc(SchemaNode::Object(Box::new(object)), origin)
            }
            _ => self.alloc(SchemaNode::Bool(true), origin),
        }
    }

    fn compile_object(
        &mut self,
        map: &Map<String, Value>,
        origin: &JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> SchemaObject {
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| match map.get(key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };
        let count = |key: &str| match map.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            _ => None,
        };
        let boolean = |key: &str| map.get(key).and_then(Value::as_bool);
        let strings = |key: &str| {
            map.get(key).and_then(Value::as_array).map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
        };

        let mut object = SchemaObject {
            id: string("$id"),
            schema: string("$schema"),
            reference: string("$ref"),
            comment: string("$comment"),
            title: string("title"),
            description: string("description"),
            default: map.get("default").cloned(),
            read_only: boolean("readOnly"),
            examples: map.get("examples").and_then(Value::as_array).cloned(),
            multiple_of: number("multipleOf"),
            maximum: number("maximum"),
            exclusive_maximum: number("exclusiveMaximum"),
            minimum: number("minimum"),
            exclusive_minimum: number("exclusiveMinimum"),
            max_length: count("maxLength"),
            min_length: count("minLength"),
            max_items: count("maxItems"),
            min_items: count("minItems"),
            unique_items: boolean("uniqueItems"),
            max_properties: count("maxProperties"),
            min_properties: count("minProperties"),
            required: strings("required"),
            const_value: map.get("const").cloned(),
            enum_values: map.get("enum").and_then(Value::as_array).cloned(),
            format: string("format"),
            content_media_type: string("contentMediaType"),
            content_encoding: string("contentEncoding"),
            ..SchemaObject::default()
        };

        object.types = match map.get("type") {
            Some(Value::String(name)) => Some(SimpleType::parse(name).into_iter().collect()),
            Some(Value::Array(names)) => Some(
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(SimpleType::parse)
                    .collect(),
            ),
            _ => None,
        };

        if let Some(Value::String(source)) = map.get("pattern") {
            object.pattern = self.pattern(source, origin.join("pattern"), diagnostics);
        }

        object.items = match map.get("items") {
            Some(Value::Array(schemas)) => {
                let path = origin.join("items");
                Some(Items::Tuple(self.compile_list(schemas, &path, diagnostics)))
            }
            Some(schema) => Some(Items::Single(self.compile(
                schema,
                origin.join("items"),
                diagnostics,
            ))),
            None => None,
        };

        object.additional_items = self.sub(map, "additionalItems", origin, diagnostics);
        object.contains = self.sub(map, "contains", origin, diagnostics);
        object.additional_properties = self.sub(map, "additionalProperties", origin, diagnostics);
        object.property_names = self.sub(map, "propertyNames", origin, diagnostics);
        object.if_schema = self.sub(map, "if", origin, diagnostics);
        object.then_schema = self.sub(map, "then", origin, diagnostics);
        object.else_schema = self.sub(map, "else", origin, diagnostics);
        object.not = self.sub(map, "not", origin, diagnostics);

        object.properties = self.sub_map(map, "properties", origin, diagnostics);
        object.definitions = self.sub_map(map, "definitions", origin, diagnostics);

        object.all_of = self.sub_list(map, "allOf", origin, diagnostics);
        object.any_of = self.sub_list(map, "anyOf", origin, diagnostics);
        object.one_of = self.sub_list(map, "oneOf", origin, diagnostics);

        if let Some(Value::Object(patterns)) = map.get("patternProperties") {
            let base = origin.join("patternProperties");
            let mut compiled = Vec::with_capacity(patterns.len());
            for (source, schema) in patterns {
                let path = base.join(source.as_str());
                let id = self.compile(schema, path.clone(), diagnostics);
                if let Some(pattern) = self.pattern(source, path, diagnostics) {
                    compiled.push((pattern, id));
                }
            }
            object.pattern_properties = Some(compiled);
        }

        if let Some(Value::Object(dependencies)) = map.get("dependencies") {
            let base = origin.join("dependencies");
            let mut compiled = BTreeMap::new();
            for (key, dependency) in dependencies {
                let dependency = match dependency {
                    Value::Array(names) => Dependency::Required(
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect(),
                    ),
                    schema => Dependency::Schema(self.compile(
                        schema,
                        base.join(key.as_str()),
                        diagnostics,
                    )),
                };
                compiled.insert(key.clone(), dependency);
            }
            object.dependencies = Some(compiled);
        }

        object
    }

    fn sub(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        origin: &JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> Option<SchemaId> {
        map.get(key)
            .map(|schema| self.compile(schema, origin.join(key), diagnostics))
    }

    fn sub_map(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        origin: &JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> Option<BTreeMap<String, SchemaId>> {
        let Some(Value::Object(entries)) = map.get(key) else {
            return None;
        };
        let base = origin.join(key);
        Some(
            entries
                .iter()
                .map(|(name, schema)| {
                    let id = self.compile(schema, base.join(name.as_str()), diagnostics);
                    (name.clone(), id)
                })
                .collect(),
        )
    }

    fn sub_list(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        origin: &JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> Option<Vec<SchemaId>> {
        let Some(Value::Array(schemas)) = map.get(key) else {
            return None;
        };
        Some(self.compile_list(schemas, &origin.join(key), diagnostics))
    }

    fn compile_list(
        &mut self,
        schemas: &[Value],
        base: &JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> Vec<SchemaId> {
        schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| self.compile(schema, base.join(index), diagnostics))
            .collect()
    }

    fn pattern(
        &mut self,
        source: &str,
        path: JsonPath,
        diagnostics: &mut Diagnostics,
    ) -> Option<Pattern> {
        if let Some(pattern) = self.regex_cache.get(source) {
            return Some(pattern.clone());
        }
        match Pattern::new(source) {
            Ok(pattern) => {
                self.regex_cache.insert(source.to_string(), pattern.clone());
                Some(pattern)
            }
            Err(err) => {
                diagnostics.push(Diagnostic::schema(
                    path,
                    "pattern",
                    format!("invalid regular expression `{}`: {}", source, err),
                ));
                None
            }
        }
    }
}
