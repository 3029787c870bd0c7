use openrpc_validator::{
    Components, DiagnosticKind, FormatRegistry, JsonPath, OpenRpcError, RefSiblings, SchemaArena,
    SchemaValidator, ValidatorOptions,
};
use serde_json::{Value, json};

/// (path, rule) of every failure, or an empty list when the value passes.
fn failures(schema: Value, value: Value) -> Vec<(String, String)> {
    let (arena, root) = SchemaArena::from_value(&schema).expect("schema should compile");
    SchemaValidator::new(&arena, None)
        .collect(root, &value, JsonPath::root())
        .expect("not cancelled")
        .iter()
        .map(|d| (d.path.to_string(), d.rule.clone()))
        .collect()
}

fn rules(schema: Value, value: Value) -> Vec<String> {
    failures(schema, value).into_iter().map(|(_, rule)| rule).collect()
}

fn passes(schema: Value, value: Value) -> bool {
    failures(schema, value).is_empty()
}

/// Component schemas compiled into one arena, for `$ref` tests.
fn with_components(schemas: Value) -> (SchemaArena, Components) {
    let mut arena = SchemaArena::new();
    let mut components = Components::new();
    let mut diagnostics = openrpc_validator::Diagnostics::new();
    for (name, schema) in schemas.as_object().expect("object of schemas") {
        let origin: JsonPath = ["components", "schemas", name.as_str()].into_iter().collect();
        let id = arena.compile(schema, origin, &mut diagnostics);
        components = components.with_schema(name.clone(), id);
    }
    assert!(diagnostics.is_empty());
    (arena, components)
}

#[test]
fn test_integer_accepts_whole_numbers_only() {
    let schema = json!({"type": "integer"});
    assert!(passes(schema.clone(), json!(3)));
    assert!(passes(schema.clone(), json!(3.0)));
    assert_eq!(rules(schema.clone(), json!(3.5)), vec!["type"]);
    assert_eq!(rules(schema, json!("3")), vec!["type"]);
}

#[test]
fn test_type_message_names_expected_and_found() {
    let (arena, root) = SchemaArena::from_value(&json!({"type": ["string", "null"]})).unwrap();
    let err = SchemaValidator::new(&arena, None)
        .validate(root, &json!(1.5))
        .unwrap_err();
    let diagnostics = err.diagnostics().unwrap();
    let first = diagnostics.iter().next().unwrap();
    assert_eq!(first.kind, DiagnosticKind::SchemaViolation);
    assert_eq!(first.message, "expected string or null, found number");
}

#[test]
fn test_one_of_requires_exactly_one_match() {
    let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 10}]});
    assert!(passes(schema.clone(), json!(3)));
    assert!(passes(schema.clone(), json!(10.5)));
    assert_eq!(rules(schema.clone(), json!(12)), vec!["oneOf"]);
    assert_eq!(rules(schema, json!(2.5)), vec!["oneOf"]);
}

#[test]
fn test_any_all_not() {
    let any = json!({"anyOf": [{"type": "string"}, {"type": "boolean"}]});
    assert!(passes(any.clone(), json!(true)));
    assert_eq!(rules(any, json!(1)), vec!["anyOf"]);

    let all = json!({"allOf": [{"minimum": 1}, {"maximum": 5}]});
    assert!(passes(all.clone(), json!(3)));
    assert_eq!(rules(all, json!(7)), vec!["maximum"]);

    let not = json!({"not": {"type": "null"}});
    assert!(passes(not.clone(), json!(0)));
    assert_eq!(rules(not, json!(null)), vec!["not"]);
}

#[test]
fn test_if_then_else() {
    let schema = json!({
        "if": {"properties": {"kind": {"const": "circle"}}},
        "then": {"required": ["radius"]},
        "else": {"required": ["width"]}
    });
    assert!(passes(schema.clone(), json!({"kind": "circle", "radius": 1})));
    assert!(passes(schema.clone(), json!({"kind": "square", "width": 1})));
    assert_eq!(rules(schema.clone(), json!({"kind": "circle"})), vec!["required"]);
    assert_eq!(rules(schema, json!({"kind": "square"})), vec!["required"]);

    // `if` alone never fails.
    assert!(passes(json!({"if": {"type": "string"}}), json!(1)));
}

#[test]
fn test_multiple_of_is_exact_for_decimals() {
    let schema = json!({"multipleOf": 0.1});
    assert!(passes(schema.clone(), json!(0.3)));
    assert!(passes(schema.clone(), json!(1.7)));
    assert_eq!(rules(schema, json!(0.35)), vec!["multipleOf"]);

    assert!(passes(json!({"multipleOf": 0.01}), json!(19.99)));
}

#[test]
fn test_numeric_bounds() {
    let schema = json!({"minimum": 1, "exclusiveMaximum": 10});
    assert!(passes(schema.clone(), json!(1)));
    assert!(passes(schema.clone(), json!(9.999)));
    assert_eq!(rules(schema.clone(), json!(10)), vec!["exclusiveMaximum"]);
    assert_eq!(rules(schema.clone(), json!(0.5)), vec!["minimum"]);
    // Bounds do not apply to other types.
    assert!(passes(schema, json!("100")));
}

#[test]
fn test_string_length_counts_code_points() {
    let schema = json!({"maxLength": 3, "minLength": 2});
    assert!(passes(schema.clone(), json!("héé")));
    assert!(passes(schema.clone(), json!("日本")));
    assert_eq!(rules(schema.clone(), json!("日本語!")), vec!["maxLength"]);
    assert_eq!(rules(schema, json!("é")), vec!["minLength"]);
}

#[test]
fn test_pattern_is_unanchored() {
    let schema = json!({"pattern": "b+"});
    assert!(passes(schema.clone(), json!("abbbc")));
    assert_eq!(rules(schema, json!("ac")), vec!["pattern"]);
}

#[test]
fn test_tuple_items_and_additional_items() {
    let schema = json!({
        "items": [{"type": "string"}, {"type": "integer"}],
        "additionalItems": false
    });
    assert!(passes(schema.clone(), json!(["a", 1])));
    assert!(passes(schema.clone(), json!(["a"])));
    assert_eq!(
        failures(schema.clone(), json!([1, 1, true])),
        vec![
            ("$".to_string(), "additionalItems".to_string()),
            ("$[0]".to_string(), "type".to_string()),
        ]
    );

    let open = json!({"items": [{"type": "string"}], "additionalItems": {"type": "boolean"}});
    assert_eq!(
        failures(open, json!(["a", true, 3])),
        vec![("$[2]".to_string(), "type".to_string())]
    );
}

#[test]
fn test_unique_items_uses_value_equality() {
    let schema = json!({"uniqueItems": true});
    assert!(passes(schema.clone(), json!([1, 2, {"a": 1}, {"a": 2}])));
    assert_eq!(rules(schema.clone(), json!([1, 1.0])), vec!["uniqueItems"]);
    assert_eq!(
        rules(schema, json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}])),
        vec!["uniqueItems"]
    );
}

#[test]
fn test_contains_needs_one_match() {
    let schema = json!({"contains": {"type": "string"}});
    assert!(passes(schema.clone(), json!([1, "x"])));
    assert_eq!(rules(schema.clone(), json!([1, 2])), vec!["contains"]);
    assert_eq!(rules(schema, json!([])), vec!["contains"]);
}

#[test]
fn test_additional_properties_after_pattern_properties() {
    let schema = json!({
        "properties": {"id": {"type": "integer"}},
        "patternProperties": {"^x-": {"type": "string"}},
        "additionalProperties": false
    });
    assert!(passes(schema.clone(), json!({"id": 1, "x-owner": "me"})));
    assert_eq!(
        failures(schema.clone(), json!({"id": 1, "x-owner": 2})),
        vec![("$.x-owner".to_string(), "type".to_string())]
    );
    assert_eq!(
        failures(schema, json!({"id": 1, "name": "n"})),
        vec![("$".to_string(), "additionalProperties".to_string())]
    );
}

#[test]
fn test_properties_and_pattern_properties_both_apply() {
    let schema = json!({
        "properties": {"count": {"type": "integer"}},
        "patternProperties": {"^c": {"minimum": 10}}
    });
    assert!(passes(schema.clone(), json!({"count": 12})));
    assert_eq!(rules(schema, json!({"count": 1.5})), vec!["type", "minimum"]);
}

#[test]
fn test_object_keywords() {
    let schema = json!({
        "required": ["a"],
        "minProperties": 2,
        "maxProperties": 3,
        "propertyNames": {"maxLength": 2},
        "dependencies": {"a": ["b"]}
    });
    assert!(passes(schema.clone(), json!({"a": 1, "b": 2})));
    assert_eq!(
        failures(schema, json!({"a": 1, "long": 2})),
        vec![
            ("$".to_string(), "dependencies".to_string()),
            ("$.long".to_string(), "maxLength".to_string()),
        ]
    );
}

#[test]
fn test_enum_and_const() {
    assert!(passes(json!({"enum": [1, "a", null]}), json!(1.0)));
    assert_eq!(rules(json!({"enum": [1, "a"]}), json!("b")), vec!["enum"]);
    assert!(passes(json!({"const": {"a": [1]}}), json!({"a": [1]})));
    assert_eq!(rules(json!({"const": 1}), json!(2)), vec!["const"]);
}

#[test]
fn test_all_failures_are_reported() {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "tags": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["name", "id"]
    });
    let found = failures(schema, json!({"name": "", "tags": ["a", 1, 2]}));
    assert_eq!(
        found,
        vec![
            ("$".to_string(), "required".to_string()),
            ("$.name".to_string(), "minLength".to_string()),
            ("$.tags[1]".to_string(), "type".to_string()),
            ("$.tags[2]".to_string(), "type".to_string()),
        ]
    );
}

#[test]
fn test_ref_siblings_are_evaluated_by_default() {
    let (arena, components) = with_components(json!({
        "Positive": {"type": "number", "minimum": 0},
        "Wrapper": {"$ref": "#/components/schemas/Positive", "maximum": 10}
    }));
    let wrapper = components.schema("Wrapper").unwrap();

    let validator = SchemaValidator::new(&arena, Some(&components));
    assert!(validator.is_valid(wrapper, &json!(5)));
    assert!(!validator.is_valid(wrapper, &json!(-1)));
    assert!(!validator.is_valid(wrapper, &json!(11)));

    let ignoring = SchemaValidator::new(&arena, Some(&components)).with_options(
        ValidatorOptions::builder()
            .ref_siblings(RefSiblings::Ignore)
            .build(),
    );
    assert!(ignoring.is_valid(wrapper, &json!(11)));
    assert!(!ignoring.is_valid(wrapper, &json!(-1)));
}

#[test]
fn test_recursive_schema_through_ref() {
    let (arena, components) = with_components(json!({
        "Tree": {
            "type": "object",
            "properties": {
                "value": {"type": "integer"},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}}
            }
        }
    }));
    let tree = components.schema("Tree").unwrap();
    let validator = SchemaValidator::new(&arena, Some(&components));

    let value = json!({"value": 1, "children": [{"value": 2, "children": [{"value": "x"}]}]});
    let err = validator.validate(tree, &value).unwrap_err();
    let paths: Vec<_> = err
        .diagnostics()
        .unwrap()
        .iter()
        .map(|d| d.path.to_string())
        .collect();
    assert_eq!(paths, vec!["$.children[0].children[0].value"]);
}

#[test]
fn test_ref_cycle_with_siblings_terminates() {
    let (arena, components) = with_components(json!({
        "A": {"$ref": "#/components/schemas/B", "type": "object"},
        "B": {"$ref": "#/components/schemas/A", "required": ["x"]}
    }));
    let a = components.schema("A").unwrap();
    let err = SchemaValidator::new(&arena, Some(&components))
        .validate(a, &json!({"x": 1}))
        .unwrap_err();
    assert!(
        err.diagnostics()
            .unwrap()
            .contains_kind(DiagnosticKind::ReferenceCycle)
    );
}

#[test]
fn test_dangling_ref_in_schema() {
    let (arena, components) = with_components(json!({
        "A": {"$ref": "#/components/schemas/Missing"}
    }));
    let a = components.schema("A").unwrap();
    let err = SchemaValidator::new(&arena, Some(&components))
        .validate(a, &json!(1))
        .unwrap_err();
    let diagnostics = err.diagnostics().unwrap();
    assert_eq!(diagnostics.count(DiagnosticKind::DanglingReference), 1);
}

#[test]
fn test_custom_format_plugin() {
    let (arena, root) = SchemaArena::from_value(&json!({"format": "even"})).unwrap();
    let formats = FormatRegistry::new().with("even", |value: &Value| -> Result<(), String> {
        match value.as_i64() {
            Some(n) if n % 2 != 0 => Err(format!("{} is odd", n)),
            _ => Ok(()),
        }
    });
    let validator = SchemaValidator::new(&arena, None).with_formats(formats);
    assert!(validator.validate(root, &json!(4)).is_ok());
    match validator.validate(root, &json!(5)) {
        Err(OpenRpcError::Invalid(diagnostics)) => {
            let first = diagnostics.iter().next().unwrap();
            assert_eq!(first.rule, "format");
            assert_eq!(first.message, "5 is odd");
        }
        other => panic!("expected a format failure, got {other:?}"),
    }
}

#[test]
fn test_unknown_keywords_are_annotations() {
    assert!(passes(
        json!({"title": "t", "description": "d", "x-anything": 1, "examples": [1], "readOnly": true}),
        json!("whatever")
    ));
}
