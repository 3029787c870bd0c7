use openrpc_validator::{
    Assembler, DiagnosticKind, OpenRpcDocument, OpenRpcError, OpenRpcResult, ParamStructure,
    ReferenceSiblings, ValidatorOptions, assemble,
};
use serde_json::{Value, json};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(path).expect("fixture should exist");
    serde_json::from_str(&text).expect("fixture should be valid JSON")
}

fn document(methods: Value) -> Value {
    json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": methods
    })
}

fn param(name: &str, required: bool) -> Value {
    json!({"name": name, "required": required, "schema": {"type": "integer"}})
}

/// (path, kind, rule) of every diagnostic, empty when the document is valid.
fn findings(result: OpenRpcResult<OpenRpcDocument>) -> Vec<(String, DiagnosticKind, String)> {
    match result {
        Ok(_) => Vec::new(),
        Err(OpenRpcError::Invalid(diagnostics)) => diagnostics
            .iter()
            .map(|d| (d.path.to_string(), d.kind, d.rule.clone()))
            .collect(),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_petstore_fixture_assembles() {
    let document = assemble(&fixture("petstore.json")).unwrap();

    assert_eq!(document.info.title, "Petstore");
    assert_eq!(document.info.extensions.get("x-audience"), Some(&json!("public")));
    assert_eq!(
        document.servers()[0].resolve_url(),
        "http://localhost:3000/api"
    );
    assert!(document.is_resolved());

    let list = document.method("list_pets").unwrap();
    assert_eq!(list.tags().next().map(|t| t.name.as_str()), Some("pets"));
    assert_eq!(list.errors().next().map(|e| e.code), Some(4));
    let example = list.examples().next().unwrap();
    assert_eq!(
        example.result().map(|e| e.value.clone()),
        Some(json!([{"id": 1, "name": "Rex"}]))
    );

    let create = document.method("create_pet").unwrap();
    assert_eq!(create.param_structure(), ParamStructure::ByName);
    let names: Vec<_> = create.params().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["name", "tag"]);
    assert_eq!(
        create.params[0].reference().map(|r| r.as_str()),
        Some("#/components/contentDescriptors/PetName")
    );
}

#[test]
fn test_assembled_schemas_validate_payloads() {
    let document = assemble(&fixture("petstore.json")).unwrap();
    let get = document.method("get_pet").unwrap();
    let result = get.result().unwrap();

    assert!(document.validate_content(result, &json!({"id": 1, "name": "Rex"})).is_ok());
    assert!(document.validate_content(result, &json!(null)).is_ok());

    let err = document
        .validate_content(result, &json!({"id": -1, "name": "Rex", "age": 3}))
        .unwrap_err();
    assert_eq!(err.diagnostics().unwrap().len(), 1);

    assert!(document.validate_params(get, &json!([7])).is_ok());
    assert!(document.validate_params(get, &json!({"petId": 7})).is_ok());
    assert!(document.validate_params(get, &json!([])).is_err());
}

#[test]
fn test_param_ordering() {
    let bad = document(json!([{
        "name": "m",
        "params": [param("a", true), param("b", false), param("c", true)]
    }]));
    assert_eq!(
        findings(assemble(&bad)),
        vec![(
            "$.methods[0].params[2]".to_string(),
            DiagnosticKind::ParamOrderingViolation,
            "paramOrdering".to_string()
        )]
    );

    let good = document(json!([{
        "name": "m",
        "params": [param("a", true), param("b", true), param("c", false)]
    }]));
    assert!(assemble(&good).is_ok());
}

#[test]
fn test_required_defaults_to_false_for_ordering() {
    let bad = document(json!([{
        "name": "m",
        "params": [
            {"name": "a", "schema": true},
            param("b", true)
        ]
    }]));
    assert_eq!(
        findings(assemble(&bad))
            .into_iter()
            .map(|(_, kind, _)| kind)
            .collect::<Vec<_>>(),
        vec![DiagnosticKind::ParamOrderingViolation]
    );
}

#[test]
fn test_duplicate_method_names() {
    let duplicated = document(json!([
        {"name": "subtract", "params": []},
        {"name": "subtract", "params": []}
    ]));
    assert_eq!(
        findings(assemble(&duplicated)),
        vec![(
            "$.methods[1].name".to_string(),
            DiagnosticKind::DuplicateIdentifier,
            "uniqueMethodNames".to_string()
        )]
    );

    let renamed = document(json!([
        {"name": "subtract", "params": []},
        {"name": "Subtract", "params": []}
    ]));
    assert!(assemble(&renamed).is_ok());
}

#[test]
fn test_error_codes_unique_within_a_method_only() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [
            {
                "name": "a",
                "params": [],
                "errors": [
                    {"code": 1, "message": "one"},
                    {"$ref": "#/components/errors/AlsoOne"}
                ]
            },
            {"name": "b", "params": [], "errors": [{"code": 1, "message": "one"}]}
        ],
        "components": {"errors": {"AlsoOne": {"code": 1, "message": "again"}}}
    });
    assert_eq!(
        findings(assemble(&value)),
        vec![(
            "$.methods[0].errors[1]".to_string(),
            DiagnosticKind::DuplicateIdentifier,
            "uniqueErrorCodes".to_string()
        )]
    );
}

#[test]
fn test_duplicate_param_names() {
    let value = document(json!([{
        "name": "m",
        "params": [param("a", true), param("a", true)]
    }]));
    assert_eq!(
        findings(assemble(&value)),
        vec![(
            "$.methods[0].params[1]".to_string(),
            DiagnosticKind::DuplicateIdentifier,
            "uniqueParamNames".to_string()
        )]
    );
}

#[test]
fn test_reference_with_extra_keys() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [{
            "name": "m",
            "params": [],
            "tags": [{"$ref": "#/components/tags/Foo", "description": "extraneous"}]
        }],
        "components": {"tags": {"Foo": {"name": "foo"}}}
    });

    // Tolerated: still a reference, resolved to the component.
    let document = assemble(&value).unwrap();
    let method = document.method("m").unwrap();
    assert_eq!(method.tags().next().map(|t| t.name.as_str()), Some("foo"));
    assert!(method.tags().all(|t| t.description.is_none()));

    let strict = Assembler::new().with_options(
        ValidatorOptions::builder()
            .reference_siblings(ReferenceSiblings::Reject)
            .build(),
    );
    assert_eq!(
        findings(strict.assemble(&value)),
        vec![(
            "$.methods[0].tags[0]".to_string(),
            DiagnosticKind::SchemaViolation,
            "$ref".to_string()
        )]
    );
}

#[test]
fn test_dangling_references_are_reported() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [{
            "name": "m",
            "params": [{"$ref": "#/components/contentDescriptors/Missing"}],
            "result": {"name": "r", "schema": {"$ref": "#/components/schemas/Nope"}}
        }]
    });
    assert_eq!(
        findings(assemble(&value)),
        vec![
            (
                "$.methods[0].params[0]".to_string(),
                DiagnosticKind::DanglingReference,
                "$ref".to_string()
            ),
            (
                "$.methods[0].result.schema".to_string(),
                DiagnosticKind::DanglingReference,
                "$ref".to_string()
            ),
        ]
    );
}

#[test]
fn test_reference_cycle_in_components() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [{
            "name": "m",
            "params": [{"$ref": "#/components/contentDescriptors/A"}]
        }],
        "components": {
            "contentDescriptors": {
                "A": {"$ref": "#/components/contentDescriptors/B"},
                "B": {"$ref": "#/components/contentDescriptors/A"}
            }
        }
    });
    let found = findings(assemble(&value));
    assert!(!found.is_empty());
    assert!(
        found
            .iter()
            .all(|(_, kind, _)| *kind == DiagnosticKind::ReferenceCycle)
    );
    assert!(found.iter().any(|(path, _, _)| path == "$.methods[0].params[0]"));
}

#[test]
fn test_schema_cycle_with_sibling_keywords() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [{
            "name": "m",
            "params": [{"name": "p", "schema": {"$ref": "#/components/schemas/A"}}]
        }],
        "components": {
            "schemas": {
                "A": {"$ref": "#/components/schemas/B", "type": "object"},
                "B": {"$ref": "#/components/schemas/A", "type": "object"}
            }
        }
    });
    let found = findings(assemble(&value));
    assert_eq!(
        found,
        vec![
            (
                "$.components.schemas.A".to_string(),
                DiagnosticKind::ReferenceCycle,
                "$ref".to_string()
            ),
            (
                "$.components.schemas.B".to_string(),
                DiagnosticKind::ReferenceCycle,
                "$ref".to_string()
            ),
            (
                "$.methods[0].params[0].schema".to_string(),
                DiagnosticKind::ReferenceCycle,
                "$ref".to_string()
            ),
        ]
    );
}

#[test]
fn test_recursive_schema_is_not_a_cycle() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "calc", "version": "1.0.0"},
        "methods": [{
            "name": "m",
            "params": [{"name": "p", "schema": {"$ref": "#/components/schemas/Tree"}}]
        }],
        "components": {
            "schemas": {
                "Tree": {
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}}
                    }
                }
            }
        }
    });
    assert!(assemble(&value).is_ok());
}

#[test]
fn test_missing_methods() {
    let value = json!({"openrpc": "1.3.2", "info": {"title": "t", "version": "1"}});
    assert_eq!(
        findings(assemble(&value)),
        vec![(
            "$.methods".to_string(),
            DiagnosticKind::MissingRequiredField,
            "required".to_string()
        )]
    );
}

#[test]
fn test_undeclared_server_variables() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "t", "version": "1"},
        "servers": [{"url": "https://{region}.example.com/{stage}", "variables": {
            "stage": {"default": "prod"},
            "unused": {"default": "fine"}
        }}],
        "methods": []
    });
    assert_eq!(
        findings(assemble(&value)),
        vec![(
            "$.servers[0].variables.region".to_string(),
            DiagnosticKind::MissingRequiredField,
            "serverVariables".to_string()
        )]
    );
}

#[test]
fn test_every_problem_is_collected() {
    let value = json!({
        "openrpc": "1.3.2",
        "info": {"title": "t", "version": "1"},
        "methods": [
            {"name": "dup", "params": [param("a", false), param("b", true)]},
            {"name": "dup", "params": [], "errors": [
                {"code": 5, "message": "x"},
                {"code": 5, "message": "y"}
            ]}
        ]
    });
    let kinds: Vec<_> = findings(assemble(&value))
        .into_iter()
        .map(|(_, kind, _)| kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::ParamOrderingViolation,
            DiagnosticKind::DuplicateIdentifier,
            DiagnosticKind::DuplicateIdentifier,
        ]
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let mut document = assemble(&fixture("petstore.json")).unwrap();
    let once = document.clone();
    document.resolve_references().unwrap();
    assert_eq!(document, once);
    document.resolve_references().unwrap();
    assert_eq!(document, once);
}

#[test]
fn test_serialized_slots_keep_their_references() {
    let document = assemble(&fixture("petstore.json")).unwrap();
    let list = document.method("list_pets").unwrap();
    assert_eq!(
        serde_json::to_value(&list.tags[0]).unwrap(),
        json!({"$ref": "#/components/tags/pets"})
    );
}

#[test]
fn test_cancellation() {
    let token = CancellationToken::new();
    token.cancel();
    let result = Assembler::new()
        .with_cancellation(token)
        .assemble(&fixture("petstore.json"));
    assert_eq!(result.unwrap_err(), OpenRpcError::Cancelled);
}

#[tokio::test]
async fn test_cancellation_from_another_task() {
    let token = CancellationToken::new();
    let assembler = Assembler::new().with_cancellation(token.clone());
    let value = fixture("petstore.json");

    let handle = tokio::task::spawn_blocking(move || assembler.assemble(&value));
    token.cancel();
    // The run either finished before the flag was seen or stopped on it.
    match handle.await.unwrap() {
        Ok(_) | Err(OpenRpcError::Cancelled) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}
