use serde_json::{json, Value};

fn tree() -> Value {
    json!({
        "$id": "http://example.com/tree",
        "type": "object",
        "properties": {
            "meta": {"type": "string"},
            "nodes": {"type": "array", "items": {"$ref": "node"}}
        },
        "required": ["meta", "nodes"]
    })
}

fn node() -> Value {
    json!({
        "$id": "http://example.com/node",
        "type": "object",
        "properties": {
            "value": {"type": "number"},
            "subtree": {"$ref": "tree"}
        },
        "required": ["value"]
    })
}

fn nested(depth: usize, leaf: Value) -> Value {
    let mut instance = json!({"meta": "leaf", "nodes": [{"value": leaf}]});
    for level in 0..depth {
        instance = json!({
            "meta": format!("level {level}"),
            "nodes": [{"value": 1.5}, {"value": 2, "subtree": instance}]
        });
    }
    instance
}

#[test]
fn mutually_recursive_documents_through_registration() {
    let mut compiler = schemata::compiler();
    compiler.add_schema(node(), None).expect("Has an `$id`");
    let validator = compiler.compile(&tree()).expect("Valid schema");
    for depth in 0..4 {
        assert!(validator.is_valid(&nested(depth, json!(1))), "{depth}");
        assert!(!validator.is_valid(&nested(depth, json!("one"))), "{depth}");
    }
}

#[test]
fn mutually_recursive_documents_through_auxiliary_schemas() {
    let validator = schemata::compiler()
        .compile_with(&tree(), &[node()])
        .expect("Valid schema");
    let errors = validator
        .validate(&nested(2, json!("one")))
        .expect_err("Deep leaf is not a number");
    let error = errors.iter().next().expect("One error");
    assert_eq!(
        error.instance_path().as_str(),
        "/nodes/1/subtree/nodes/1/subtree/nodes/0/value"
    );
    assert_eq!(
        error.schema_location().as_str(),
        "http://example.com/node#/properties/value/type"
    );
}

#[test]
fn auxiliary_documents_are_not_retained() {
    let compiler = schemata::compiler();
    compiler
        .compile_with(&tree(), &[node()])
        .expect("Valid schema");
    let error = compiler.compile(&tree()).expect_err("`node` is unknown");
    assert!(matches!(error, schemata::CompileError::Reference(_)));
}

#[test]
fn compiling_a_registered_document() {
    let mut compiler = schemata::compiler();
    compiler.add_schema(node(), None).expect("Has an `$id`");
    compiler.add_schema(tree(), None).expect("Has an `$id`");
    let validator = compiler.compile(&tree()).expect("Same document as the registered one");
    assert!(validator.is_valid(&nested(1, json!(1))));
    assert!(!validator.is_valid(&nested(1, json!("one"))));
}

#[test]
fn registration_by_key() {
    let mut compiler = schemata::compiler();
    compiler
        .add_schema(json!({"minLength": 1}), Some("http://example.com/non-empty"))
        .expect("Valid key");
    let validator = compiler
        .compile(&json!({"items": {"$ref": "http://example.com/non-empty"}}))
        .expect("Valid schema");
    assert!(validator.is_valid(&json!(["a"])));
    assert!(!validator.is_valid(&json!([""])));
}

#[test]
fn registration_without_a_key() {
    let mut compiler = schemata::compiler();
    assert!(compiler.add_schema(json!({"type": "string"}), None).is_err());
}

#[test]
fn referencing_one_document_from_another_relative_to_its_base() {
    let mut compiler = schemata::compiler();
    compiler
        .add_schemas([
            json!({"$id": "http://example.com/schemas/a", "$ref": "b"}),
            json!({"$id": "http://example.com/schemas/b", "type": "boolean"}),
        ])
        .expect("Both have an `$id`");
    let validator = compiler
        .compile(&json!({"$ref": "http://example.com/schemas/a"}))
        .expect("Valid schema");
    assert!(validator.is_valid(&json!(true)));
    assert!(!validator.is_valid(&json!("true")));
}

#[test]
fn meta_schema_validation() {
    let mut compiler = schemata::compiler();
    // Nothing registered yet
    assert!(compiler
        .validate_schema(&json!({"type": 5}))
        .expect("Valid meta-schema"));
    compiler
        .add_meta_schema(
            json!({
                "$id": "http://example.com/meta",
                "properties": {"type": {"enum": ["integer", "string"]}}
            }),
            None,
        )
        .expect("Has an `$id`");
    compiler.with_default_meta_schema("http://example.com/meta");
    assert!(compiler
        .validate_schema(&json!({"type": "string"}))
        .expect("Valid meta-schema"));
    assert!(!compiler
        .validate_schema(&json!({"type": 5}))
        .expect("Valid meta-schema"));
    assert!(compiler
        .validate_schema(&json!({"$schema": "http://example.com/other", "type": 5}))
        .expect("Valid meta-schema"));
}

#[test]
fn several_meta_schemas() {
    let mut compiler = schemata::compiler();
    compiler
        .add_meta_schemas([
            json!({
                "$id": "http://example.com/strict",
                "properties": {"type": {"const": "object"}}
            }),
            json!({
                "$id": "http://example.com/loose",
                "properties": {"type": {"type": "string"}}
            }),
        ])
        .expect("Both have an `$id`");
    let schema = json!({"$schema": "http://example.com/strict", "type": "array"});
    assert!(!compiler.validate_schema(&schema).expect("Valid meta-schema"));
    let schema = json!({"$schema": "http://example.com/loose", "type": "array"});
    assert!(compiler.validate_schema(&schema).expect("Valid meta-schema"));
    let schema = json!({"$schema": "http://example.com/loose", "type": 1});
    assert!(!compiler.validate_schema(&schema).expect("Valid meta-schema"));
    assert!(compiler
        .add_meta_schemas([json!({"type": "object"})])
        .is_err());
}
