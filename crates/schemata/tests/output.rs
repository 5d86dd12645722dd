use schemata::{CompileError, Keyword};
use serde_json::{json, Value};
use test_case::test_case;

#[test]
fn serialized_errors() {
    let validator = schemata::compile(&json!({
        "properties": {"age": {"minimum": 18}},
        "required": ["name"]
    }))
    .expect("Valid schema");
    let errors = validator
        .validate(&json!({"age": 7}))
        .expect_err("Two violations");
    let value = serde_json::to_value(&errors).expect("Serializable");
    assert_eq!(
        value,
        json!([
            {
                "timestamp": 0,
                "schemaObject": "json-schema:///#/required",
                "keyword": "required",
                "expectedValue": ["name"],
                "dataKey": "name",
                "instancePath": "",
                "actualValue": {"age": 7}
            },
            {
                "timestamp": 1,
                "schemaObject": "json-schema:///#/properties/age/minimum",
                "keyword": "minimum",
                "expectedValue": 18,
                "instancePath": "/age",
                "actualValue": 7
            }
        ])
    );
}

#[test]
fn display_lists_every_error() {
    let validator = schemata::compile(&json!({"items": {"type": "string"}})).expect("Valid schema");
    let errors = validator
        .validate(&json!(["a", 1, null]))
        .expect_err("Two violations");
    assert_eq!(
        errors.to_string(),
        "/1: 1 is not of type \"string\"\n/2: null is not of type \"string\""
    );
}

#[test]
fn keyword_sets() {
    let validator = schemata::compile(&json!({"minimum": 5, "exclusiveMinimum": true}))
        .expect("Valid schema");
    let errors = validator.validate(&json!(5)).expect_err("Equal to the bound");
    let error = errors.into_vec().pop().expect("One error");
    assert_eq!(error.keyword(), Keyword::Set(&["minimum", "exclusiveMinimum"]));
    assert!(error.keyword().contains("minimum"));
    assert_eq!(error.keyword().to_string(), "minimum/exclusiveMinimum");
}

#[test_case(&json!({"minItems": 3, "maxItems": 2}), "'maxItems' (2) is less than 'minItems' (3) at 'json-schema:///#'")]
#[test_case(&json!({"minLength": -1}), "Invalid 'minLength' at 'json-schema:///#/minLength': must be a non-negative integer")]
#[test_case(&json!({"type": "decimal"}), "Unknown type 'decimal' at 'json-schema:///#/type'")]
#[test_case(&json!({"type": []}), "Empty type list at 'json-schema:///#/type'")]
#[test_case(&json!({"format": "currency"}), "Unknown format 'currency' at 'json-schema:///#/format'")]
#[test_case(&json!({"items": 1}), "Schema at 'json-schema:///#/items' must be a boolean or an object, got 1")]
#[test_case(
    &json!({"$ref": "#foo", "$defs": {"a": {"$anchor": "foo"}}}),
    "Unresolvable reference 'json-schema:///#foo': it is declared below a schema with `$ref` '#foo', \
     where identifiers are ignored"
)]
fn structural_errors(schema: &Value, expected: &str) {
    let error = schemata::compile(schema).expect_err("Invalid schema");
    assert_eq!(error.to_string(), expected);
}

#[test_case(&json!({"type": "integer"}), &json!({"type": "string"}); "different contents")]
#[test_case(&json!({"type": "integer"}), &json!({"type": "integer"}); "identical contents")]
fn duplicate_identifiers(first: &Value, second: &Value) {
    let mut first = first.clone();
    let mut second = second.clone();
    first["$id"] = json!("http://example.com/same");
    second["$id"] = json!("http://example.com/same");
    let error = schemata::compile(&json!({"$defs": {"a": first, "b": second}}))
        .expect_err("Duplicate `$id`");
    assert!(matches!(
        error,
        CompileError::Reference(referencing::Error::DuplicateId { .. })
    ));
}
