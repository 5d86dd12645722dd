use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    error::CompileError,
    evaluation::ErrorHandler,
    keywords::CompilationResult,
    paths::LazyLocation,
    types::{JsonType, JsonTypeSet},
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct SingleTypeValidator {
    ty: JsonType,
    error: ErrorHandler,
}

impl Validate for SingleTypeValidator {
    #[inline]
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        self.ty.matches(instance)
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        self.ty.matches(instance) || self.error.report(ctx, instance, location)
    }
}

pub(crate) struct MultipleTypesValidator {
    types: JsonTypeSet,
    error: ErrorHandler,
}

impl Validate for MultipleTypesValidator {
    #[inline]
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        self.types.matches(instance)
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        self.types.matches(instance) || self.error.report(ctx, instance, location)
    }
}

fn parse(ctx: &Context<'_>, name: &Value) -> Result<JsonType, CompileError> {
    let Value::String(name) = name else {
        return Err(ctx.invalid_keyword("type", "type names must be strings"));
    };
    name.parse().map_err(|()| CompileError::UnknownType {
        location: ctx.location().join("type"),
        name: name.clone(),
    })
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let Some(value) = schema.get("type") else {
        return Ok(());
    };
    let error = ctx.error_handler("type", value.clone());
    match value {
        Value::String(_) => {
            let ty = parse(ctx, value)?;
            validators.push(Box::new(SingleTypeValidator { ty, error }));
        }
        Value::Array(names) => {
            if names.is_empty() {
                return Err(CompileError::EmptyTypeList {
                    location: ctx.location().join("type"),
                });
            }
            let mut types = JsonTypeSet::empty();
            for name in names {
                types = types.insert(parse(ctx, name)?);
            }
            if let [name] = names.as_slice() {
                let ty = parse(ctx, name)?;
                validators.push(Box::new(SingleTypeValidator { ty, error }));
            } else {
                validators.push(Box::new(MultipleTypesValidator { types, error }));
            }
        }
        _ => return Err(ctx.invalid_keyword("type", "must be a string or an array of strings")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::CompileError, tests_util};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"type": "integer"}), &json!(3))]
    #[test_case(&json!({"type": "integer"}), &json!(3.0))]
    #[test_case(&json!({"type": ["string", "null"]}), &json!(null))]
    #[test_case(&json!({"type": ["integer"]}), &json!(1))]
    #[test_case(&json!({"type": "bigint"}), &json!(-10))]
    #[test_case(&json!({"type": "set"}), &json!([1, 2]))]
    #[test_case(&json!({"type": "map"}), &json!({"a": 1}))]
    #[test_case(&json!({"type": "regex"}), &json!("^a$"))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"type": "integer"}), &json!(3.5))]
    #[test_case(&json!({"type": ["string", "null"]}), &json!(1))]
    #[test_case(&json!({"type": "set"}), &json!([1, 1]))]
    #[test_case(&json!({"type": "object"}), &json!([]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn schema_location() {
        tests_util::assert_schema_location(
            &json!({"properties": {"a": {"type": "string"}}}),
            &json!({"a": 1}),
            "json-schema:///#/properties/a/type",
        );
    }

    #[test]
    fn unknown_type() {
        let error = crate::compile(&json!({"type": ["string", "decimal"]})).expect_err("Unknown type");
        match error {
            CompileError::UnknownType { location, name } => {
                assert_eq!(location.as_str(), "json-schema:///#/type");
                assert_eq!(name, "decimal");
            }
            error => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn empty_type_list() {
        let error = crate::compile(&json!({"type": []})).expect_err("Empty list");
        assert!(matches!(error, CompileError::EmptyTypeList { .. }));
    }
}
