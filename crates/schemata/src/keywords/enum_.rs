use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    evaluation::ErrorHandler,
    ext::cmp,
    keywords::CompilationResult,
    paths::LazyLocation,
    types::{JsonType, JsonTypeSet},
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct EnumValidator {
    options: Vec<Value>,
    // Kinds present among the options, to skip comparisons for values that can't match
    types: JsonTypeSet,
    error: ErrorHandler,
}

impl EnumValidator {
    fn new(options: Vec<Value>, error: ErrorHandler) -> Self {
        let types = options.iter().map(kind_of).collect();
        EnumValidator {
            options,
            types,
            error,
        }
    }
}

/// The kind used for the quick rejection. All numbers share one kind so `1` matches `1.0`.
fn kind_of(value: &Value) -> JsonType {
    match value {
        Value::Null => JsonType::Null,
        Value::Bool(_) => JsonType::Boolean,
        Value::Number(_) => JsonType::Number,
        Value::String(_) => JsonType::String,
        Value::Array(_) => JsonType::Array,
        Value::Object(_) => JsonType::Object,
    }
}

impl Validate for EnumValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if !self.types.contains(kind_of(instance)) {
            return false;
        }
        self.options.iter().any(|option| cmp::equal(instance, option))
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        self.is_valid(instance, ctx) || self.error.report(ctx, instance, location)
    }
}

pub(crate) struct ConstValidator {
    value: Value,
    error: ErrorHandler,
}

impl Validate for ConstValidator {
    #[inline]
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        cmp::equal(instance, &self.value)
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        cmp::equal(instance, &self.value) || self.error.report(ctx, instance, location)
    }
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    if let Some(value) = schema.get("enum") {
        let Value::Array(options) = value else {
            return Err(ctx.invalid_keyword("enum", "must be an array"));
        };
        let error = ctx.error_handler("enum", value.clone());
        validators.push(Box::new(EnumValidator::new(options.clone(), error)));
    }
    if let Some(value) = schema.get("const") {
        validators.push(Box::new(ConstValidator {
            value: value.clone(),
            error: ctx.error_handler("const", value.clone()),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"enum": [1, "a", null]}), &json!(1.0))]
    #[test_case(&json!({"enum": [[1, 2], {"a": 1}]}), &json!({"a": 1}))]
    #[test_case(&json!({"const": {"a": [1]}}), &json!({"a": [1.0]}))]
    #[test_case(&json!({"const": null}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"enum": [1, "a"]}), &json!("b"))]
    #[test_case(&json!({"enum": [1, "a"]}), &json!(true))]
    #[test_case(&json!({"enum": []}), &json!(null))]
    #[test_case(&json!({"const": false}), &json!(0))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn enum_and_const_report_separately() {
        tests_util::expect_errors(
            &json!({"enum": [1, 2], "const": 1}),
            &json!(3),
            &["3 is not one of [1,2]", "1 was expected"],
        );
    }
}
