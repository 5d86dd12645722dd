use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    evaluation::ErrorHandler,
    ext::cmp,
    keywords::{helpers::map_get_bounds, CompilationResult},
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct MinItemsValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MinItemsValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Array(items) = instance {
            if (items.len() as u64) < self.limit {
                return false;
            }
        }
        true
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

pub(crate) struct MaxItemsValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MaxItemsValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Array(items) = instance {
            if (items.len() as u64) > self.limit {
                return false;
            }
        }
        true
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

pub(crate) struct UniqueItemsValidator {
    error: ErrorHandler,
}

impl Validate for UniqueItemsValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Array(items) = instance {
            return cmp::is_unique(items);
        }
        true
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

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let (min, max) = map_get_bounds(ctx, schema, "minItems", "maxItems")?;
    if let Some(limit) = min {
        validators.push(Box::new(MinItemsValidator {
            limit,
            error: ctx.error_handler("minItems", limit.into()),
        }));
    }
    if let Some(limit) = max {
        validators.push(Box::new(MaxItemsValidator {
            limit,
            error: ctx.error_handler("maxItems", limit.into()),
        }));
    }
    match schema.get("uniqueItems") {
        Some(Value::Bool(true)) => validators.push(Box::new(UniqueItemsValidator {
            error: ctx.error_handler("uniqueItems", Value::Bool(true)),
        })),
        Some(Value::Bool(false)) | None => {}
        Some(_) => return Err(ctx.invalid_keyword("uniqueItems", "must be a boolean")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minItems": 0}), &json!([]))]
    #[test_case(&json!({"minItems": 1}), &json!([1]))]
    #[test_case(&json!({"maxItems": 1}), &json!([1]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, "1", {"a": 1}, {"a": 2}]))]
    #[test_case(&json!({"uniqueItems": false}), &json!([1, 1]))]
    #[test_case(&json!({"minItems": 3}), &json!("abc"))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minItems": 1}), &json!([]))]
    #[test_case(&json!({"maxItems": 1}), &json!([1, 2]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1.0]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([{"a": [1]}, {"a": [1]}]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test_case(&json!({"minItems": 2}), &json!([1]), "json-schema:///#/minItems")]
    #[test_case(&json!({"maxItems": 0}), &json!([1]), "json-schema:///#/maxItems")]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1]), "json-schema:///#/uniqueItems")]
    fn schema_location(schema: &Value, instance: &Value, expected: &str) {
        tests_util::assert_schema_location(schema, instance, expected);
    }
}
