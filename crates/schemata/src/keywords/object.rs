use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    error::{CompileError, Keyword},
    evaluation::ErrorHandler,
    keywords::{
        helpers::{expect_object, map_get_bounds},
        CompilationResult,
    },
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct MinPropertiesValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MinPropertiesValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Object(item) = instance {
            if (item.len() as u64) < self.limit {
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

pub(crate) struct MaxPropertiesValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MaxPropertiesValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Object(item) = instance {
            if (item.len() as u64) > self.limit {
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

/// Property names that must be present. Each missing name is reported on its own.
pub(crate) struct RequiredValidator {
    required: Vec<String>,
    error: ErrorHandler,
}

impl RequiredValidator {
    fn is_satisfied(&self, item: &Map<String, Value>) -> bool {
        self.required.iter().all(|name| item.contains_key(name))
    }

    fn report_missing(
        &self,
        item: &Map<String, Value>,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        let mut valid = true;
        for name in &self.required {
            if !item.contains_key(name) {
                valid &= self.error.report_key(ctx, instance, location, name.as_str());
            }
        }
        valid
    }
}

impl Validate for RequiredValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Object(item) = instance {
            return self.is_satisfied(item);
        }
        true
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        if let Value::Object(item) = instance {
            return self.report_missing(item, instance, location, ctx);
        }
        true
    }
}

/// Properties that become required once their trigger property is present.
pub(crate) struct DependentRequiredValidator {
    dependencies: Vec<(String, RequiredValidator)>,
}

impl Validate for DependentRequiredValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Object(item) = instance {
            return self
                .dependencies
                .iter()
                .filter(|(trigger, _)| item.contains_key(trigger))
                .all(|(_, required)| required.is_satisfied(item));
        }
        true
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        let Value::Object(item) = instance else {
            return true;
        };
        let mut valid = true;
        for (trigger, required) in &self.dependencies {
            if item.contains_key(trigger) {
                valid &= required.report_missing(item, instance, location, ctx);
            }
        }
        valid
    }
}

fn string_list(ctx: &Context<'_>, keyword: &'static str, value: &Value) -> Result<Vec<String>, CompileError> {
    let Value::Array(items) = value else {
        return Err(ctx.invalid_keyword(keyword, "must be an array of strings"));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ctx.invalid_keyword(keyword, "must be an array of strings"))
        })
        .collect()
}

fn compile_dependent_required(
    ctx: &Context<'_>,
    keyword: &'static str,
    value: &Value,
) -> Result<Vec<(String, RequiredValidator)>, CompileError> {
    let map = expect_object(ctx, keyword, value)?;
    let location = ctx.location().join(keyword);
    let mut dependencies = Vec::with_capacity(map.len());
    for (trigger, required) in map {
        // Schema-valued `dependencies` are applied with the other property keywords
        if keyword == "dependencies" && !required.is_array() {
            continue;
        }
        dependencies.push((
            trigger.clone(),
            RequiredValidator {
                required: string_list(ctx, keyword, required)?,
                error: ErrorHandler::new(
                    location.join(trigger),
                    Keyword::Single(keyword),
                    required.clone(),
                ),
            },
        ));
    }
    Ok(dependencies)
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let (min, max) = map_get_bounds(ctx, schema, "minProperties", "maxProperties")?;
    if let Some(limit) = min {
        validators.push(Box::new(MinPropertiesValidator {
            limit,
            error: ctx.error_handler("minProperties", limit.into()),
        }));
    }
    if let Some(limit) = max {
        validators.push(Box::new(MaxPropertiesValidator {
            limit,
            error: ctx.error_handler("maxProperties", limit.into()),
        }));
    }
    match schema.get("required") {
        Some(value @ Value::Array(_)) => {
            let required = string_list(ctx, "required", value)?;
            if !required.is_empty() {
                validators.push(Box::new(RequiredValidator {
                    required,
                    error: ctx.error_handler("required", value.clone()),
                }));
            }
        }
        // A boolean `required` marks this node as a mandatory property of its parent
        Some(Value::Bool(_)) | None => {}
        Some(_) => {
            return Err(ctx.invalid_keyword("required", "must be an array of strings or a boolean"))
        }
    }
    for keyword in ["dependentRequired", "dependencies"] {
        if let Some(value) = schema.get(keyword) {
            let dependencies = compile_dependent_required(ctx, keyword, value)?;
            if !dependencies.is_empty() {
                validators.push(Box::new(DependentRequiredValidator { dependencies }));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"required": ["a"]}), &json!({"a": null}))]
    #[test_case(&json!({"required": []}), &json!({}))]
    #[test_case(&json!({"required": ["a"]}), &json!([]))]
    #[test_case(&json!({"dependentRequired": {"foo": ["bar"]}}), &json!({}))]
    #[test_case(&json!({"dependentRequired": {"foo": ["bar"]}}), &json!({"foo": true, "bar": "x"}))]
    #[test_case(&json!({"dependencies": {"foo": ["bar"]}}), &json!({"bar": 1}))]
    #[test_case(&json!({"dependencies": {"foo": {"required": ["bar"]}}}), &json!({"baz": 1}))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minProperties": 2}), &json!({"a": 1}))]
    #[test_case(&json!({"maxProperties": 0}), &json!({"a": 1}))]
    #[test_case(&json!({"required": ["a"]}), &json!({"b": 1}))]
    #[test_case(&json!({"dependentRequired": {"foo": ["bar"]}}), &json!({"foo": true}))]
    #[test_case(&json!({"dependencies": {"foo": ["bar"]}}), &json!({"foo": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn one_error_per_missing_property() {
        tests_util::expect_errors(
            &json!({"required": ["a", "b", "c"]}),
            &json!({"b": 1}),
            &["\"a\" is a required property", "\"c\" is a required property"],
        );
    }

    #[test]
    fn dependent_required_location() {
        tests_util::assert_schema_location(
            &json!({"dependentRequired": {"foo": ["bar"]}}),
            &json!({"foo": 1}),
            "json-schema:///#/dependentRequired/foo",
        );
    }

    #[test]
    fn dependent_required_errors_per_key() {
        let validator = crate::compile(&json!({"dependentRequired": {"a": ["b", "c"]}}))
            .expect("Valid schema");
        let errors = validator.validate(&json!({"a": 1})).expect_err("Missing");
        let keys: Vec<_> = errors.iter().map(|error| error.data_key()).collect();
        assert_eq!(keys, vec![Some("b"), Some("c")]);
    }
}
