use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    evaluation::ErrorHandler,
    keywords::{helpers::map_get_bounds, CompilationResult},
    paths::LazyLocation,
    regex::Pattern,
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct MinLengthValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MinLengthValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::String(item) = instance {
            return (bytecount::num_chars(item.as_bytes()) as u64) >= self.limit;
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

pub(crate) struct MaxLengthValidator {
    limit: u64,
    error: ErrorHandler,
}

impl Validate for MaxLengthValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::String(item) = instance {
            // Every char takes at least one byte
            if (item.len() as u64) <= self.limit {
                return true;
            }
            return (bytecount::num_chars(item.as_bytes()) as u64) <= self.limit;
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

pub(crate) struct PatternValidator {
    pattern: Pattern,
    error: ErrorHandler,
}

impl Validate for PatternValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::String(item) = instance {
            return self.pattern.is_match(item);
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
    let (min, max) = map_get_bounds(ctx, schema, "minLength", "maxLength")?;
    if let Some(limit) = min {
        validators.push(Box::new(MinLengthValidator {
            limit,
            error: ctx.error_handler("minLength", limit.into()),
        }));
    }
    if let Some(limit) = max {
        validators.push(Box::new(MaxLengthValidator {
            limit,
            error: ctx.error_handler("maxLength", limit.into()),
        }));
    }
    if let Some(value) = schema.get("pattern") {
        let Value::String(pattern) = value else {
            return Err(ctx.invalid_keyword("pattern", "must be a string"));
        };
        validators.push(Box::new(PatternValidator {
            pattern: ctx.compile_pattern("pattern", pattern)?,
            error: ctx.error_handler("pattern", value.clone()),
        }));
    }
    Ok(())
}
