//! `minimum`, `maximum`, their exclusive forms and `multipleOf`.
//!
//! Limits keep the representation they were written in and are compared with `num-cmp`, so
//! `u64::MAX` and `-1` are compared exactly instead of through `f64`.
#![allow(clippy::float_cmp)]

use fraction::{BigFraction, BigUint};
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

use crate::{
    compiler::Context,
    evaluation::ErrorHandler,
    keywords::CompilationResult,
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Minimum,
    ExclusiveMinimum,
    Maximum,
    ExclusiveMaximum,
}

pub(crate) struct BoundValidator<T> {
    limit: T,
    bound: Bound,
    error: ErrorHandler,
}

impl<T> BoundValidator<T>
where
    T: Copy,
    u64: NumCmp<T>,
    i64: NumCmp<T>,
    f64: NumCmp<T>,
{
    fn holds<N: NumCmp<T>>(&self, value: N) -> bool {
        match self.bound {
            Bound::Minimum => !NumCmp::num_lt(value, self.limit),
            Bound::ExclusiveMinimum => NumCmp::num_gt(value, self.limit),
            Bound::Maximum => !NumCmp::num_gt(value, self.limit),
            Bound::ExclusiveMaximum => NumCmp::num_lt(value, self.limit),
        }
    }

    fn check(&self, number: &Number) -> bool {
        if let Some(value) = number.as_u64() {
            self.holds(value)
        } else if let Some(value) = number.as_i64() {
            self.holds(value)
        } else {
            number.as_f64().is_none_or(|value| self.holds(value))
        }
    }
}

impl<T> Validate for BoundValidator<T>
where
    T: Copy + Send + Sync,
    u64: NumCmp<T>,
    i64: NumCmp<T>,
    f64: NumCmp<T>,
{
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        if let Value::Number(number) = instance {
            self.check(number)
        } else {
            true
        }
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

fn bound_validator(limit: &Number, bound: Bound, error: ErrorHandler) -> BoxedValidator {
    if let Some(limit) = limit.as_u64() {
        Box::new(BoundValidator {
            limit,
            bound,
            error,
        })
    } else if let Some(limit) = limit.as_i64() {
        Box::new(BoundValidator {
            limit,
            bound,
            error,
        })
    } else {
        Box::new(BoundValidator {
            limit: limit.as_f64().unwrap_or(f64::NAN),
            bound,
            error,
        })
    }
}

pub(crate) struct MultipleOfIntegerValidator {
    multiple_of: u64,
    error: ErrorHandler,
}

impl Validate for MultipleOfIntegerValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        let Value::Number(number) = instance else {
            return true;
        };
        if let Some(value) = number.as_u64() {
            value % self.multiple_of == 0
        } else if let Some(value) = number.as_i64() {
            value.unsigned_abs() % self.multiple_of == 0
        } else {
            number.as_f64().is_none_or(|value| {
                #[allow(clippy::cast_precision_loss)]
                let multiple_of = self.multiple_of as f64;
                value.fract() == 0.0 && (value % multiple_of) == 0.0
            })
        }
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

pub(crate) struct MultipleOfFloatValidator {
    multiple_of: f64,
    error: ErrorHandler,
}

impl Validate for MultipleOfFloatValidator {
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        let Some(value) = instance.as_f64() else {
            return true;
        };
        let remainder = (value / self.multiple_of) % 1.;
        if remainder.is_nan() {
            // Involves heap allocations via the underlying `BigUint` type
            let fraction = BigFraction::from(value) / BigFraction::from(self.multiple_of);
            fraction
                .denom()
                .is_none_or(|denom| denom == &BigUint::from(1_u8))
        } else {
            remainder < f64::EPSILON
        }
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

fn compile_bound(
    ctx: &Context<'_>,
    schema: &Map<String, Value>,
    keyword: &'static str,
    exclusive_keyword: &'static str,
    keywords: &'static [&'static str],
    (inclusive, exclusive): (Bound, Bound),
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    match schema.get(keyword) {
        Some(Value::Number(limit)) => {
            // Boolean exclusive flags turn the plain limit into an exclusive one
            if schema.get(exclusive_keyword) == Some(&Value::Bool(true)) {
                let error = ctx.error_handler_for(keywords, Value::Number(limit.clone()));
                validators.push(bound_validator(limit, exclusive, error));
            } else {
                let error = ctx.error_handler(keyword, Value::Number(limit.clone()));
                validators.push(bound_validator(limit, inclusive, error));
            }
        }
        Some(_) => return Err(ctx.invalid_keyword(keyword, "must be a number")),
        None => {}
    }
    match schema.get(exclusive_keyword) {
        Some(Value::Number(limit)) => {
            let error = ctx.error_handler(exclusive_keyword, Value::Number(limit.clone()));
            validators.push(bound_validator(limit, exclusive, error));
        }
        Some(Value::Bool(_)) | None => {}
        Some(_) => return Err(ctx.invalid_keyword(exclusive_keyword, "must be a number")),
    }
    Ok(())
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    compile_bound(
        ctx,
        schema,
        "minimum",
        "exclusiveMinimum",
        &["minimum", "exclusiveMinimum"],
        (Bound::Minimum, Bound::ExclusiveMinimum),
        validators,
    )?;
    compile_bound(
        ctx,
        schema,
        "maximum",
        "exclusiveMaximum",
        &["maximum", "exclusiveMaximum"],
        (Bound::Maximum, Bound::ExclusiveMaximum),
        validators,
    )?;
    if let Some(value) = schema.get("multipleOf") {
        let error = ctx.error_handler("multipleOf", value.clone());
        match value {
            Value::Number(number) if number.as_u64().is_some_and(|n| n > 0) => {
                if let Some(multiple_of) = number.as_u64() {
                    validators.push(Box::new(MultipleOfIntegerValidator { multiple_of, error }));
                }
            }
            Value::Number(number) if number.as_f64().is_some_and(|n| n > 0.0) => {
                if let Some(multiple_of) = number.as_f64() {
                    validators.push(Box::new(MultipleOfFloatValidator { multiple_of, error }));
                }
            }
            _ => return Err(ctx.invalid_keyword("multipleOf", "must be a number greater than 0")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::CompileError, tests_util};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minimum": 1}), &json!(1))]
    #[test_case(&json!({"minimum": 1.5}), &json!(2))]
    #[test_case(&json!({"minimum": -1}), &json!(u64::MAX))]
    #[test_case(&json!({"maximum": 1}), &json!(1.0))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.1))]
    #[test_case(&json!({"exclusiveMaximum": 0}), &json!(-1))]
    #[test_case(&json!({"minimum": 5, "exclusiveMinimum": true}), &json!(6))]
    #[test_case(&json!({"maximum": 5, "exclusiveMaximum": false}), &json!(5))]
    #[test_case(&json!({"multipleOf": 2}), &json!(-4))]
    #[test_case(&json!({"multipleOf": 2}), &json!(4.0))]
    #[test_case(&json!({"multipleOf": 0.5}), &json!(1.5))]
    #[test_case(&json!({"multipleOf": 0.25}), &json!(3))]
    #[test_case(&json!({"minimum": 10}), &json!("not a number"))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minimum": 1}), &json!(0))]
    #[test_case(&json!({"minimum": 0}), &json!(-1))]
    #[test_case(&json!({"maximum": -1}), &json!(u64::MAX))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1))]
    #[test_case(&json!({"exclusiveMaximum": 1.5}), &json!(1.5))]
    #[test_case(&json!({"minimum": 5, "exclusiveMinimum": true}), &json!(5))]
    #[test_case(&json!({"maximum": 5, "exclusiveMaximum": true}), &json!(5))]
    #[test_case(&json!({"multipleOf": 2}), &json!(3))]
    #[test_case(&json!({"multipleOf": 2}), &json!(4.5))]
    #[test_case(&json!({"multipleOf": 0.5}), &json!(1.25))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test_case(&json!({"minimum": 5, "exclusiveMinimum": true}), &json!(5), "json-schema:///#/exclusiveMinimum")]
    #[test_case(&json!({"maximum": 5}), &json!(6), "json-schema:///#/maximum")]
    #[test_case(&json!({"multipleOf": 3}), &json!(5), "json-schema:///#/multipleOf")]
    fn schema_location(schema: &Value, instance: &Value, expected: &str) {
        tests_util::assert_schema_location(schema, instance, expected);
    }

    #[test]
    fn exclusive_flag_message() {
        tests_util::expect_errors(
            &json!({"minimum": 5, "exclusiveMinimum": true}),
            &json!(5),
            &["5 is less than or equal to the minimum of 5"],
        );
    }

    #[test_case(&json!({"multipleOf": 0}))]
    #[test_case(&json!({"multipleOf": -2}))]
    #[test_case(&json!({"minimum": "1"}))]
    fn invalid_limits(schema: &Value) {
        let error = crate::compile(schema).expect_err("Invalid limit");
        assert!(matches!(error, CompileError::InvalidKeyword { .. }));
    }
}
