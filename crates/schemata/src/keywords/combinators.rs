//! `allOf`, `anyOf`, `oneOf` and `not`.
//!
//! Branches are only checked with `is_valid`: a failing combinator reports one error of its own
//! no matter how many branches failed.
use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    evaluation::ErrorHandler,
    keywords::{
        helpers::{compile_subschema, compile_subschemas},
        CompilationResult,
    },
    node::ObjectId,
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct AllOfValidator {
    schemas: Vec<ObjectId>,
    error: ErrorHandler,
}

impl Validate for AllOfValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        self.schemas.iter().all(|node| node.is_valid(instance, ctx))
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        match self
            .schemas
            .iter()
            .position(|node| !node.is_valid(instance, ctx))
        {
            Some(idx) => self
                .error
                .report_with(ctx, instance, location, None, Some(idx.into())),
            None => true,
        }
    }
}

pub(crate) struct AnyOfValidator {
    schemas: Vec<ObjectId>,
    error: ErrorHandler,
}

impl Validate for AnyOfValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        self.schemas.iter().any(|node| node.is_valid(instance, ctx))
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

pub(crate) struct OneOfValidator {
    schemas: Vec<ObjectId>,
    error: ErrorHandler,
}

impl OneOfValidator {
    /// Indices of the first two matching branches.
    fn matches(&self, instance: &Value, ctx: &ValidationContext<'_>) -> (Option<usize>, Option<usize>) {
        let mut found = None;
        for (idx, node) in self.schemas.iter().enumerate() {
            if node.is_valid(instance, ctx) {
                if found.is_some() {
                    return (found, Some(idx));
                }
                found = Some(idx);
            }
        }
        (found, None)
    }
}

impl Validate for OneOfValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        matches!(self.matches(instance, ctx), (Some(_), None))
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        match self.matches(instance, ctx) {
            (Some(_), None) => true,
            (Some(first), Some(second)) => self.error.report_with(
                ctx,
                instance,
                location,
                None,
                Some(Value::Array(vec![first.into(), second.into()])),
            ),
            _ => self.error.report(ctx, instance, location),
        }
    }
}

pub(crate) struct NotValidator {
    node: ObjectId,
    error: ErrorHandler,
}

impl Validate for NotValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        !self.node.is_valid(instance, ctx)
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
    if let Some(value) = schema.get("allOf") {
        validators.push(Box::new(AllOfValidator {
            schemas: compile_subschemas(ctx, "allOf", value)?,
            error: ctx.error_handler("allOf", value.clone()),
        }));
    }
    if let Some(value) = schema.get("anyOf") {
        validators.push(Box::new(AnyOfValidator {
            schemas: compile_subschemas(ctx, "anyOf", value)?,
            error: ctx.error_handler("anyOf", value.clone()),
        }));
    }
    if let Some(value) = schema.get("oneOf") {
        validators.push(Box::new(OneOfValidator {
            schemas: compile_subschemas(ctx, "oneOf", value)?,
            error: ctx.error_handler("oneOf", value.clone()),
        }));
    }
    if let Some(value) = schema.get("not") {
        validators.push(Box::new(NotValidator {
            node: compile_subschema(ctx, "not", value)?,
            error: ctx.error_handler("not", value.clone()),
        }));
    }
    Ok(())
}
