//! Keywords applying subschemas to array items.
//!
//! `prefixItems`, `items`, `additionalItems`, `contains` and `unevaluatedItems` are compiled
//! into one validator, so every item is visited once no matter how many of them are present.
use serde_json::{Map, Value};

use crate::{
    compiler::{self, Context},
    error::CompileError,
    evaluation::ErrorHandler,
    keywords::{
        helpers::{compile_subschema, compile_subschemas, map_get_u64, Subschema},
        CompilationResult,
    },
    node::ObjectId,
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

struct Contains {
    node: ObjectId,
    min: u64,
    max: Option<u64>,
    min_error: ErrorHandler,
    max_error: Option<ErrorHandler>,
}

impl Contains {
    fn compile<'a>(
        ctx: &Context<'a>,
        schema: &'a Map<String, Value>,
        subschema: &'a Value,
    ) -> Result<Contains, CompileError> {
        let node = compile_subschema(ctx, "contains", subschema)?;
        let max = map_get_u64(ctx, schema, "maxContains")?;
        let (min, min_error) = match map_get_u64(ctx, schema, "minContains")? {
            Some(min) => (min, ctx.error_handler("minContains", min.into())),
            None => (1, ctx.error_handler("contains", subschema.clone())),
        };
        Ok(Contains {
            node,
            min,
            max,
            min_error,
            max_error: max.map(|max| ctx.error_handler("maxContains", max.into())),
        })
    }
}

pub(crate) struct ItemsValidator {
    prefix: Vec<ObjectId>,
    overflow: Option<Subschema>,
    contains: Option<Contains>,
    unevaluated: Option<Subschema>,
}

impl Validate for ItemsValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        let Value::Array(items) = instance else {
            return true;
        };
        let mut matched = 0_u64;
        for (idx, item) in items.iter().enumerate() {
            let evaluated = if let Some(node) = self.prefix.get(idx) {
                if !node.is_valid(item, ctx) {
                    return false;
                }
                true
            } else if let Some(overflow) = &self.overflow {
                if !overflow.is_valid(item, ctx) {
                    return false;
                }
                true
            } else {
                false
            };
            let mut contained = false;
            if let Some(contains) = &self.contains {
                if contains.node.is_valid(item, ctx) {
                    matched += 1;
                    contained = true;
                    if contains.max.is_some_and(|max| matched > max) {
                        return false;
                    }
                }
            }
            if !evaluated && !contained {
                if let Some(unevaluated) = &self.unevaluated {
                    if !unevaluated.is_valid(item, ctx) {
                        return false;
                    }
                }
            }
        }
        self.contains
            .as_ref()
            .is_none_or(|contains| matched >= contains.min)
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        let Value::Array(items) = instance else {
            return true;
        };
        let mut valid = true;
        let mut matched = 0_u64;
        for (idx, item) in items.iter().enumerate() {
            let evaluated = if let Some(node) = self.prefix.get(idx) {
                valid &= node.validate(item, &location.push(idx), ctx);
                true
            } else if let Some(overflow) = &self.overflow {
                valid &= overflow.validate_key(item, location, idx, ctx);
                true
            } else {
                false
            };
            let contained = self
                .contains
                .as_ref()
                .is_some_and(|contains| contains.node.is_valid(item, ctx));
            if contained {
                matched += 1;
            }
            if !evaluated && !contained {
                if let Some(unevaluated) = &self.unevaluated {
                    valid &= unevaluated.validate_key(item, location, idx, ctx);
                }
            }
        }
        if let Some(contains) = &self.contains {
            if matched < contains.min {
                valid &= contains.min_error.report(ctx, instance, location);
            }
            if let (Some(max), Some(error)) = (contains.max, &contains.max_error) {
                if matched > max {
                    valid &= error.report(ctx, instance, location);
                }
            }
        }
        valid
    }
}

/// Compile a possibly empty tuple of per-index subschemas.
fn compile_tuple<'a>(
    ctx: &Context<'a>,
    keyword: &'static str,
    items: &'a [Value],
) -> Result<Vec<ObjectId>, CompileError> {
    let ctx = ctx.new_at_location(keyword);
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| compiler::compile(&ctx.new_at_location(idx), item))
        .collect()
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let (prefix, overflow) = if let Some(prefix_items) = schema.get("prefixItems") {
        let prefix = compile_subschemas(ctx, "prefixItems", prefix_items)?;
        let overflow = schema
            .get("items")
            .map(|items| Subschema::compile(ctx, "items", items))
            .transpose()?;
        (prefix, overflow)
    } else {
        match schema.get("items") {
            Some(Value::Array(items)) => {
                let prefix = compile_tuple(ctx, "items", items)?;
                let overflow = schema
                    .get("additionalItems")
                    .map(|additional| Subschema::compile(ctx, "additionalItems", additional))
                    .transpose()?;
                (prefix, overflow)
            }
            Some(items) => (Vec::new(), Some(Subschema::compile(ctx, "items", items)?)),
            None => (Vec::new(), None),
        }
    };
    let contains = schema
        .get("contains")
        .map(|subschema| Contains::compile(ctx, schema, subschema))
        .transpose()?;
    let unevaluated = schema
        .get("unevaluatedItems")
        .map(|unevaluated| Subschema::compile(ctx, "unevaluatedItems", unevaluated))
        .transpose()?;
    if prefix.is_empty() && overflow.is_none() && contains.is_none() && unevaluated.is_none() {
        return Ok(());
    }
    validators.push(Box::new(ItemsValidator {
        prefix,
        overflow,
        contains,
        unevaluated,
    }));
    Ok(())
}
