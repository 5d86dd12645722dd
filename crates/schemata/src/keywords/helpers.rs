#![allow(clippy::float_cmp, clippy::cast_sign_loss)]

use serde_json::{Map, Value};

use crate::{
    compiler::{self, Context},
    error::CompileError,
    evaluation::ErrorHandler,
    node::ObjectId,
    paths::{LazyLocation, LocationSegment},
    validator::ValidationContext,
};

/// Read a keyword holding a non-negative integer. Integral floats like `2.0` are accepted.
#[inline]
pub(crate) fn map_get_u64(
    ctx: &Context<'_>,
    schema: &Map<String, Value>,
    keyword: &'static str,
) -> Result<Option<u64>, CompileError> {
    let Some(value) = schema.get(keyword) else {
        return Ok(None);
    };
    if let Some(limit) = value.as_u64() {
        return Ok(Some(limit));
    }
    if let Some(limit) = value.as_f64() {
        if limit >= 0.0 && limit.trunc() == limit {
            // NOTE: Imprecise cast as big integers are not supported
            #[allow(clippy::cast_possible_truncation)]
            return Ok(Some(limit as u64));
        }
    }
    Err(ctx.invalid_keyword(keyword, "must be a non-negative integer"))
}

/// Read a pair of count bounds and reject an upper bound below the lower one.
pub(crate) fn map_get_bounds(
    ctx: &Context<'_>,
    schema: &Map<String, Value>,
    min_keyword: &'static str,
    max_keyword: &'static str,
) -> Result<(Option<u64>, Option<u64>), CompileError> {
    let min = map_get_u64(ctx, schema, min_keyword)?;
    let max = map_get_u64(ctx, schema, max_keyword)?;
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            return Err(CompileError::InvalidBounds {
                location: ctx.location().clone(),
                min_keyword,
                min,
                max_keyword,
                max,
            });
        }
    }
    Ok((min, max))
}

pub(crate) fn expect_object<'a>(
    ctx: &Context<'_>,
    keyword: &'static str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, CompileError> {
    value
        .as_object()
        .ok_or_else(|| ctx.invalid_keyword(keyword, "must be an object"))
}

/// Compile the subschema held directly by `keyword`.
pub(crate) fn compile_subschema<'a>(
    ctx: &Context<'a>,
    keyword: &'static str,
    schema: &'a Value,
) -> Result<ObjectId, CompileError> {
    let ctx = ctx.new_at_location(keyword);
    compiler::compile(&ctx, schema)
}

/// Compile the non-empty array of subschemas held by `keyword`.
pub(crate) fn compile_subschemas<'a>(
    ctx: &Context<'a>,
    keyword: &'static str,
    schema: &'a Value,
) -> Result<Vec<ObjectId>, CompileError> {
    let items = match schema {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(ctx.invalid_keyword(keyword, "must be a non-empty array")),
    };
    let ctx = ctx.new_at_location(keyword);
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| compiler::compile(&ctx.new_at_location(idx), item))
        .collect()
}

/// Compile a property name to subschema mapping held by `keyword`.
pub(crate) fn compile_schema_map<'a>(
    ctx: &Context<'a>,
    keyword: &'static str,
    schema: &'a Value,
) -> Result<Vec<(String, ObjectId)>, CompileError> {
    let map = expect_object(ctx, keyword, schema)?;
    let ctx = ctx.new_at_location(keyword);
    let mut compiled = Vec::with_capacity(map.len());
    for (key, subschema) in map {
        compiled.push((key.clone(), compiler::compile(&ctx.new_at_location(key), subschema)?));
    }
    Ok(compiled)
}

/// A subschema applied to single items or properties.
///
/// A `false` subschema is not compiled: the owning keyword reports the item itself, so the
/// error names the keyword and the offending key.
pub(crate) enum Subschema {
    Forbidden(ErrorHandler),
    Node(ObjectId),
}

impl Subschema {
    pub(crate) fn compile<'a>(
        ctx: &Context<'a>,
        keyword: &'static str,
        schema: &'a Value,
    ) -> Result<Subschema, CompileError> {
        if schema == &Value::Bool(false) {
            return Ok(Subschema::Forbidden(
                ctx.error_handler(keyword, Value::Bool(false)),
            ));
        }
        compile_subschema(ctx, keyword, schema).map(Subschema::Node)
    }

    #[inline]
    pub(crate) fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        match self {
            Subschema::Forbidden(_) => false,
            Subschema::Node(node) => node.is_valid(instance, ctx),
        }
    }

    /// Validate `item`, found under `key` of the value at `location`.
    pub(crate) fn validate_key<'k>(
        &self,
        item: &Value,
        location: &LazyLocation<'_>,
        key: impl Into<LocationSegment<'k>>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        let key = key.into();
        let location = location.push(key);
        match self {
            Subschema::Forbidden(handler) => {
                let key = match key {
                    LocationSegment::Property(name) => name.to_string(),
                    LocationSegment::Index(idx) => idx.to_string(),
                };
                handler.report_key(ctx, item, &location, key)
            }
            Subschema::Node(node) => node.validate(item, &location, ctx),
        }
    }
}
