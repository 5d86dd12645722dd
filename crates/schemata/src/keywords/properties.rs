//! Keywords applying subschemas to object properties.
//!
//! Whether `additionalProperties` and `unevaluatedProperties` see a key depends on which of the
//! other keywords claimed it, so all of them are evaluated together, key by key.
use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::{
    compiler::{self, Context},
    error::{CompileError, Keyword},
    evaluation::{ErrorHandler, ValidationResult},
    keywords::{
        helpers::{compile_schema_map, compile_subschema, expect_object, Subschema},
        CompilationResult,
    },
    node::ObjectId,
    paths::LazyLocation,
    regex::Pattern,
    validator::{BoxedValidator, Validate, ValidationContext},
};

/// Maps with fewer entries are scanned linearly.
const BIG_MAP_THRESHOLD: usize = 40;

enum PropertyMap {
    Small(Vec<(String, ObjectId)>),
    Big(AHashMap<String, ObjectId>),
}

impl PropertyMap {
    fn new(properties: Vec<(String, ObjectId)>) -> Self {
        if properties.len() < BIG_MAP_THRESHOLD {
            PropertyMap::Small(properties)
        } else {
            PropertyMap::Big(properties.into_iter().collect())
        }
    }

    #[inline]
    fn get(&self, property: &str) -> Option<ObjectId> {
        match self {
            PropertyMap::Small(properties) => properties
                .iter()
                .find(|(name, _)| name == property)
                .map(|(_, node)| *node),
            PropertyMap::Big(properties) => properties.get(property).copied(),
        }
    }
}

/// Keys a conditionally applied subschema evaluates.
struct Claims {
    names: Vec<String>,
    patterns: Vec<Pattern>,
    everything: bool,
}

impl Claims {
    fn of(ctx: &Context<'_>, schema: &Value) -> Result<Claims, CompileError> {
        let mut claims = Claims {
            names: Vec::new(),
            patterns: Vec::new(),
            everything: false,
        };
        let Value::Object(schema) = schema else {
            return Ok(claims);
        };
        if let Some(Value::Object(properties)) = schema.get("properties") {
            claims.names.extend(properties.keys().cloned());
        }
        if let Some(Value::Object(patterns)) = schema.get("patternProperties") {
            for pattern in patterns.keys() {
                claims
                    .patterns
                    .push(ctx.compile_pattern("patternProperties", pattern)?);
            }
        }
        claims.everything = schema.contains_key("additionalProperties")
            || schema.contains_key("unevaluatedProperties");
        Ok(claims)
    }

    fn contains(&self, key: &str) -> bool {
        self.everything
            || self.names.iter().any(|name| name == key)
            || self.patterns.iter().any(|pattern| pattern.is_match(key))
    }
}

/// A subschema applied to the whole object once `trigger` is present.
struct Dependent {
    trigger: String,
    node: ObjectId,
    claims: Claims,
}

struct PropertyNames {
    node: ObjectId,
    error: ErrorHandler,
}

pub(crate) struct PropertiesValidator {
    properties: PropertyMap,
    /// Properties whose subschema carries `required: true`.
    required: Vec<(String, ErrorHandler)>,
    patterns: Vec<(Pattern, ObjectId)>,
    additional: Option<Subschema>,
    names: Option<PropertyNames>,
    dependents: Vec<Dependent>,
    unevaluated: Option<Subschema>,
}

impl PropertiesValidator {
    /// Whether a triggered dependent subschema evaluates `key`.
    fn is_claimed(&self, item: &Map<String, Value>, key: &str) -> bool {
        self.dependents
            .iter()
            .any(|dependent| item.contains_key(&dependent.trigger) && dependent.claims.contains(key))
    }
}

impl Validate for PropertiesValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        let Value::Object(item) = instance else {
            return true;
        };
        if !self.required.iter().all(|(name, _)| item.contains_key(name)) {
            return false;
        }
        for (key, value) in item {
            let mut matched = false;
            if let Some(node) = self.properties.get(key) {
                if !node.is_valid(value, ctx) {
                    return false;
                }
                matched = true;
            }
            for (pattern, node) in &self.patterns {
                if pattern.is_match(key) {
                    if !node.is_valid(value, ctx) {
                        return false;
                    }
                    matched = true;
                }
            }
            if !matched {
                if let Some(additional) = &self.additional {
                    if !additional.is_valid(value, ctx) {
                        return false;
                    }
                    matched = true;
                }
            }
            if let Some(names) = &self.names {
                if !names.node.is_valid(&Value::String(key.clone()), ctx) {
                    return false;
                }
            }
            if !matched && !self.is_claimed(item, key) {
                if let Some(unevaluated) = &self.unevaluated {
                    if !unevaluated.is_valid(value, ctx) {
                        return false;
                    }
                }
            }
        }
        self.dependents.iter().all(|dependent| {
            !item.contains_key(&dependent.trigger) || dependent.node.is_valid(instance, ctx)
        })
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
        for (name, error) in &self.required {
            if !item.contains_key(name) {
                valid &= error.report_key(ctx, instance, location, name.as_str());
            }
        }
        for (key, value) in item {
            let mut result = ValidationResult::default();
            if let Some(node) = self.properties.get(key) {
                result.add_match(node.validate(value, &location.push(key), ctx));
            }
            for (pattern, node) in &self.patterns {
                if pattern.is_match(key) {
                    result.add_match(node.validate(value, &location.push(key), ctx));
                }
            }
            if !result.is_matched() {
                if let Some(additional) = &self.additional {
                    result.add_match(additional.validate_key(value, location, key, ctx));
                }
            }
            valid &= result.is_valid();
            if let Some(names) = &self.names {
                if !names.node.is_valid(&Value::String(key.clone()), ctx) {
                    valid &= names.error.report_key(ctx, instance, location, key.as_str());
                }
            }
            if !result.is_matched() && !self.is_claimed(item, key) {
                if let Some(unevaluated) = &self.unevaluated {
                    valid &= unevaluated.validate_key(value, location, key, ctx);
                }
            }
        }
        for dependent in &self.dependents {
            if item.contains_key(&dependent.trigger) {
                valid &= dependent.node.validate(instance, location, ctx);
            }
        }
        valid
    }
}

fn compile_patterns<'a>(
    ctx: &Context<'a>,
    value: &'a Value,
) -> Result<Vec<(Pattern, ObjectId)>, CompileError> {
    let map = expect_object(ctx, "patternProperties", value)?;
    let patterns_ctx = ctx.new_at_location("patternProperties");
    let mut patterns = Vec::with_capacity(map.len());
    for (pattern, subschema) in map {
        patterns.push((
            ctx.compile_pattern("patternProperties", pattern)?,
            compiler::compile(&patterns_ctx.new_at_location(pattern), subschema)?,
        ));
    }
    Ok(patterns)
}

fn compile_dependents<'a>(
    ctx: &Context<'a>,
    keyword: &'static str,
    value: &'a Value,
    dependents: &mut Vec<Dependent>,
) -> CompilationResult {
    let map = expect_object(ctx, keyword, value)?;
    let keyword_ctx = ctx.new_at_location(keyword);
    for (trigger, subschema) in map {
        // Array-valued `dependencies` are property lists
        if subschema.is_array() && keyword == "dependencies" {
            continue;
        }
        dependents.push(Dependent {
            trigger: trigger.clone(),
            node: compiler::compile(&keyword_ctx.new_at_location(trigger), subschema)?,
            claims: Claims::of(ctx, subschema)?,
        });
    }
    Ok(())
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let mut properties = Vec::new();
    let mut required = Vec::new();
    if let Some(value) = schema.get("properties") {
        properties = compile_schema_map(ctx, "properties", value)?;
        let location = ctx.location().join("properties");
        for (name, subschema) in expect_object(ctx, "properties", value)? {
            if subschema.get("required") == Some(&Value::Bool(true)) {
                let error = ErrorHandler::new(
                    location.join(name).join("required"),
                    Keyword::Single("required"),
                    Value::Bool(true),
                );
                required.push((name.clone(), error));
            }
        }
    }
    let patterns = schema
        .get("patternProperties")
        .map(|value| compile_patterns(ctx, value))
        .transpose()?
        .unwrap_or_default();
    let additional = schema
        .get("additionalProperties")
        .map(|value| Subschema::compile(ctx, "additionalProperties", value))
        .transpose()?;
    let names = schema
        .get("propertyNames")
        .map(|value| {
            Ok::<_, CompileError>(PropertyNames {
                node: compile_subschema(ctx, "propertyNames", value)?,
                error: ctx.error_handler("propertyNames", value.clone()),
            })
        })
        .transpose()?;
    let mut dependents = Vec::new();
    for keyword in ["dependentSchemas", "dependencies"] {
        if let Some(value) = schema.get(keyword) {
            compile_dependents(ctx, keyword, value, &mut dependents)?;
        }
    }
    let unevaluated = schema
        .get("unevaluatedProperties")
        .map(|value| Subschema::compile(ctx, "unevaluatedProperties", value))
        .transpose()?;
    if properties.is_empty()
        && patterns.is_empty()
        && additional.is_none()
        && names.is_none()
        && dependents.is_empty()
        && unevaluated.is_none()
    {
        return Ok(());
    }
    validators.push(Box::new(PropertiesValidator {
        properties: PropertyMap::new(properties),
        required,
        patterns,
        additional,
        names,
        dependents,
        unevaluated,
    }));
    Ok(())
}
