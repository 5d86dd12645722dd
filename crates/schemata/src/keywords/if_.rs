use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    error::CompileError,
    evaluation::ErrorHandler,
    keywords::{helpers::compile_subschema, CompilationResult},
    node::ObjectId,
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

struct Branch {
    node: ObjectId,
    error: ErrorHandler,
}

impl Branch {
    fn compile<'a>(
        ctx: &Context<'a>,
        keyword: &'static str,
        keywords: &'static [&'static str],
        schema: &'a Value,
    ) -> Result<Branch, CompileError> {
        Ok(Branch {
            node: compile_subschema(ctx, keyword, schema)?,
            error: ctx.error_handler_for(keywords, schema.clone()),
        })
    }

    /// The branch's own errors are kept, followed by one error for the conditional itself.
    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        self.node.validate(instance, location, ctx) || self.error.report(ctx, instance, location)
    }
}

/// `if` with `then`, `else` or both. A missing branch accepts everything.
pub(crate) struct IfValidator {
    condition: ObjectId,
    then: Option<Branch>,
    otherwise: Option<Branch>,
}

impl IfValidator {
    fn branch(&self, instance: &Value, ctx: &ValidationContext<'_>) -> Option<&Branch> {
        if self.condition.is_valid(instance, ctx) {
            self.then.as_ref()
        } else {
            self.otherwise.as_ref()
        }
    }
}

impl Validate for IfValidator {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        self.branch(instance, ctx)
            .is_none_or(|branch| branch.node.is_valid(instance, ctx))
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        match self.branch(instance, ctx) {
            Some(branch) => branch.validate(instance, location, ctx),
            None => true,
        }
    }
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    let Some(condition) = schema.get("if") else {
        return Ok(());
    };
    let then = schema
        .get("then")
        .map(|then| Branch::compile(ctx, "then", &["if", "then"], then))
        .transpose()?;
    let otherwise = schema
        .get("else")
        .map(|otherwise| Branch::compile(ctx, "else", &["if", "else"], otherwise))
        .transpose()?;
    if then.is_none() && otherwise.is_none() {
        return Ok(());
    }
    validators.push(Box::new(IfValidator {
        condition: compile_subschema(ctx, "if", condition)?,
        then,
        otherwise,
    }));
    Ok(())
}
