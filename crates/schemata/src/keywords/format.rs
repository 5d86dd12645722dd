use serde_json::{Map, Value};

use crate::{
    compiler::Context,
    error::CompileError,
    evaluation::ErrorHandler,
    formats::FormatCheck,
    keywords::CompilationResult,
    paths::LazyLocation,
    validator::{BoxedValidator, Validate, ValidationContext},
};

pub(crate) struct FormatValidator {
    check: Box<dyn FormatCheck>,
    error: ErrorHandler,
}

impl Validate for FormatValidator {
    #[inline]
    fn is_valid(&self, instance: &Value, _: &ValidationContext<'_>) -> bool {
        self.check.is_valid(instance)
    }

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        self.check.is_valid(instance) || self.error.report(ctx, instance, location)
    }
}

pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
    validators: &mut Vec<BoxedValidator>,
) -> CompilationResult {
    if !ctx.validate_formats() {
        return Ok(());
    }
    let Some(value) = schema.get("format") else {
        return Ok(());
    };
    let Value::String(name) = value else {
        return Err(ctx.invalid_keyword("format", "must be a string"));
    };
    let Some(format) = ctx.formats().get(name) else {
        return Err(CompileError::UnknownFormat {
            location: ctx.location().join("format"),
            name: name.clone(),
        });
    };
    if let Some(check) = format.compile(schema) {
        validators.push(Box::new(FormatValidator {
            check,
            error: ctx.error_handler("format", value.clone()),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::CompileError, string_format, tests_util, Compiler, Format, FormatCheck, Formats};
    use serde_json::{json, Map, Value};
    use test_case::test_case;

    #[test_case(&json!({"format": "date"}), &json!("2024-02-29"))]
    #[test_case(&json!({"format": "email"}), &json!("user@example.com"))]
    #[test_case(&json!({"format": "ipv4"}), &json!("127.0.0.1"))]
    #[test_case(&json!({"format": "uuid"}), &json!("67e55044-10b1-426f-9247-bb680e5fe0c8"))]
    #[test_case(&json!({"format": "int8"}), &json!(-128))]
    #[test_case(&json!({"format": "date"}), &json!(20240229))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"format": "date"}), &json!("2023-02-29"))]
    #[test_case(&json!({"format": "ipv4"}), &json!("256.0.0.1"))]
    #[test_case(&json!({"format": "int8"}), &json!(128))]
    #[test_case(&json!({"format": "uint32"}), &json!(-1))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn unknown_format() {
        let error = crate::compile(&json!({"format": "currency"})).expect_err("Not registered");
        assert!(matches!(error, CompileError::UnknownFormat { ref name, .. } if name == "currency"));
    }

    #[test]
    fn disabled_formats_accept_anything() {
        let validator = Compiler::new()
            .should_validate_formats(false)
            .compile(&json!({"format": "currency"}))
            .expect("Formats are not checked");
        assert!(validator.is_valid(&json!("anything")));
    }

    #[test]
    fn custom_format() {
        let validator = Compiler::new()
            .add_format("even-length", string_format(|value| value.len() % 2 == 0))
            .compile(&json!({"format": "even-length"}))
            .expect("Registered format");
        assert!(validator.is_valid(&json!("ab")));
        assert!(!validator.is_valid(&json!("abc")));
        assert!(validator.is_valid(&json!(3)));
    }

    struct Divisible;

    impl Format for Divisible {
        fn compile(&self, schema: &Map<String, Value>) -> Option<Box<dyn FormatCheck>> {
            // The divisor is read from a sibling keyword of the compiled node
            let divisor = schema.get("divisor")?.as_u64()?;
            Some(Box::new(move |instance: &Value| {
                instance.as_u64().map_or(true, |value| value % divisor == 0)
            }))
        }
    }

    #[test]
    fn formats_see_their_schema_node() {
        let mut formats = Formats::new();
        formats.insert("divisible", Divisible);
        let compiler = {
            let mut compiler = Compiler::new();
            compiler.with_formats(formats);
            compiler
        };
        let validator = compiler
            .compile(&json!({"format": "divisible", "divisor": 3}))
            .expect("Registered format");
        assert!(validator.is_valid(&json!(9)));
        assert!(!validator.is_valid(&json!(10)));
        let unconstrained = compiler
            .compile(&json!({"format": "divisible"}))
            .expect("Registered format");
        assert!(unconstrained.is_valid(&json!(10)));
        assert!(compiler.compile(&json!({"format": "date"})).is_err());
    }
}
