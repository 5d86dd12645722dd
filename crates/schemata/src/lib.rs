//! A JSON-Schema-style validator compiler.
//!
//! Schemas are compiled once into a [`Validator`] that can be shared between threads and used to
//! check any number of instances:
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json!({
//!     "$defs": {"node": {"properties": {"children": {"items": {"$ref": "#/$defs/node"}}}}},
//!     "$ref": "#/$defs/node"
//! });
//! let validator = schemata::compile(&schema).expect("Valid schema");
//! assert!(validator.is_valid(&json!({"children": [{"children": []}]})));
//! assert!(!validator.is_valid(&json!({"children": [{"children": 1}]})));
//! ```
//!
//! Use [`Validator::validate`] to get every violation instead of a boolean:
//!
//! ```
//! use serde_json::json;
//!
//! let validator = schemata::compile(&json!({"required": ["a", "b"]})).expect("Valid schema");
//! let errors = validator.validate(&json!({})).expect_err("Both properties are missing");
//! assert_eq!(errors.len(), 2);
//! for error in &errors {
//!     println!("{}: {error}", error.instance_path());
//! }
//! ```
//!
//! Documents referenced by other schemas, formats and the regular expression engine are
//! configured on a [`Compiler`].
mod compiler;
mod error;
mod evaluation;
mod ext;
mod formats;
mod keywords;
mod node;
mod options;
mod paths;
mod regex;
mod types;
mod validator;

pub use error::{CompileError, Keyword, ValidationError, ValidationErrors};
pub use formats::{string_format, Format, FormatCheck, Formats, StringFormat};
pub use options::{Compiler, PatternEngine, DEFAULT_META_SCHEMA};
pub use paths::{LazyLocation, Location, LocationSegment};
pub use referencing::AnchorScope;
pub use types::{JsonType, JsonTypeSet};
pub use validator::Validator;

use serde_json::Value;

/// Compile `schema` with the default configuration.
///
/// # Errors
///
/// If the schema is structurally invalid or a reference can not be resolved.
pub fn compile(schema: &Value) -> Result<Validator, CompileError> {
    Compiler::new().compile(schema)
}

/// Validate `instance` against `schema` in one go.
///
/// ```
/// use serde_json::json;
///
/// assert!(schemata::is_valid(&json!({"maxLength": 5}), &json!("foo")));
/// ```
///
/// # Panics
///
/// This function panics if an invalid schema is passed.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    compile(schema)
        .expect("Invalid schema")
        .is_valid(instance)
}

/// A [`Compiler`] to register documents, formats and options on.
#[must_use]
pub fn compiler() -> Compiler {
    Compiler::new()
}

#[cfg(test)]
pub(crate) mod tests_util {
    use serde_json::Value;

    use crate::Validator;

    fn compile(schema: &Value) -> Validator {
        crate::compile(schema).expect("Invalid schema")
    }

    #[track_caller]
    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        let validator = compile(schema);
        assert!(
            validator.is_valid(instance),
            "{instance} should be valid (via is_valid)"
        );
        assert!(
            validator.validate(instance).is_ok(),
            "{instance} should be valid (via validate)"
        );
        assert_eq!(validator.iter_errors(instance).count(), 0);
    }

    #[track_caller]
    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        let validator = compile(schema);
        assert!(
            !validator.is_valid(instance),
            "{instance} should not be valid (via is_valid)"
        );
        let errors = validator
            .validate(instance)
            .expect_err("Should not be valid (via validate)");
        assert!(!errors.is_empty());
    }

    /// Messages of every error, in the order they were reported.
    #[track_caller]
    pub(crate) fn expect_errors(schema: &Value, instance: &Value, expected: &[&str]) {
        let errors = compile(schema)
            .validate(instance)
            .expect_err("Should not be valid");
        let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages, expected);
    }

    #[track_caller]
    pub(crate) fn assert_schema_location(schema: &Value, instance: &Value, expected: &str) {
        let errors = compile(schema)
            .validate(instance)
            .expect_err("Should not be valid");
        let error = errors.iter().next().expect("Errors are not empty");
        assert_eq!(error.schema_location().as_str(), expected);
    }
}
