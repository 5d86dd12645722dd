//! Errors raised while compiling schemas and violations reported while validating instances.
use std::{fmt, slice, vec};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::paths::Location;

/// A structural problem that makes a schema impossible to compile.
///
/// These are never recovered from: they indicate a bug in the schema (or, for
/// [`CompileError::ObjectAlreadyCreated`] and [`CompileError::UnboundReference`], in this crate).
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CompileError {
    /// A schema node is neither a boolean nor an object.
    #[error("Schema at '{location}' must be a boolean or an object, got {value}")]
    InvalidSchema { location: Location, value: Value },
    /// A keyword value has the wrong shape.
    #[error("Invalid '{keyword}' at '{location}': {reason}")]
    InvalidKeyword {
        location: Location,
        keyword: &'static str,
        reason: String,
    },
    /// An upper bound is smaller than the matching lower bound.
    #[error("'{max_keyword}' ({max}) is less than '{min_keyword}' ({min}) at '{location}'")]
    InvalidBounds {
        location: Location,
        min_keyword: &'static str,
        min: u64,
        max_keyword: &'static str,
        max: u64,
    },
    #[error("Unknown type '{name}' at '{location}'")]
    UnknownType { location: Location, name: String },
    #[error("Empty type list at '{location}'")]
    EmptyTypeList { location: Location },
    #[error("Unknown format '{name}' at '{location}'")]
    UnknownFormat { location: Location, name: String },
    /// The same structural path was compiled twice.
    #[error("Object at '{location}' is already created")]
    ObjectAlreadyCreated { location: Location },
    /// A `$ref` slot was never bound to its target.
    #[error("Reference at '{location}' was never bound")]
    UnboundReference { location: Location },
    /// A chain of `$ref` nodes leads back to itself without applying any keyword.
    #[error("Circular reference at '{location}'")]
    CircularReference { location: Location },
    #[error(transparent)]
    Reference(#[from] referencing::Error),
}

impl CompileError {
    pub(crate) fn invalid_keyword(
        location: Location,
        keyword: &'static str,
        reason: impl Into<String>,
    ) -> CompileError {
        CompileError::InvalidKeyword {
            location,
            keyword,
            reason: reason.into(),
        }
    }
}

/// Keyword (or keywords) responsible for a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Keyword {
    Single(&'static str),
    /// Keywords that only fail together, like `if` and `then`.
    Set(&'static [&'static str]),
}

impl Keyword {
    /// The keyword that determines the error message.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Single(name) => name,
            Keyword::Set(names) => names.last().copied().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        match self {
            Keyword::Single(name) => *name == keyword,
            Keyword::Set(names) => names.contains(&keyword),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Single(name) => f.write_str(name),
            Keyword::Set(names) => f.write_str(&names.join("/")),
        }
    }
}

/// A single violation found while validating an instance.
///
/// Serialized as `{timestamp, schemaObject, keyword, expectedValue, dataKey, instancePath,
/// actualValue, extra}`, where `timestamp` is the creation order within one `validate` call and
/// `schemaObject` is the location of the failing keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(rename = "timestamp")]
    pub(crate) order: usize,
    #[serde(rename = "schemaObject")]
    pub(crate) schema_location: Location,
    pub(crate) keyword: Keyword,
    #[serde(rename = "expectedValue")]
    pub(crate) expected: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data_key: Option<String>,
    pub(crate) instance_path: Location,
    #[serde(rename = "actualValue")]
    pub(crate) instance: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) extra: Option<Value>,
}

impl ValidationError {
    /// Position of this error among all errors reported by the same `validate` call.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }
    /// Location of the failing keyword inside the schema.
    #[must_use]
    pub fn schema_location(&self) -> &Location {
        &self.schema_location
    }
    #[must_use]
    pub fn keyword(&self) -> Keyword {
        self.keyword
    }
    /// The keyword value the instance was checked against.
    #[must_use]
    pub fn expected(&self) -> &Value {
        &self.expected
    }
    /// Property name or array index the error is about, for keywords checked per key.
    #[must_use]
    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref()
    }
    /// Location of the failing value inside the instance.
    #[must_use]
    pub fn instance_path(&self) -> &Location {
        &self.instance_path
    }
    /// The failing value.
    #[must_use]
    pub fn instance(&self) -> &Value {
        &self.instance
    }
    #[must_use]
    pub fn extra(&self) -> Option<&Value> {
        self.extra.as_ref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.data_key.as_deref().unwrap_or_default();
        let instance = &self.instance;
        let expected = &self.expected;
        match self.keyword.name() {
            "type" => write!(f, "{instance} is not of type {expected}"),
            "enum" => write!(f, "{instance} is not one of {expected}"),
            "const" => write!(f, "{expected} was expected"),
            "minimum" => write!(f, "{instance} is less than the minimum of {expected}"),
            "maximum" => write!(f, "{instance} is greater than the maximum of {expected}"),
            "exclusiveMinimum" => write!(
                f,
                "{instance} is less than or equal to the minimum of {expected}"
            ),
            "exclusiveMaximum" => write!(
                f,
                "{instance} is greater than or equal to the maximum of {expected}"
            ),
            "multipleOf" => write!(f, "{instance} is not a multiple of {expected}"),
            "minLength" => write!(f, "{instance} is shorter than {expected} characters"),
            "maxLength" => write!(f, "{instance} is longer than {expected} characters"),
            "pattern" => write!(f, "{instance} does not match {expected}"),
            "format" => write!(f, "{instance} is not a {expected}"),
            "minItems" => write!(f, "{instance} has less than {expected} items"),
            "maxItems" => write!(f, "{instance} has more than {expected} items"),
            "uniqueItems" => write!(f, "{instance} has non-unique elements"),
            "contains" => write!(f, "None of {instance} are valid under the given schema"),
            "minContains" => write!(
                f,
                "{instance} contains less than {expected} matching items"
            ),
            "maxContains" => write!(
                f,
                "{instance} contains more than {expected} matching items"
            ),
            "additionalItems" | "items" => {
                write!(f, "Additional items are not allowed ({instance} at index {key})")
            }
            "unevaluatedItems" => {
                write!(f, "Unevaluated items are not allowed ({instance} at index {key})")
            }
            "minProperties" => write!(f, "{instance} has less than {expected} properties"),
            "maxProperties" => write!(f, "{instance} has more than {expected} properties"),
            "required" => write!(f, "\"{key}\" is a required property"),
            "dependentRequired" | "dependencies" => {
                write!(f, "\"{key}\" is a dependency of another present property")
            }
            "additionalProperties" => write!(
                f,
                "Additional properties are not allowed (\"{key}\" was unexpected)"
            ),
            "unevaluatedProperties" => write!(
                f,
                "Unevaluated properties are not allowed (\"{key}\" was unexpected)"
            ),
            "propertyNames" => write!(f, "\"{key}\" is not a valid property name"),
            "allOf" => write!(f, "{instance} is not valid under all of the given schemas"),
            "anyOf" => write!(f, "{instance} is not valid under any of the given schemas"),
            "oneOf" => {
                if self.extra.is_some() {
                    write!(f, "{instance} is valid under more than one of the given schemas")
                } else {
                    write!(f, "{instance} is not valid under any of the given schemas")
                }
            }
            "not" => write!(f, "{expected} is not allowed for {instance}"),
            "then" | "else" => write!(
                f,
                "{instance} does not match the \"{}\" schema",
                self.keyword.name()
            ),
            "false" => write!(f, "False schema does not allow {instance}"),
            keyword => write!(f, "{instance} is not valid under '{keyword}'"),
        }
    }
}

/// All violations reported by one `validate` call, in the order they were found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        ValidationErrors(errors)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}: {error}", error.instance_path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error(keyword: Keyword, data_key: Option<&str>, extra: Option<Value>) -> ValidationError {
        ValidationError {
            order: 0,
            schema_location: Location::new().join("required"),
            keyword,
            expected: json!(["a"]),
            data_key: data_key.map(str::to_string),
            instance_path: Location::new(),
            instance: json!({}),
            extra,
        }
    }

    #[test]
    fn messages() {
        assert_eq!(
            error(Keyword::Single("required"), Some("a"), None).to_string(),
            "\"a\" is a required property"
        );
        assert_eq!(
            error(Keyword::Set(&["if", "then"]), None, None).to_string(),
            "{} does not match the \"then\" schema"
        );
    }

    #[test]
    fn serialization() {
        let value = serde_json::to_value(error(Keyword::Single("required"), Some("a"), None))
            .expect("Serializable");
        assert_eq!(
            value,
            json!({
                "timestamp": 0,
                "schemaObject": "/required",
                "keyword": "required",
                "expectedValue": ["a"],
                "dataKey": "a",
                "instancePath": "",
                "actualValue": {}
            })
        );
        let value = serde_json::to_value(Keyword::Set(&["if", "else"])).expect("Serializable");
        assert_eq!(value, json!(["if", "else"]));
    }

    #[test]
    fn compile_error_messages() {
        let error = CompileError::ObjectAlreadyCreated {
            location: Location::resource("json-schema:///#/items"),
        };
        assert_eq!(
            error.to_string(),
            "Object at 'json-schema:///#/items' is already created"
        );
    }
}
