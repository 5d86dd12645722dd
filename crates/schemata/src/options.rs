use referencing::{uri, AnchorScope, Uri};
use serde_json::Value;

use crate::{
    compiler,
    error::CompileError,
    formats::{Format, Formats},
    validator::Validator,
};

/// Default `$schema` used by [`Compiler::validate_schema`].
pub const DEFAULT_META_SCHEMA: &str = "https://json-schema.org/draft/2020-12/schema";

/// Regular expression engine used for `pattern` and `patternProperties`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternEngine {
    /// `fancy-regex`: supports lookaround and backreferences.
    #[default]
    FancyRegex,
    /// `regex`: linear time matching, no lookaround.
    Regex,
}

#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub(crate) key: Option<String>,
    pub(crate) contents: Value,
}

/// Configuration and registered documents used to compile schemas.
///
/// ```
/// use serde_json::json;
///
/// let mut compiler = schemata::compiler();
/// compiler
///     .add_schema(json!({"$id": "http://example.com/name", "type": "string"}), None)
///     .expect("Schema has an `$id`");
/// let validator = compiler
///     .compile(&json!({"properties": {"name": {"$ref": "http://example.com/name"}}}))
///     .expect("Valid schema");
/// assert!(validator.is_valid(&json!({"name": "Alice"})));
/// assert!(!validator.is_valid(&json!({"name": 42})));
/// ```
#[derive(Debug, Clone)]
pub struct Compiler {
    pub(crate) anchor_scope: AnchorScope,
    pub(crate) pattern_engine: PatternEngine,
    pub(crate) validate_formats: bool,
    default_meta_schema: String,
    pub(crate) formats: Formats,
    pub(crate) schemas: Vec<Document>,
    meta_schemas: Vec<Document>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// A compiler with every built-in format registered.
    #[must_use]
    pub fn new() -> Compiler {
        Compiler {
            anchor_scope: AnchorScope::default(),
            pattern_engine: PatternEngine::default(),
            validate_formats: true,
            default_meta_schema: DEFAULT_META_SCHEMA.to_string(),
            formats: Formats::builtin(),
            schemas: Vec::new(),
            meta_schemas: Vec::new(),
        }
    }

    /// Scope of bare-name anchors such as `#node`.
    pub fn with_anchor_scope(&mut self, scope: AnchorScope) -> &mut Self {
        self.anchor_scope = scope;
        self
    }

    pub fn with_pattern_engine(&mut self, engine: PatternEngine) -> &mut Self {
        self.pattern_engine = engine;
        self
    }

    /// Whether the `format` keyword is checked. When disabled, unknown format names are accepted.
    pub fn should_validate_formats(&mut self, validate_formats: bool) -> &mut Self {
        self.validate_formats = validate_formats;
        self
    }

    /// Meta-schema used by [`Compiler::validate_schema`] for schemas without `$schema`.
    pub fn with_default_meta_schema(&mut self, id: impl Into<String>) -> &mut Self {
        self.default_meta_schema = id.into();
        self
    }

    /// Replace the format registry.
    pub fn with_formats(&mut self, formats: Formats) -> &mut Self {
        self.formats = formats;
        self
    }

    pub fn add_format(&mut self, name: impl Into<String>, format: impl Format + 'static) -> &mut Self {
        self.formats.insert(name, format);
        self
    }

    pub fn add_formats<N, F>(&mut self, formats: impl IntoIterator<Item = (N, F)>) -> &mut Self
    where
        N: Into<String>,
        F: Format + 'static,
    {
        for (name, format) in formats {
            self.formats.insert(name, format);
        }
        self
    }

    /// Register a document that `$ref` can point to from any schema compiled later.
    ///
    /// The document is addressed by `key` when given, and by its own `$id` in any case.
    ///
    /// # Errors
    ///
    /// If there is neither a key nor an `$id`, or the key is not a valid URI reference.
    pub fn add_schema(&mut self, schema: Value, key: Option<&str>) -> Result<&mut Self, CompileError> {
        let document = document(schema, key)?;
        self.schemas.push(document);
        Ok(self)
    }

    /// Register several documents, each addressed by its own `$id`.
    ///
    /// # Errors
    ///
    /// If any of the documents has no `$id`. Documents before the failing one stay registered.
    pub fn add_schemas(&mut self, schemas: impl IntoIterator<Item = Value>) -> Result<&mut Self, CompileError> {
        for schema in schemas {
            self.add_schema(schema, None)?;
        }
        Ok(self)
    }

    /// Register a meta-schema for [`Compiler::validate_schema`].
    ///
    /// # Errors
    ///
    /// If there is neither a key nor an `$id`, or the key is not a valid URI reference.
    pub fn add_meta_schema(&mut self, schema: Value, key: Option<&str>) -> Result<&mut Self, CompileError> {
        let document = document(schema, key)?;
        self.meta_schemas.push(document);
        Ok(self)
    }

    /// Register several meta-schemas, each addressed by its own `$id`.
    ///
    /// # Errors
    ///
    /// If any of the documents has no `$id`. Documents before the failing one stay registered.
    pub fn add_meta_schemas(&mut self, schemas: impl IntoIterator<Item = Value>) -> Result<&mut Self, CompileError> {
        for schema in schemas {
            self.add_meta_schema(schema, None)?;
        }
        Ok(self)
    }

    /// Compile `schema` into a reusable validator.
    ///
    /// # Errors
    ///
    /// If the schema is structurally invalid or references a document that was not supplied.
    pub fn compile(&self, schema: &Value) -> Result<Validator, CompileError> {
        compiler::build(self, schema, &[])
    }

    /// Compile `schema` with additional documents that are only visible to this compilation.
    ///
    /// # Errors
    ///
    /// If the schema is structurally invalid, an auxiliary document has no `$id`, or a reference
    /// can not be resolved.
    pub fn compile_with(&self, schema: &Value, auxiliary: &[Value]) -> Result<Validator, CompileError> {
        compiler::build(self, schema, auxiliary)
    }

    /// Validate a schema document against the meta-schema named by its `$schema`, or the default
    /// one. Returns `true` if no such meta-schema was registered.
    ///
    /// # Errors
    ///
    /// If the selected meta-schema itself fails to compile.
    pub fn validate_schema(&self, schema: &Value) -> Result<bool, CompileError> {
        let selected = schema
            .get("$schema")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_meta_schema);
        let selected = normalized(selected)?;
        let mut found = None;
        for document in &self.meta_schemas {
            if document_uri(document)?.as_ref() == Some(&selected) {
                found = Some(document);
                break;
            }
        }
        let Some(meta_schema) = found else {
            tracing::debug!(meta_schema = %selected, "No meta-schema registered");
            return Ok(true);
        };
        let others: Vec<Value> = self
            .meta_schemas
            .iter()
            .filter(|document| !std::ptr::eq(*document, meta_schema))
            .filter(|document| document.contents.get("$id").is_some())
            .map(|document| document.contents.clone())
            .collect();
        let validator = compiler::build(self, &meta_schema.contents, &others)?;
        Ok(validator.is_valid(schema))
    }
}

fn document(contents: Value, key: Option<&str>) -> Result<Document, CompileError> {
    match key {
        Some(key) => {
            normalized(key)?;
        }
        None => {
            if !contents.get("$id").is_some_and(Value::is_string) {
                return Err(referencing::Error::MissingKey.into());
            }
        }
    }
    Ok(Document {
        key: key.map(str::to_string),
        contents,
    })
}

fn document_uri(document: &Document) -> Result<Option<Uri<String>>, CompileError> {
    let id = document
        .key
        .as_deref()
        .or_else(|| document.contents.get("$id").and_then(Value::as_str));
    id.map(normalized).transpose()
}

fn normalized(id: &str) -> Result<Uri<String>, CompileError> {
    let left = id.split_once('#').map_or(id, |(left, _)| left);
    Ok(uri::from_str(left)?)
}
