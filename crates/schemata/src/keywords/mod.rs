pub(crate) mod array;
pub(crate) mod combinators;
pub(crate) mod enum_;
pub(crate) mod format;
pub(crate) mod helpers;
pub(crate) mod if_;
pub(crate) mod items;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod properties;
pub(crate) mod string;
pub(crate) mod type_;

use serde_json::{Map, Value};

use crate::{compiler::Context, error::CompileError, validator::BoxedValidator};

pub(crate) type CompilationResult = Result<(), CompileError>;

/// Compiles one family of related keywords and appends their validators.
type KeywordFamily =
    for<'a> fn(&Context<'a>, &'a Map<String, Value>, &mut Vec<BoxedValidator>) -> CompilationResult;

/// Families in evaluation order. Cheap checks come first so `is_valid` fails early.
const FAMILIES: [KeywordFamily; 11] = [
    type_::compile,
    enum_::compile,
    numeric::compile,
    string::compile,
    format::compile,
    array::compile,
    items::compile,
    object::compile,
    properties::compile,
    combinators::compile,
    if_::compile,
];

/// Compile every keyword of a schema object that is not a `$ref`.
pub(crate) fn compile<'a>(
    ctx: &Context<'a>,
    schema: &'a Map<String, Value>,
) -> Result<Vec<BoxedValidator>, CompileError> {
    let mut validators = Vec::new();
    for family in FAMILIES {
        family(ctx, schema, &mut validators)?;
    }
    Ok(validators)
}
