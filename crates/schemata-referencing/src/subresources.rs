//! Keywords whose values hold nested schemas.
use serde_json::Value;

/// A nested schema together with the pointer segments leading to it from its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subresource<'a> {
    pub keyword: &'a str,
    pub key: Option<SubresourceKey<'a>>,
    pub contents: &'a Value,
}

/// Second segment for keywords holding a sequence or a mapping of schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubresourceKey<'a> {
    Index(usize),
    Property(&'a str),
}

/// Iterate over every nested schema of `contents` reachable through the known keywords.
///
/// Anything outside of the allow-list (annotations, unknown keywords, `enum` / `const` values) is
/// treated as plain data.
pub fn subresources_of(contents: &Value) -> impl Iterator<Item = Subresource<'_>> {
    contents
        .as_object()
        .into_iter()
        .flat_map(|schema| schema.iter())
        .flat_map(|(keyword, value)| subresources_in(keyword, value))
}

fn subresources_in<'a>(
    keyword: &'a str,
    value: &'a Value,
) -> Box<dyn Iterator<Item = Subresource<'a>> + 'a> {
    let once = |value: &'a Value| -> Box<dyn Iterator<Item = Subresource<'a>> + 'a> {
        Box::new(std::iter::once(Subresource {
            keyword,
            key: None,
            contents: value,
        }))
    };
    let array = |items: &'a Vec<Value>| -> Box<dyn Iterator<Item = Subresource<'a>> + 'a> {
        Box::new(items.iter().enumerate().map(move |(idx, item)| Subresource {
            keyword,
            key: Some(SubresourceKey::Index(idx)),
            contents: item,
        }))
    };
    match keyword {
        // For these keys, yield the value once.
        "additionalItems"
        | "additionalProperties"
        | "contains"
        | "else"
        | "if"
        | "not"
        | "propertyNames"
        | "then"
        | "unevaluatedItems"
        | "unevaluatedProperties" => once(value),
        // For these keys, if the value is an array, iterate over its items.
        "allOf" | "anyOf" | "oneOf" | "prefixItems" => match value {
            Value::Array(items) => array(items),
            _ => Box::new(std::iter::empty()),
        },
        // For these keys, if the value is an object, iterate over its values.
        "$defs" | "definitions" | "dependentSchemas" | "patternProperties" | "properties" => {
            match value {
                Value::Object(map) => Box::new(map.iter().map(move |(key, item)| Subresource {
                    keyword,
                    key: Some(SubresourceKey::Property(key)),
                    contents: item,
                })),
                _ => Box::new(std::iter::empty()),
            }
        }
        // Legacy `dependencies` mixes property lists with schemas.
        "dependencies" => match value {
            Value::Object(map) => Box::new(
                map.iter()
                    .filter(|(_, item)| !item.is_array())
                    .map(move |(key, item)| Subresource {
                        keyword,
                        key: Some(SubresourceKey::Property(key)),
                        contents: item,
                    }),
            ),
            _ => Box::new(std::iter::empty()),
        },
        // For "items": if it's an array, iterate over its items; otherwise, yield the value once.
        "items" => match value {
            Value::Array(items) => array(items),
            _ => once(value),
        },
        _ => Box::new(std::iter::empty()),
    }
}
