//! JSON Pointer segment encoding and lookup.
use std::borrow::Cow;

use serde_json::Value;

/// Unescape a single pointer segment: `~1` becomes `/` and `~0` becomes `~`.
#[must_use]
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Escape a key so it can be used as a pointer segment: `~` becomes `~0` and `/` becomes `~1`.
#[must_use]
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Append an escaped segment to a pointer buffer.
pub fn push_segment(buffer: &mut String, segment: &str) {
    buffer.push('/');
    buffer.push_str(&escape_segment(segment));
}

/// Split a pointer into its unescaped segments. The empty pointer has no segments.
pub fn segments(pointer: &str) -> impl Iterator<Item = Cow<'_, str>> {
    pointer.split('/').skip(1).map(unescape_segment)
}

/// Look up a value by a JSON Pointer.
#[must_use]
pub fn pointer<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(document);
    }
    if !pointer.starts_with('/') {
        return None;
    }
    segments(pointer).try_fold(document, |target, token| step(target, &token))
}

/// Move one segment into `target`.
#[must_use]
pub fn step<'a>(target: &'a Value, token: &str) -> Option<&'a Value> {
    match target {
        Value::Object(map) => map.get(token),
        Value::Array(list) => parse_index(token).and_then(|x| list.get(x)),
        _ => None,
    }
}

// Taken from `serde_json`.
#[must_use]
pub fn parse_index(s: &str) -> Option<usize> {
    if s.starts_with('+') || (s.starts_with('0') && s.len() != 1) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("tilde~field", "tilde~0field")]
    #[test_case("slash/field", "slash~1field")]
    #[test_case("~/", "~0~1")]
    #[test_case("plain", "plain")]
    fn escaping(raw: &str, escaped: &str) {
        assert_eq!(escape_segment(raw), escaped);
        assert_eq!(unescape_segment(escaped), raw);
    }

    #[test]
    fn escaped_lookup() {
        let document = json!({"$defs": {"tilde~field": {"type": "integer"}, "a/b": [1, 2]}});
        assert_eq!(
            pointer(&document, "/$defs/tilde~0field"),
            document["$defs"].get("tilde~field")
        );
        assert_eq!(pointer(&document, "/$defs/a~1b/1"), Some(&json!(2)));
        assert_eq!(pointer(&document, "/$defs/a~1b/01"), None);
        assert_eq!(pointer(&document, "$defs"), None);
    }

    #[test]
    fn empty_pointer() {
        let document = json!({});
        assert_eq!(pointer(&document, ""), Some(&document));
    }

    #[test]
    fn building_pointers() {
        let mut buffer = String::new();
        push_segment(&mut buffer, "$defs");
        push_segment(&mut buffer, "a/b");
        assert_eq!(buffer, "/$defs/a~1b");
        let decoded: Vec<_> = segments(&buffer).collect();
        assert_eq!(decoded, vec!["$defs", "a/b"]);
    }
}
