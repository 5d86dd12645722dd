//! Locations inside schemas and instances.
use std::{fmt, sync::Arc};

use referencing::pointer::escape_segment;
use serde::{Serialize, Serializer};

/// A single step of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSegment<'a> {
    /// Property name within a JSON object.
    Property(&'a str),
    /// Index within a JSON array.
    Index(usize),
}

impl<'a> From<&'a str> for LocationSegment<'a> {
    #[inline]
    fn from(value: &'a str) -> LocationSegment<'a> {
        LocationSegment::Property(value)
    }
}

impl<'a> From<&'a String> for LocationSegment<'a> {
    #[inline]
    fn from(value: &'a String) -> LocationSegment<'a> {
        LocationSegment::Property(value)
    }
}

impl From<usize> for LocationSegment<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        LocationSegment::Index(value)
    }
}

/// An escaped JSON Pointer, optionally prefixed with the canonical identifier of a schema
/// resource.
///
/// Compiled objects are keyed by their location, so joining the same segments onto the same
/// prefix always yields the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(Arc<str>);

impl Location {
    /// Create a new, empty `Location`.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::from(""))
    }

    /// Location of a resource found by its canonical identifier.
    #[must_use]
    pub(crate) fn resource(id: &str) -> Self {
        Self(Arc::from(id))
    }

    /// Append a segment, escaping `~` and `/` in property names.
    #[must_use]
    pub fn join<'a>(&self, segment: impl Into<LocationSegment<'a>>) -> Self {
        let mut buffer = String::with_capacity(self.0.len() + 8);
        buffer.push_str(&self.0);
        buffer.push('/');
        match segment.into() {
            LocationSegment::Property(property) => buffer.push_str(&escape_segment(property)),
            LocationSegment::Index(idx) => buffer.push_str(itoa::Buffer::new().format(idx)),
        }
        Self(Arc::from(buffer))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A location inside the instance being validated, built on the stack as validation descends.
///
/// It is only materialized into a [`Location`] when an error is reported.
#[derive(Debug, Clone, Copy)]
pub struct LazyLocation<'a> {
    segment: LocationSegment<'a>,
    parent: Option<&'a LazyLocation<'a>>,
}

impl Default for LazyLocation<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> LazyLocation<'a> {
    /// Root of the instance.
    #[must_use]
    pub const fn new() -> Self {
        LazyLocation {
            // The root segment is never emitted
            segment: LocationSegment::Index(0),
            parent: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn push(&'a self, segment: impl Into<LocationSegment<'a>>) -> Self {
        LazyLocation {
            segment: segment.into(),
            parent: Some(self),
        }
    }
}

impl From<&LazyLocation<'_>> for Location {
    fn from(value: &LazyLocation<'_>) -> Self {
        let mut segments = Vec::new();
        let mut head = value;
        while let Some(parent) = head.parent {
            segments.push(head.segment);
            head = parent;
        }
        let mut location = Location::new();
        for segment in segments.into_iter().rev() {
            location = location.join(segment);
        }
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn lazy_location() {
        let root = LazyLocation::new();
        let items = root.push("items");
        let first = items.push(0);
        let key = first.push("a/b~c");
        assert_eq!(Location::from(&key).as_str(), "/items/0/a~1b~0c");
        assert_eq!(Location::from(&root).as_str(), "");
    }

    #[test_case(LocationSegment::Property("properties"), "json-schema:///#/properties")]
    #[test_case(LocationSegment::Property("tilde~field"), "json-schema:///#/tilde~0field")]
    #[test_case(LocationSegment::Index(12), "json-schema:///#/12")]
    fn joining(segment: LocationSegment<'_>, expected: &str) {
        let location = Location::resource("json-schema:///#").join(segment);
        assert_eq!(location.as_str(), expected);
    }
}
