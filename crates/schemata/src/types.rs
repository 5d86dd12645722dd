//! Value kinds understood by the `type` keyword and numeric bound constants.
use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::ext::cmp;

pub(crate) const INT8_MIN: i64 = i8::MIN as i64;
pub(crate) const INT8_MAX: i64 = i8::MAX as i64;
pub(crate) const INT16_MIN: i64 = i16::MIN as i64;
pub(crate) const INT16_MAX: i64 = i16::MAX as i64;
pub(crate) const INT32_MIN: i64 = i32::MIN as i64;
pub(crate) const INT32_MAX: i64 = i32::MAX as i64;
pub(crate) const INT64_MIN: i64 = i64::MIN;
pub(crate) const INT64_MAX: i64 = i64::MAX;
pub(crate) const UINT8_MAX: u64 = u8::MAX as u64;
pub(crate) const UINT16_MAX: u64 = u16::MAX as u64;
pub(crate) const UINT32_MAX: u64 = u32::MAX as u64;
pub(crate) const UINT64_MAX: u64 = u64::MAX;
pub(crate) const FLOAT32_MIN: f64 = f32::MIN as f64;
pub(crate) const FLOAT32_MAX: f64 = f32::MAX as f64;

/// Kinds accepted by the `type` keyword.
///
/// Besides the standard JSON kinds there are a few extension kinds mapped onto JSON data:
/// `bigint` is a number written as an integer literal, `set` is an array without duplicates,
/// `map` is an object, `tuple` is an array and `regex` is a string that compiles as a regular
/// expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum JsonType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
    BigInt,
    Set,
    Map,
    Tuple,
    Regex,
}

impl JsonType {
    const ALL: [JsonType; 12] = [
        JsonType::Array,
        JsonType::Boolean,
        JsonType::Integer,
        JsonType::Null,
        JsonType::Number,
        JsonType::Object,
        JsonType::String,
        JsonType::BigInt,
        JsonType::Set,
        JsonType::Map,
        JsonType::Tuple,
        JsonType::Regex,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Array => "array",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Null => "null",
            JsonType::Number => "number",
            JsonType::Object => "object",
            JsonType::String => "string",
            JsonType::BigInt => "bigint",
            JsonType::Set => "set",
            JsonType::Map => "map",
            JsonType::Tuple => "tuple",
            JsonType::Regex => "regex",
        }
    }

    /// Whether `instance` is of this kind.
    #[must_use]
    pub fn matches(self, instance: &Value) -> bool {
        match (self, instance) {
            (JsonType::Array | JsonType::Tuple, Value::Array(_))
            | (JsonType::Boolean, Value::Bool(_))
            | (JsonType::Null, Value::Null)
            | (JsonType::Number, Value::Number(_))
            | (JsonType::Object | JsonType::Map, Value::Object(_))
            | (JsonType::String, Value::String(_)) => true,
            (JsonType::Integer, Value::Number(number)) => is_integer(number),
            (JsonType::BigInt, Value::Number(number)) => number.is_u64() || number.is_i64(),
            (JsonType::Set, Value::Array(items)) => cmp::is_unique(items),
            (JsonType::Regex, Value::String(pattern)) => fancy_regex::Regex::new(pattern).is_ok(),
            _ => false,
        }
    }
}

#[allow(clippy::float_cmp)]
fn is_integer(number: &serde_json::Number) -> bool {
    number.is_u64() || number.is_i64() || number.as_f64().is_some_and(|n| n.trunc() == n)
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(JsonType::Array),
            "boolean" => Ok(JsonType::Boolean),
            "integer" => Ok(JsonType::Integer),
            "null" => Ok(JsonType::Null),
            "number" => Ok(JsonType::Number),
            "object" => Ok(JsonType::Object),
            "string" => Ok(JsonType::String),
            "bigint" => Ok(JsonType::BigInt),
            "set" => Ok(JsonType::Set),
            "map" => Ok(JsonType::Map),
            "tuple" => Ok(JsonType::Tuple),
            "regex" => Ok(JsonType::Regex),
            _ => Err(()),
        }
    }
}

/// A compact set of [`JsonType`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JsonTypeSet(u16);

impl JsonTypeSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn insert(mut self, ty: JsonType) -> Self {
        self.0 |= 1 << ty as u16;
        self
    }

    #[must_use]
    pub const fn contains(self, ty: JsonType) -> bool {
        self.0 & (1 << ty as u16) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = JsonType> {
        JsonType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }

    /// Whether `instance` is of any kind in this set.
    #[must_use]
    pub fn matches(self, instance: &Value) -> bool {
        self.iter().any(|ty| ty.matches(instance))
    }
}

impl FromIterator<JsonType> for JsonTypeSet {
    fn from_iter<T: IntoIterator<Item = JsonType>>(iter: T) -> Self {
        iter.into_iter().fold(JsonTypeSet::empty(), JsonTypeSet::insert)
    }
}

impl fmt::Debug for JsonTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(JsonType::Integer, &json!(1), true)]
    #[test_case(JsonType::Integer, &json!(1.0), true)]
    #[test_case(JsonType::Integer, &json!(1.5), false)]
    #[test_case(JsonType::BigInt, &json!(-12), true)]
    #[test_case(JsonType::BigInt, &json!(12.0), false)]
    #[test_case(JsonType::Set, &json!([1, 2]), true)]
    #[test_case(JsonType::Set, &json!([1, 1.0]), false)]
    #[test_case(JsonType::Tuple, &json!([]), true)]
    #[test_case(JsonType::Map, &json!({}), true)]
    #[test_case(JsonType::Regex, &json!("^a+$"), true)]
    #[test_case(JsonType::Regex, &json!("(unclosed"), false)]
    #[test_case(JsonType::Number, &json!("1"), false)]
    fn matching(ty: JsonType, instance: &Value, expected: bool) {
        assert_eq!(ty.matches(instance), expected);
    }

    #[test]
    fn names_round_trip() {
        for ty in JsonType::ALL {
            assert_eq!(ty.as_str().parse::<JsonType>(), Ok(ty));
        }
        assert!("float".parse::<JsonType>().is_err());
    }

    #[test]
    fn set_operations() {
        let set: JsonTypeSet = [JsonType::String, JsonType::Null].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(JsonType::Null));
        assert!(!set.contains(JsonType::Array));
        assert!(set.matches(&json!(null)));
        assert!(!set.matches(&json!(1)));
        assert!(JsonTypeSet::empty().is_empty());
    }
}
