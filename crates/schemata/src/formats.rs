//! The `format` registry.
//!
//! A registry is an explicit value handed to the [`Compiler`](crate::Compiler). Each entry is a
//! [`Format`] that inspects the schema node carrying the `format` keyword and returns a check
//! for instances, or `None` when the format places no constraint on this node.
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
    sync::Arc,
};

use ahash::AHashMap;
use email_address::EmailAddress;
use fluent_uri::{Uri, UriRef};
use serde_json::{Map, Number, Value};
use uuid_simd::{parse_hyphenated, Out};

use crate::types::{
    FLOAT32_MAX, FLOAT32_MIN, INT16_MAX, INT16_MIN, INT32_MAX, INT32_MIN, INT64_MAX, INT64_MIN,
    INT8_MAX, INT8_MIN, UINT16_MAX, UINT32_MAX, UINT64_MAX, UINT8_MAX,
};

/// A check compiled by a [`Format`].
pub trait FormatCheck: Send + Sync {
    fn is_valid(&self, instance: &Value) -> bool;
}

impl<F> FormatCheck for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn is_valid(&self, instance: &Value) -> bool {
        self(instance)
    }
}

/// A named format implementation.
pub trait Format: Send + Sync {
    /// Build a check for the schema node that declares this format.
    fn compile(&self, schema: &Map<String, Value>) -> Option<Box<dyn FormatCheck>>;
}

/// A [`Format`] that only constrains strings. Other values are always valid.
#[derive(Clone)]
pub struct StringFormat<F>(F);

/// Wrap a string predicate into a [`Format`].
///
/// ```
/// use serde_json::json;
///
/// let validator = schemata::compiler()
///     .add_format("currency", schemata::string_format(|s| s.len() == 3))
///     .compile(&json!({"format": "currency"}))
///     .expect("Valid schema");
/// assert!(validator.is_valid(&json!("USD")));
/// assert!(!validator.is_valid(&json!("dollar")));
/// ```
pub fn string_format<F>(check: F) -> StringFormat<F>
where
    F: Fn(&str) -> bool + Clone + Send + Sync + 'static,
{
    StringFormat(check)
}

impl<F> Format for StringFormat<F>
where
    F: Fn(&str) -> bool + Clone + Send + Sync + 'static,
{
    fn compile(&self, _: &Map<String, Value>) -> Option<Box<dyn FormatCheck>> {
        let check = self.0.clone();
        Some(Box::new(move |instance: &Value| {
            instance.as_str().map_or(true, |value| check(value))
        }))
    }
}

struct NumberFormat(fn(&Number) -> bool);

impl Format for NumberFormat {
    fn compile(&self, _: &Map<String, Value>) -> Option<Box<dyn FormatCheck>> {
        let check = self.0;
        Some(Box::new(move |instance: &Value| match instance {
            Value::Number(number) => check(number),
            _ => true,
        }))
    }
}

/// Mapping from format names to their implementations.
#[derive(Clone, Default)]
pub struct Formats {
    inner: AHashMap<String, Arc<dyn Format>>,
}

impl Formats {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Formats {
        Formats::default()
    }

    /// A registry with every built-in format.
    #[must_use]
    pub fn builtin() -> Formats {
        let mut formats = Formats::new();
        for (name, check) in [
            ("date", is_valid_date as fn(&str) -> bool),
            ("time", is_valid_time),
            ("date-time", is_valid_datetime),
            ("email", is_valid_email),
            ("idn-email", is_valid_email),
            ("hostname", is_valid_hostname),
            ("idn-hostname", is_valid_idn_hostname),
            ("ipv4", is_valid_ipv4),
            ("ipv6", is_valid_ipv6),
            ("uri", is_valid_uri),
            ("uri-reference", is_valid_uri_reference),
            ("uuid", is_valid_uuid),
            ("regex", is_valid_regex),
            ("json-pointer", is_valid_json_pointer),
        ] {
            formats.insert(name, string_format(check));
        }
        for (name, check) in [
            ("int8", is_int8 as fn(&Number) -> bool),
            ("int16", is_int16),
            ("int32", is_int32),
            ("int64", is_int64),
            ("uint8", is_uint8),
            ("uint16", is_uint16),
            ("uint32", is_uint32),
            ("uint64", is_uint64),
            ("float", is_float),
            ("double", is_double),
        ] {
            formats.insert(name, NumberFormat(check));
        }
        formats
    }

    /// Register `format` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, format: impl Format + 'static) {
        self.inner.insert(name.into(), Arc::new(format));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Format> {
        self.inner.get(name).map(|format| &**format)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

impl fmt::Debug for Formats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Formats").field("names", &names).finish()
    }
}

fn is_int8(number: &Number) -> bool {
    in_signed_range(number, INT8_MIN, INT8_MAX)
}

fn is_int16(number: &Number) -> bool {
    in_signed_range(number, INT16_MIN, INT16_MAX)
}

fn is_int32(number: &Number) -> bool {
    in_signed_range(number, INT32_MIN, INT32_MAX)
}

fn is_int64(number: &Number) -> bool {
    in_signed_range(number, INT64_MIN, INT64_MAX)
}

fn is_uint8(number: &Number) -> bool {
    in_unsigned_range(number, UINT8_MAX)
}

fn is_uint16(number: &Number) -> bool {
    in_unsigned_range(number, UINT16_MAX)
}

fn is_uint32(number: &Number) -> bool {
    in_unsigned_range(number, UINT32_MAX)
}

fn is_uint64(number: &Number) -> bool {
    in_unsigned_range(number, UINT64_MAX)
}

fn is_float(number: &Number) -> bool {
    number
        .as_f64()
        .is_some_and(|value| (FLOAT32_MIN..=FLOAT32_MAX).contains(&value))
}

fn is_double(number: &Number) -> bool {
    number.as_f64().is_some_and(f64::is_finite)
}

#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
fn in_signed_range(number: &Number, min: i64, max: i64) -> bool {
    if let Some(value) = number.as_i64() {
        (min..=max).contains(&value)
    } else if number.is_u64() {
        false
    } else {
        number
            .as_f64()
            .is_some_and(|value| value.trunc() == value && value >= min as f64 && value <= max as f64)
    }
}

#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
fn in_unsigned_range(number: &Number, max: u64) -> bool {
    if let Some(value) = number.as_u64() {
        value <= max
    } else if number.is_i64() {
        false
    } else {
        number
            .as_f64()
            .is_some_and(|value| value.trunc() == value && value >= 0.0 && value <= max as f64)
    }
}

fn parse_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0, |acc, digit| acc * 10 + u32::from(digit - b'0')),
    )
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let (Some(year), Some(month), Some(day)) = (
        parse_digits(&bytes[..4]),
        parse_digits(&bytes[5..7]),
        parse_digits(&bytes[8..]),
    ) else {
        return false;
    };
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}

fn is_valid_time(time: &str) -> bool {
    let bytes = time.as_bytes();
    if bytes.len() < 9 || bytes[2] != b':' || bytes[5] != b':' {
        return false;
    }
    let (Some(hour), Some(minute), Some(second)) = (
        parse_digits(&bytes[..2]),
        parse_digits(&bytes[3..5]),
        parse_digits(&bytes[6..8]),
    ) else {
        return false;
    };
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    let mut rest = &bytes[8..];
    if let Some(fraction) = rest.strip_prefix(b".") {
        let digits = fraction.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        rest = &fraction[digits..];
    }
    match rest {
        [b'Z' | b'z'] => true,
        [b'+' | b'-', offset @ ..] => {
            offset.len() == 5
                && offset[2] == b':'
                && parse_digits(&offset[..2]).is_some_and(|h| h <= 23)
                && parse_digits(&offset[3..]).is_some_and(|m| m <= 59)
        }
        _ => false,
    }
}

fn is_valid_datetime(datetime: &str) -> bool {
    match datetime.find(['T', 't']) {
        Some(idx) => is_valid_date(&datetime[..idx]) && is_valid_time(&datetime[idx + 1..]),
        None => false,
    }
}

fn is_valid_email(email: &str) -> bool {
    EmailAddress::is_valid(email)
}

fn is_valid_hostname(hostname: &str) -> bool {
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    !hostname.is_empty()
        && hostname.len() <= 253
        && hostname.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn is_valid_idn_hostname(hostname: &str) -> bool {
    idna::domain_to_ascii_strict(hostname).is_ok_and(|ascii| is_valid_hostname(&ascii))
}

fn is_valid_ipv4(ip: &str) -> bool {
    Ipv4Addr::from_str(ip).is_ok()
}

fn is_valid_ipv6(ip: &str) -> bool {
    Ipv6Addr::from_str(ip).is_ok()
}

fn is_valid_uri(uri: &str) -> bool {
    Uri::parse(uri).is_ok()
}

fn is_valid_uri_reference(uri: &str) -> bool {
    UriRef::parse(uri).is_ok()
}

fn is_valid_uuid(uuid: &str) -> bool {
    let mut out = [0; 16];
    parse_hyphenated(uuid.as_bytes(), Out::from_mut(&mut out)).is_ok()
}

fn is_valid_regex(pattern: &str) -> bool {
    fancy_regex::Regex::new(pattern).is_ok()
}

fn is_valid_json_pointer(pointer: &str) -> bool {
    if pointer.is_empty() {
        return true;
    }
    if !pointer.starts_with('/') {
        return false;
    }
    let mut chars = pointer.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return false;
        }
    }
    true
}
