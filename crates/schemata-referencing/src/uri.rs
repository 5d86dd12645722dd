//! URI handling: parsing, resolution against a base, and canonical identifiers.
//!
//! Canonical identifiers are plain strings of the form `<uri>#<fragment>`. A reference without
//! a fragment gets an empty one (`<uri>#`), so resolving the same reference against the same base
//! always produces the same key.
use std::sync::{Arc, LazyLock};

use fluent_uri::{Uri, UriRef};
use percent_encoding::percent_decode_str;

use crate::Error;

/// Base URI used for documents that declare no `$id` and are supplied without a key.
pub const DEFAULT_ROOT_URL: &str = "json-schema:///";

pub static DEFAULT_ROOT_URI: LazyLock<Arc<Uri<String>>> = LazyLock::new(|| {
    Arc::new(
        Uri::parse(DEFAULT_ROOT_URL)
            .expect("Invalid URI")
            .normalize(),
    )
});

/// How bare-name anchors are scoped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnchorScope {
    /// `#name` is resolved within the document it appears in: `<document uri>#name`.
    #[default]
    Local,
    /// `#name` is document-independent: every anchor lives in one shared namespace.
    Global,
}

/// The fragment part of a reference, classified by its grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// No fragment, or `#` alone.
    Empty,
    /// A JSON Pointer such as `/$defs/item`. Percent-escapes are already decoded.
    Pointer(String),
    /// A bare identifier such as `node`.
    Anchor(String),
    /// Anything else. Never resolvable, but kept so the failure names the original text.
    Unrecognized(String),
}

/// A reference resolved against a base URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Canonical identifier, used as the key in the schema graph.
    pub id: String,
    /// The resolved URI without its fragment.
    pub base: Arc<Uri<String>>,
    /// Query component of the resolved URI, if any.
    pub query: Option<String>,
    pub fragment: Fragment,
}

/// What an `$id` declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// A new resource base.
    Resource(Arc<Uri<String>>),
    /// A legacy plain-name fragment (`"$id": "#foo"`), equivalent to `"$anchor": "foo"`.
    Anchor(String),
}

/// Parse a URI reference and resolve it against the default root.
///
/// # Errors
///
/// If the input is not a valid URI reference.
pub fn from_str(uri: &str) -> Result<Uri<String>, Error> {
    resolve_against(&DEFAULT_ROOT_URI, uri)
}

/// Resolve `reference` against `base` and normalize the result.
///
/// # Errors
///
/// If `reference` is not a valid URI reference or cannot be resolved against `base`.
pub fn resolve_against(base: &Uri<String>, reference: &str) -> Result<Uri<String>, Error> {
    let parsed = UriRef::parse(reference).map_err(|err| Error::invalid_uri(reference, err))?;
    let resolved = parsed
        .resolve_against(base)
        .map_err(|err| Error::invalid_uri(reference, err))?;
    Ok(resolved.normalize())
}

/// Resolve a `$ref` string against the current base.
///
/// # Errors
///
/// If the part before `#` is not a valid URI reference or the fragment is not valid UTF-8 after
/// percent-decoding.
pub fn resolve_reference(
    base: &Arc<Uri<String>>,
    reference: &str,
    scope: AnchorScope,
) -> Result<ResolvedReference, Error> {
    let (left, fragment) = match reference.split_once('#') {
        Some((left, fragment)) => (left, fragment),
        None => (reference, ""),
    };
    let base = if left.is_empty() {
        Arc::clone(base)
    } else {
        Arc::new(resolve_against(base, left)?)
    };
    let fragment = classify_fragment(&decode_fragment(reference, fragment)?);
    let id = match &fragment {
        Fragment::Empty => canonical(&base, ""),
        Fragment::Pointer(pointer) => canonical(&base, pointer),
        Fragment::Anchor(name) => anchor_id(&base, name, scope),
        Fragment::Unrecognized(raw) => canonical(&base, raw),
    };
    let query = base
        .as_str()
        .split_once('?')
        .map(|(_, query)| query.to_string());
    Ok(ResolvedReference {
        id,
        base,
        query,
        fragment,
    })
}

/// Resolve an `$id` value against the current base.
///
/// # Errors
///
/// If the value is not a valid URI reference.
pub fn resolve_id(base: &Arc<Uri<String>>, id: &str) -> Result<Identifier, Error> {
    if let Some(name) = id.strip_prefix('#') {
        if is_anchor(name) {
            return Ok(Identifier::Anchor(name.to_string()));
        }
    }
    let left = id.split_once('#').map_or(id, |(left, _)| left);
    if left.is_empty() {
        return Ok(Identifier::Resource(Arc::clone(base)));
    }
    Ok(Identifier::Resource(Arc::new(resolve_against(base, left)?)))
}

/// Build a canonical identifier from a fragment-less URI and a decoded fragment.
#[must_use]
pub fn canonical(base: &Uri<String>, fragment: &str) -> String {
    let base = base.as_str();
    let mut id = String::with_capacity(base.len() + 1 + fragment.len());
    id.push_str(base);
    id.push('#');
    id.push_str(fragment);
    id
}

/// Canonical identifier of an anchor under the given scope.
#[must_use]
pub fn anchor_id(base: &Uri<String>, name: &str, scope: AnchorScope) -> String {
    match scope {
        AnchorScope::Local => canonical(base, name),
        AnchorScope::Global => format!("#{name}"),
    }
}

/// Whether `name` matches the bare-identifier grammar: letters, digits, `-`, `_` and `.`,
/// not starting with a digit.
#[must_use]
pub fn is_anchor(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() && is_anchor_char(first) => {
            chars.all(is_anchor_char)
        }
        _ => false,
    }
}

fn is_anchor_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn decode_fragment<'a>(
    reference: &str,
    fragment: &'a str,
) -> Result<std::borrow::Cow<'a, str>, Error> {
    percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|err| Error::invalid_uri(reference, err))
}

fn classify_fragment(fragment: &str) -> Fragment {
    if fragment.is_empty() {
        Fragment::Empty
    } else if fragment.starts_with('/') {
        Fragment::Pointer(fragment.to_string())
    } else if is_anchor(fragment) {
        Fragment::Anchor(fragment.to_string())
    } else {
        Fragment::Unrecognized(fragment.to_string())
    }
}
