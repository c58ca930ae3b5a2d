//! `$ref` values: parsing, joining against a base, canonical identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::error::ReferenceError;
use crate::pointer::JsonPointer;

/// Characters that may not appear unescaped in a URI reference.
const FORBIDDEN: &[char] = &['"', '<', '>', '\\', '^', '`', '{', '|', '}'];

/// Bytes percent-encoded when a decoded fragment is written back out.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A parsed `$ref` value.
///
/// A reference has an optional scheme, an optional locator (the document
/// address, without the fragment) and an optional fragment (a JSON Pointer,
/// stored percent-decoded). At least one of locator and fragment is present. Two references are equal
/// when their canonical forms are equal, so `a/./b.json#/x` and `a/b.json#/x`
/// are the same reference.
#[derive(Debug, Clone)]
pub struct JsonReference {
    raw: String,
    scheme: Option<String>,
    locator: Option<String>,
    fragment: Option<String>,
    canonical: String,
}

impl JsonReference {
    /// Parse a `$ref` string.
    ///
    /// Scheme-bearing values are validated and normalized by the `url` crate;
    /// plain paths are normalized lexically (`.` and `..` segments folded).
    ///
    /// # Errors
    ///
    /// Returns `ReferenceError::MalformedReference` when the value is not
    /// URI-shaped or carries neither a locator nor a fragment.
    pub fn parse(value: &str) -> Result<Self, ReferenceError> {
        if let Some(c) = value
            .chars()
            .find(|c| c.is_whitespace() || FORBIDDEN.contains(c))
        {
            return Err(malformed(value, format!("illegal character {c:?}")));
        }

        let (address, fragment) = match value.split_once('#') {
            Some((address, fragment)) => (address, Some(fragment)),
            None => (value, None),
        };
        if fragment.is_some_and(|f| f.contains('#')) {
            return Err(malformed(value, "more than one '#'"));
        }

        if scheme_of(address).is_some() {
            return Self::parse_url(value);
        }

        let locator = Some(normalize_path(address)).filter(|path| !path.is_empty());
        let fragment = fragment.map(|f| decode_fragment(value, f)).transpose()?;
        Self::from_parts(value, None, locator, fragment)
    }

    /// Resolve `value` against the base directory declared by a document.
    ///
    /// Values starting with `#`, scheme-bearing values, absolute paths and
    /// values with no (or an empty) base are taken as they are. Otherwise the
    /// value is appended to `base` and normalized into an absolute path;
    /// scheme-bearing bases are joined with URL semantics.
    pub fn resolve_against(base: Option<&str>, value: &str) -> Result<Self, ReferenceError> {
        let reference = Self::parse(value)?;
        let Some(base) = base.filter(|b| !b.is_empty()) else {
            return Ok(reference);
        };
        if reference.is_local() || reference.scheme.is_some() || value.starts_with('/') {
            return Ok(reference);
        }
        let directory = if has_scheme(base) {
            format!("{}/", base.trim_end_matches('/'))
        } else {
            format!("/{}/", base.trim_matches('/'))
        };
        join_address(&directory, value)
    }

    /// Resolve `value` relative to the document this reference addresses.
    ///
    /// `#/definitions/A` becomes `<this document>#/definitions/A`; relative
    /// paths are taken from this document's directory.
    pub fn join(&self, value: &str) -> Result<Self, ReferenceError> {
        let reference = Self::parse(value)?;
        let Some(locator) = self.locator.as_deref() else {
            return Ok(reference);
        };
        if reference.scheme.is_some() {
            return Ok(reference);
        }
        if reference.is_local() {
            let fragment = reference.fragment.clone();
            return Self::from_parts(value, self.scheme.clone(), Some(locator.to_string()), fragment);
        }
        if self.scheme.is_none() && value.starts_with('/') {
            return Ok(reference);
        }
        join_address(locator, value)
    }

    /// The same document, without a fragment.
    pub fn document(&self) -> Option<Self> {
        let locator = self.locator.clone()?;
        Some(Self {
            raw: locator.clone(),
            scheme: self.scheme.clone(),
            canonical: locator.clone(),
            locator: Some(locator),
            fragment: None,
        })
    }

    /// The fragment as a JSON Pointer. An absent or empty fragment is the root.
    pub fn pointer(&self) -> Result<JsonPointer, ReferenceError> {
        match self.fragment.as_deref() {
            None | Some("") => Ok(JsonPointer::root()),
            Some(fragment) => JsonPointer::parse(fragment),
        }
    }

    /// The value as written in the schema.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercased scheme, when the reference has one.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Document address without the fragment.
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// True when the reference points into the document that contains it.
    pub fn is_local(&self) -> bool {
        self.locator.is_none()
    }

    fn parse_url(value: &str) -> Result<Self, ReferenceError> {
        let url = Url::parse(value).map_err(|e| malformed(value, e.to_string()))?;
        let fragment = url
            .fragment()
            .map(|f| decode_fragment(value, f))
            .transpose()?;
        let mut document = url.clone();
        document.set_fragment(None);
        Self::from_parts(
            value,
            Some(url.scheme().to_string()),
            Some(document.to_string()),
            fragment,
        )
    }

    fn from_parts(
        raw: &str,
        scheme: Option<String>,
        locator: Option<String>,
        fragment: Option<String>,
    ) -> Result<Self, ReferenceError> {
        if locator.is_none() && fragment.is_none() {
            return Err(malformed(raw, "locator, fragment or both must be present"));
        }
        let mut canonical = locator.clone().unwrap_or_default();
        if let Some(fragment) = &fragment {
            canonical.push('#');
            canonical.extend(utf8_percent_encode(fragment, FRAGMENT));
        }
        Ok(Self {
            raw: raw.to_string(),
            scheme,
            locator,
            fragment,
            canonical,
        })
    }
}

impl PartialEq for JsonReference {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for JsonReference {}

impl Hash for JsonReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for JsonReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// True when `value` starts with a URI scheme such as `file:` or `https:`.
pub fn has_scheme(value: &str) -> bool {
    scheme_of(value).is_some()
}

/// The scheme of `value`: `[A-Za-z][A-Za-z0-9+.-]*` followed by `:` before any
/// `/`, `?` or `#`.
fn scheme_of(value: &str) -> Option<&str> {
    let end = value.find(|c| matches!(c, ':' | '/' | '?' | '#'))?;
    if value.as_bytes()[end] != b':' {
        return None;
    }
    let candidate = &value[..end];
    let mut chars = candidate.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
    (starts_alpha && rest_valid).then_some(candidate)
}

/// Resolve `value` against `address`, which ends in a document name or `/`.
fn join_address(address: &str, value: &str) -> Result<JsonReference, ReferenceError> {
    if scheme_of(address).is_some() {
        let base = Url::parse(address).map_err(|e| malformed(address, e.to_string()))?;
        if !base.cannot_be_a_base() {
            let joined = base.join(value).map_err(|e| malformed(value, e.to_string()))?;
            return JsonReference::parse(joined.as_str());
        }
        // Opaque bases such as `jar:file:/lib.jar!/a/b.json` are joined on
        // their scheme-specific part.
        let scheme = base.scheme().to_string();
        let opaque = &address[scheme.len() + 1..];
        let joined = format!("{}:{}", scheme, join_path(opaque, value));
        return JsonReference::parse(&joined);
    }
    JsonReference::parse(&join_path(address, value))
}

fn join_path(address: &str, value: &str) -> String {
    let directory = match address.rfind('/') {
        Some(index) => &address[..=index],
        None => "",
    };
    let (path, fragment) = match value.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (value, None),
    };
    let mut joined = normalize_path(&format!("{directory}{path}"));
    if let Some(fragment) = fragment {
        joined.push('#');
        joined.push_str(fragment);
    }
    joined
}

/// Fold `.` and `..` segments and collapse repeated slashes.
fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if !absolute => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

fn decode_fragment(reference: &str, fragment: &str) -> Result<String, ReferenceError> {
    percent_decode_str(fragment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| malformed(reference, format!("fragment is not UTF-8 once decoded: {e}")))
}

fn malformed(reference: &str, message: impl Into<String>) -> ReferenceError {
    ReferenceError::MalformedReference {
        reference: reference.to_string(),
        message: message.into(),
    }
}
