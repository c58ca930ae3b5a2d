//! JSON Pointer (RFC 6901) addressing over schema documents.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ReferenceError;

/// An immutable path of tokens from a document root to a node.
///
/// Tokens are stored unescaped; `~0` and `~1` only appear in the string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a pointer from unescaped tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the string form, e.g. `/definitions/a~1b`.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceError::MalformedPointer` when the string does not start
    /// with `/` or contains an escape other than `~0` / `~1`.
    pub fn parse(pointer: &str) -> Result<Self, ReferenceError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(malformed(pointer, "must be empty or start with '/'"));
        };
        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| malformed(pointer, "invalid '~' escape")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    /// A new pointer with `token` appended.
    pub fn append(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// A new pointer with every token of `other` appended.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }

    /// The pointer to the parent node. `None` for the root.
    pub fn head(&self) -> Option<Self> {
        let (_, parent) = self.tokens.split_last()?;
        Some(Self {
            tokens: parent.to_vec(),
        })
    }

    /// The last token, i.e. the name of the addressed member.
    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Look up the addressed node.
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.tokens
            .iter()
            .try_fold(document, |node, token| match node {
                Value::Object(map) => map.get(token),
                Value::Array(items) => array_index(token).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Look up the addressed node for mutation.
    pub fn get_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        self.tokens
            .iter()
            .try_fold(document, |node, token| match node {
                Value::Object(map) => map.get_mut(token),
                Value::Array(items) => array_index(token).and_then(move |i| items.get_mut(i)),
                _ => None,
            })
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Escape a single token for the string form (`~` → `~0`, `/` → `~1`).
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn array_index(token: &str) -> Option<usize> {
    let digits_only = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    token.parse().ok()
}

fn malformed(pointer: &str, message: &str) -> ReferenceError {
    ReferenceError::MalformedPointer {
        pointer: pointer.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_and_display() {
        let pointer = JsonPointer::parse("/definitions/a~1b/c~0d").unwrap();
        assert_eq!(pointer.tokens(), ["definitions", "a/b", "c~d"]);
        assert_eq!(pointer.to_string(), "/definitions/a~1b/c~0d");
    }

    #[test]
    fn empty_string_is_root() {
        let pointer = JsonPointer::parse("").unwrap();
        assert!(pointer.is_root());
        assert_eq!(pointer.to_string(), "");
        assert_eq!(pointer.head(), None);
    }

    #[test]
    fn parse_rejects_missing_slash() {
        let result = JsonPointer::parse("definitions/A");
        assert!(matches!(
            result,
            Err(ReferenceError::MalformedPointer { .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_escape() {
        assert!(JsonPointer::parse("/a~2b").is_err());
        assert!(JsonPointer::parse("/a~").is_err());
    }

    #[test]
    fn head_and_append() {
        let pointer = JsonPointer::root().append("properties").append("name");
        assert_eq!(pointer.to_string(), "/properties/name");
        assert_eq!(pointer.last(), Some("name"));
        assert_eq!(pointer.head().unwrap().to_string(), "/properties");
        assert_eq!(pointer.depth(), 2);
    }

    #[test]
    fn get_walks_objects_and_arrays() {
        let doc = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
        let pointer = JsonPointer::parse("/anyOf/1/type").unwrap();
        assert_eq!(pointer.get(&doc), Some(&json!("integer")));

        let missing = JsonPointer::parse("/anyOf/2").unwrap();
        assert_eq!(missing.get(&doc), None);

        let leading_zero = JsonPointer::parse("/anyOf/01").unwrap();
        assert_eq!(leading_zero.get(&doc), None);
    }

    #[test]
    fn get_mut_allows_in_place_edit() {
        let mut doc = json!({"properties": {"a": {"type": "string"}}});
        let pointer = JsonPointer::parse("/properties/a").unwrap();
        pointer.get_mut(&mut doc).unwrap()["type"] = json!("integer");
        assert_eq!(doc["properties"]["a"]["type"], "integer");
    }
}
