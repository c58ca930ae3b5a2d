//! Stock visitors for common schema transformations and queries.

use std::collections::{BTreeSet, HashSet};

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde_json::{Map, Value};
use tracing::trace;

use crate::context::TraversalContext;
use crate::error::VisitorError;
use crate::types::{is_enum, is_ref, keywords, TraversalLabel};
use crate::version::SchemaVersion;
use crate::walker::Visitor;

/// Removes keywords a meta-schema does not define.
///
/// `$ref` nodes and `properties` containers are left alone; the latter hold
/// property names, not keywords.
#[derive(Debug, Clone)]
pub struct KeywordsFilter {
    allowed: HashSet<String>,
}

impl KeywordsFilter {
    /// Allow the keywords listed under the meta-schema's `properties`.
    pub fn new(meta_schema: &Value) -> Result<Self, VisitorError> {
        let vocabulary = meta_schema
            .get(keywords::PROPERTIES)
            .and_then(Value::as_object)
            .ok_or(VisitorError::MissingVocabulary)?;
        Ok(Self {
            allowed: vocabulary.keys().cloned().collect(),
        })
    }

    pub fn for_version(version: SchemaVersion) -> Result<Self, VisitorError> {
        Self::new(&version.schema()?)
    }
}

impl Visitor for KeywordsFilter {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref || context.label == TraversalLabel::Properties {
            return;
        }
        if let Some(map) = node.as_object_mut() {
            map.retain(|key, _| {
                let keep = self.allowed.contains(key);
                if !keep {
                    trace!(keyword = %key, pointer = %context.pointer, "dropping unknown keyword");
                }
                keep
            });
        }
    }
}

/// Collects every property name declared in the schema.
#[derive(Debug, Clone, Default)]
pub struct FieldNamesCollector {
    names: BTreeSet<String>,
}

impl FieldNamesCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn into_names(self) -> BTreeSet<String> {
        self.names
    }
}

impl Visitor for FieldNamesCollector {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref || context.label != TraversalLabel::Properties {
            return;
        }
        if let Some(map) = node.as_object() {
            self.names.extend(map.keys().cloned());
        }
    }
}

/// Keeps only the listed top-level properties.
///
/// The top-level `required` list is pruned to match and dropped when nothing
/// remains in it.
#[derive(Debug, Clone)]
pub struct PropertiesFilter {
    keep: HashSet<String>,
}

impl PropertiesFilter {
    pub fn new<I, S>(keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }
}

impl Visitor for PropertiesFilter {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref || !context.is_root_level() {
            return;
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };

        if context.label == TraversalLabel::Properties {
            map.retain(|name, _| self.keep.contains(name));
            return;
        }

        let Some(required) = map.remove(keywords::REQUIRED) else {
            return;
        };
        let kept: Vec<Value> = required
            .as_array()
            .into_iter()
            .flatten()
            .filter(|name| name.as_str().is_some_and(|n| self.keep.contains(n)))
            .cloned()
            .collect();
        if !kept.is_empty() {
            map.insert(keywords::REQUIRED.to_string(), Value::Array(kept));
        }
    }
}

/// Collects the distinct enumeration schemas of a document.
#[derive(Debug, Clone, Default)]
pub struct EnumCollector {
    selected: Vec<Value>,
}

impl EnumCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[Value] {
        &self.selected
    }

    pub fn into_selected(self) -> Vec<Value> {
        self.selected
    }
}

impl Visitor for EnumCollector {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref || context.label != TraversalLabel::Attribute || !is_enum(node) {
            return;
        }
        if !self.selected.contains(node) {
            self.selected.push(node.clone());
        }
    }
}

/// Which part of the schema a [`NamespaceVisitor`] rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// Only the top-level object.
    #[default]
    Root,
    /// Every object in the schema.
    All,
}

/// Adds a prefix and/or suffix to property names and `required` entries.
///
/// ```
/// use schema_walker::{walk, Level, NamespaceVisitor, WalkOptions};
/// use serde_json::json;
///
/// let mut schema = json!({
///     "type": "object",
///     "required": ["id"],
///     "properties": {"id": {"type": "string"}}
/// });
/// let mut namespace = NamespaceVisitor::new()
///     .level(Level::Root)
///     .prefix("entry")
///     .delimiter("_");
/// walk(&mut schema, WalkOptions::new(), &mut [&mut namespace]).unwrap();
///
/// assert_eq!(schema["required"], json!(["entry_id"]));
/// assert!(schema["properties"].get("entry_id").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NamespaceVisitor {
    level: Level,
    prefix: Option<String>,
    suffix: Option<String>,
    delimiter: String,
}

impl NamespaceVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    fn rename(&self, name: &str) -> String {
        let mut renamed = name.to_string();
        if let Some(prefix) = &self.prefix {
            renamed = format!("{prefix}{}{renamed}", self.delimiter);
        }
        if let Some(suffix) = &self.suffix {
            renamed = format!("{renamed}{}{suffix}", self.delimiter);
        }
        renamed
    }
}

impl Visitor for NamespaceVisitor {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref || (self.level == Level::Root && !context.is_root_level()) {
            return;
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };

        match context.label {
            TraversalLabel::Properties => {
                let renamed: Map<String, Value> = std::mem::take(map)
                    .into_iter()
                    .map(|(name, value)| (self.rename(&name), value))
                    .collect();
                *map = renamed;
            }
            TraversalLabel::Object => {
                if let Some(Value::Array(required)) = map.get_mut(keywords::REQUIRED) {
                    for entry in required.iter_mut() {
                        if let Some(name) = entry.as_str() {
                            *entry = Value::String(self.rename(name));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Naming conventions for property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseFormat {
    /// `lowerCamel`
    LowerCamel,
    /// `UpperCamel`
    UpperCamel,
    /// `lower_underscore`
    LowerUnderscore,
    /// `UPPER_UNDERSCORE`
    UpperUnderscore,
    /// `lower-hyphen`
    LowerHyphen,
}

impl CaseFormat {
    /// `name` rewritten in this format.
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseFormat::LowerCamel => name.to_lower_camel_case(),
            CaseFormat::UpperCamel => name.to_upper_camel_case(),
            CaseFormat::LowerUnderscore => name.to_snake_case(),
            CaseFormat::UpperUnderscore => name.to_shouty_snake_case(),
            CaseFormat::LowerHyphen => name.to_kebab_case(),
        }
    }

    /// True when `name` is already written in this format.
    pub fn matches(self, name: &str) -> bool {
        self.apply(name) == name
    }
}

/// Converts property names and `required` entries from one naming
/// convention to another.
///
/// Names not written in the source format are left as they are.
#[derive(Debug, Clone, Copy)]
pub struct NamingStrategyVisitor {
    from: CaseFormat,
    to: CaseFormat,
}

impl NamingStrategyVisitor {
    pub fn new(from: CaseFormat, to: CaseFormat) -> Self {
        Self { from, to }
    }

    fn rename(&self, name: &str) -> String {
        if self.from.matches(name) {
            self.to.apply(name)
        } else {
            name.to_string()
        }
    }
}

impl Visitor for NamingStrategyVisitor {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        if context.is_ref {
            return;
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };

        if context.label == TraversalLabel::Properties {
            let renamed: Map<String, Value> = std::mem::take(map)
                .into_iter()
                .map(|(name, value)| (self.rename(&name), value))
                .collect();
            *map = renamed;
        } else if let Some(Value::Array(required)) = map.get_mut(keywords::REQUIRED) {
            for entry in required.iter_mut() {
                if let Some(name) = entry.as_str() {
                    *entry = Value::String(self.rename(name));
                }
            }
        }
    }
}

/// Sends a copy of every visited node to the walk's tree builder.
///
/// `$ref` nodes in the copy are replaced by empty objects. Nodes visited
/// without a builder in their context are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtreeCollector;

impl Visitor for SubtreeCollector {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        let Some(builder) = &context.builder else {
            return;
        };
        builder
            .borrow_mut()
            .add(context.pointer.clone(), without_refs(node));
    }
}

fn without_refs(node: &Value) -> Value {
    match node {
        Value::Object(_) if is_ref(node) => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), without_refs(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_refs).collect()),
        other => other.clone(),
    }
}
