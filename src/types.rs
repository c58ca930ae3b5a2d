//! Core types and schema vocabulary shared by traversal and resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::SharedBuilder;

/// Keywords the engine treats as structurally significant.
pub mod keywords {
    pub const REF: &str = "$ref";
    pub const ID: &str = "$id";
    pub const TITLE: &str = "title";
    pub const TYPE: &str = "type";
    pub const PROPERTIES: &str = "properties";
    pub const ITEMS: &str = "items";
    pub const REQUIRED: &str = "required";
    pub const ENUM: &str = "enum";
    pub const ALL_OF: &str = "allOf";
    pub const ANY_OF: &str = "anyOf";
    pub const ONE_OF: &str = "oneOf";

    /// Composition keywords in the priority order traversal checks them.
    pub const COMPOSITE: &[&str] = &[ANY_OF, ONE_OF, ALL_OF];
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Order in which a traversal hands out the nodes it collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Parent before children, left to right.
    PreOrder,
    /// Children before parent, right to left.
    #[default]
    PostOrder,
}

/// Why a node was reached during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalLabel {
    /// Schema declaring `"type": "object"`.
    Object,
    /// Schema declaring `"type": "array"`.
    Array,
    /// Any other node.
    #[default]
    Attribute,
    /// The `properties` container of an object schema.
    Properties,
    /// The member list of `anyOf`, `oneOf` or `allOf`.
    Combined,
}

impl TraversalLabel {
    /// Classify a node by its declared type.
    pub fn of(node: &Value) -> Self {
        match declared_type(node) {
            Some("object") => TraversalLabel::Object,
            Some("array") => TraversalLabel::Array,
            _ => TraversalLabel::Attribute,
        }
    }
}

/// The `type` of a schema node when declared as a single string.
pub fn declared_type(node: &Value) -> Option<&str> {
    node.get(keywords::TYPE).and_then(Value::as_str)
}

/// True for nodes whose only meaning is "substitute me": a string `$ref`.
pub fn is_ref(node: &Value) -> bool {
    node.get(keywords::REF).map_or(false, Value::is_string)
}

/// True for array schemas that describe their elements through `items`.
pub fn is_array_schema(node: &Value) -> bool {
    declared_type(node) == Some("array") && node.get(keywords::ITEMS).is_some()
}

/// The first composition keyword present on the node, if any.
pub fn composite_keyword(node: &Value) -> Option<&'static str> {
    let map = node.as_object()?;
    keywords::COMPOSITE
        .iter()
        .copied()
        .find(|keyword| map.contains_key(*keyword))
}

/// True for object nodes declaring an `enum`.
pub fn is_enum(node: &Value) -> bool {
    node.get(keywords::ENUM).is_some()
}

/// Base URI declared by a document: its `$id` without the last segment.
///
/// `{"$id": "/schemas/person.json"}` yields `/schemas`.
pub fn base_uri(schema: &Value) -> Option<String> {
    schema.get(keywords::ID)?.as_str().map(base_of)
}

/// `id` up to its last `/`; empty when there is none.
pub fn base_of(id: &str) -> String {
    match id.rfind('/') {
        Some(index) => id[..index].to_string(),
        None => String::new(),
    }
}

/// Options for walking a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WalkOptions {
    pub strategy: Strategy,
    /// Seed every lineage with the schema's `title`.
    pub title_as_name: bool,
    /// Expand `$ref` nodes while walking. Requires a top-level `$id`.
    pub dynamic_ref_resolution: bool,
    /// Builder attached to every context of the walk.
    #[serde(skip)]
    pub builder: Option<SharedBuilder>,
}

impl WalkOptions {
    /// Post-order walk without reference expansion.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn title_as_name(mut self, enabled: bool) -> Self {
        self.title_as_name = enabled;
        self
    }

    pub fn dynamic_ref_resolution(mut self, enabled: bool) -> Self {
        self.dynamic_ref_resolution = enabled;
        self
    }

    pub fn builder(mut self, builder: SharedBuilder) -> Self {
        self.builder = Some(builder);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_by_declared_type() {
        assert_eq!(
            TraversalLabel::of(&json!({"type": "object"})),
            TraversalLabel::Object
        );
        assert_eq!(
            TraversalLabel::of(&json!({"type": "array"})),
            TraversalLabel::Array
        );
        assert_eq!(
            TraversalLabel::of(&json!({"type": ["string", "null"]})),
            TraversalLabel::Attribute
        );
        assert_eq!(TraversalLabel::of(&json!([1, 2])), TraversalLabel::Attribute);
    }

    #[test]
    fn ref_requires_string_value() {
        assert!(is_ref(&json!({"$ref": "#/definitions/A"})));
        assert!(!is_ref(&json!({"$ref": 12})));
        assert!(!is_ref(&json!(["$ref"])));
    }

    #[test]
    fn array_schema_needs_items() {
        assert!(is_array_schema(&json!({"type": "array", "items": {}})));
        assert!(!is_array_schema(&json!({"type": "array"})));
    }

    #[test]
    fn composite_priority() {
        let node = json!({"allOf": [], "oneOf": [], "anyOf": []});
        assert_eq!(composite_keyword(&node), Some("anyOf"));

        let node = json!({"allOf": [], "oneOf": []});
        assert_eq!(composite_keyword(&node), Some("oneOf"));

        assert_eq!(composite_keyword(&json!({"type": "string"})), None);
    }

    #[test]
    fn base_uri_strips_last_segment() {
        let schema = json!({"$id": "/schemas/reference/parent.json"});
        assert_eq!(base_uri(&schema).as_deref(), Some("/schemas/reference"));

        let schema = json!({"$id": "parent.json"});
        assert_eq!(base_uri(&schema).as_deref(), Some(""));

        assert_eq!(base_uri(&json!({"type": "object"})), None);
    }

    #[test]
    fn walk_options_from_config() {
        let options: WalkOptions = serde_json::from_value(json!({
            "strategy": "pre-order",
            "dynamic-ref-resolution": true
        }))
        .unwrap();
        assert_eq!(options.strategy, Strategy::PreOrder);
        assert!(options.dynamic_ref_resolution);
        assert!(!options.title_as_name);
        assert!(options.builder.is_none());
    }

    #[test]
    fn walk_options_setters() {
        let options = WalkOptions::new()
            .strategy(Strategy::PreOrder)
            .title_as_name(true);
        assert_eq!(options.strategy, Strategy::PreOrder);
        assert!(options.title_as_name);
        assert!(!options.dynamic_ref_resolution);
    }

    #[test]
    fn strategy_defaults_to_post_order() {
        assert_eq!(Strategy::default(), Strategy::PostOrder);
        assert_eq!(
            serde_json::to_string(&Strategy::PreOrder).unwrap(),
            "\"pre-order\""
        );
    }
}
