//! Per-node traversal state handed to visitors.

use serde_json::Value;

use crate::builder::SharedBuilder;
use crate::pointer::JsonPointer;
use crate::types::{keywords, TraversalLabel};

/// Where a node sits in the schema and how it was reached.
///
/// Each node yielded by a traversal carries its own copy; mutating one never
/// affects another. The builder handle is the one piece of state that is
/// shared between copies.
#[derive(Debug, Clone, Default)]
pub struct TraversalContext {
    /// `$id` of the traversed root document, if it declares one.
    pub document_id: Option<String>,
    /// Logical schema pointer from the root to this node.
    pub pointer: JsonPointer,
    /// True when the node is a `$ref` or was reached through one.
    pub is_ref: bool,
    pub label: TraversalLabel,
    /// Property names from the root to this node.
    pub lineage: Vec<String>,
    /// True when `lineage[0]` is the schema title rather than a property name.
    pub title_included: bool,
    pub builder: Option<SharedBuilder>,
}

impl TraversalContext {
    /// A root context for `document`.
    pub fn for_document(document: &Value) -> Self {
        Self {
            document_id: document
                .get(keywords::ID)
                .and_then(Value::as_str)
                .map(str::to_string),
            label: TraversalLabel::of(document),
            ..Self::default()
        }
    }

    /// Seed the lineage with the schema title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.lineage.insert(0, title.into());
        self.title_included = true;
        self
    }

    pub fn with_builder(mut self, builder: SharedBuilder) -> Self {
        self.builder = Some(builder);
        self
    }

    /// A copy of this context one pointer token deeper.
    pub(crate) fn descend(&self, token: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.pointer = self.pointer.append(token);
        child
    }

    /// A copy of this context for the named property `name`.
    pub(crate) fn property(&self, name: &str) -> Self {
        let mut child = self.descend(name);
        child.lineage.push(name.to_string());
        child
    }

    pub fn parent_pointer(&self) -> Option<JsonPointer> {
        self.pointer.head()
    }

    /// The last lineage entry: the name of the current property.
    pub fn current_field_name(&self) -> Option<&str> {
        self.lineage.last().map(String::as_str)
    }

    /// The lineage entry before the current one. The title seed is never a
    /// parent field name.
    pub fn parent_field_name(&self) -> Option<&str> {
        let index = self.lineage.len().checked_sub(2)?;
        if index < self.title_offset() {
            return None;
        }
        self.lineage.get(index).map(String::as_str)
    }

    /// Lineage joined with `.`, without the title seed.
    pub fn fully_qualified_name(&self) -> String {
        self.lineage[self.title_offset().min(self.lineage.len())..].join(".")
    }

    /// True when the node is a named member of a `properties` container.
    pub fn is_property(&self) -> bool {
        self.pointer
            .head()
            .is_some_and(|parent| parent.last() == Some(keywords::PROPERTIES))
    }

    /// True when the node belongs to the top-level object of the schema.
    pub fn is_root_level(&self) -> bool {
        self.lineage.len() <= self.title_offset()
    }

    fn title_offset(&self) -> usize {
        usize::from(self.title_included)
    }
}
