//! Schema-aware enumeration of the nodes of a document.
//!
//! The traversal does not hold on to the document. It records, for every node
//! it reaches, the node's exact location in the traversed document and the
//! [`TraversalContext`] describing it; callers look the node up again when
//! they need it. This keeps the document free for in-place mutation while the
//! queue is drained.

use std::collections::VecDeque;

use serde_json::Value;

use crate::context::TraversalContext;
use crate::pointer::JsonPointer;
use crate::types::{composite_keyword, is_array_schema, is_ref, keywords, Strategy, TraversalLabel};

/// One node reached by a traversal.
#[derive(Debug, Clone)]
pub struct Visit {
    /// Exact path of the node in the traversed document, array indices
    /// included.
    pub location: JsonPointer,
    pub context: TraversalContext,
}

/// Queue of visits, drained in pre-order or post-order.
///
/// `traverse` may be called again while the queue is being drained; under
/// post-order the newly added nodes come out next.
#[derive(Debug, Default)]
pub struct SchemaTraversal {
    strategy: Strategy,
    queue: VecDeque<Visit>,
}

impl SchemaTraversal {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            queue: VecDeque::new(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Traverse a whole document from a fresh root context.
    pub fn traverse_root(&mut self, document: &Value) {
        let context = TraversalContext::for_document(document);
        self.traverse(document, JsonPointer::root(), context);
    }

    /// Traverse `node`, found at `location`, starting from `context`.
    ///
    /// The context's ref flag is kept, and raised when `node` is itself a
    /// `$ref`.
    pub fn traverse(&mut self, node: &Value, location: JsonPointer, mut context: TraversalContext) {
        context.is_ref |= is_ref(node);
        self.collect(node, location, context);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn collect(&mut self, node: &Value, location: JsonPointer, mut context: TraversalContext) {
        context.label = TraversalLabel::of(node);
        self.queue.push_back(Visit {
            location: location.clone(),
            context: context.clone(),
        });

        match node {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let mut element = context.clone();
                    element.is_ref = is_ref(item);
                    self.collect(item, location.append(index.to_string()), element);
                }
            }
            Value::Object(map) => {
                if let Some(properties) = map.get(keywords::PROPERTIES) {
                    self.collect_properties(properties, &location, &context);
                } else if is_array_schema(node) {
                    if let Some(items) = map.get(keywords::ITEMS) {
                        let mut child = context.descend(keywords::ITEMS);
                        child.is_ref = is_ref(items);
                        self.collect(items, location.append(keywords::ITEMS), child);
                    }
                } else if let Some(keyword) = composite_keyword(node) {
                    if let Some(members) = map.get(keyword) {
                        self.collect_combined(keyword, members, &location, &context);
                    }
                }
            }
            _ => {}
        }
    }

    fn collect_properties(&mut self, properties: &Value, location: &JsonPointer, context: &TraversalContext) {
        let location = location.append(keywords::PROPERTIES);
        let mut container = context.descend(keywords::PROPERTIES);
        container.is_ref = false;
        container.label = TraversalLabel::Properties;
        self.queue.push_back(Visit {
            location: location.clone(),
            context: container.clone(),
        });

        let Some(map) = properties.as_object() else {
            return;
        };
        for (name, property) in map {
            let mut child = container.property(name);
            child.is_ref = is_ref(property);
            self.collect(property, location.append(name.as_str()), child);
        }
    }

    fn collect_combined(
        &mut self,
        keyword: &str,
        members: &Value,
        location: &JsonPointer,
        context: &TraversalContext,
    ) {
        let location = location.append(keyword);
        let mut container = context.descend(keyword);
        container.is_ref = false;
        container.label = TraversalLabel::Combined;
        self.queue.push_back(Visit {
            location: location.clone(),
            context: container.clone(),
        });

        let Some(items) = members.as_array() else {
            return;
        };
        for (index, member) in items.iter().enumerate() {
            let mut child = container.clone();
            child.is_ref = is_ref(member);
            self.collect(member, location.append(index.to_string()), child);
        }
    }
}

impl Iterator for SchemaTraversal {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        match self.strategy {
            Strategy::PreOrder => self.queue.pop_front(),
            Strategy::PostOrder => self.queue.pop_back(),
        }
    }
}
