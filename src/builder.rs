//! Reassembly of a document from `(pointer, node)` pairs.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BuildError;
use crate::pointer::JsonPointer;
use crate::stitch::merge;

/// Collects nodes during a walk and builds a document from them afterwards.
pub trait TreeBuilder: Debug {
    fn add(&mut self, pointer: JsonPointer, node: Value);

    fn build_tree(&self) -> Result<Value, BuildError>;
}

/// Builder handle shared by every context of one walk.
pub type SharedBuilder = Rc<RefCell<dyn TreeBuilder>>;

/// Wrap a builder so it can be attached to a walk.
pub fn shared<B: TreeBuilder + 'static>(builder: B) -> SharedBuilder {
    Rc::new(RefCell::new(builder))
}

/// [`TreeBuilder`] that merges every collected node into an object tree.
///
/// Nodes are placed shallowest first; the root pointer is ignored and missing
/// intermediate objects are created.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<(JsonPointer, Value)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TreeBuilder for SchemaBuilder {
    fn add(&mut self, pointer: JsonPointer, node: Value) {
        let duplicate = self
            .nodes
            .iter()
            .any(|(p, n)| *p == pointer && *n == node);
        if !duplicate {
            self.nodes.push((pointer, node));
        }
    }

    fn build_tree(&self) -> Result<Value, BuildError> {
        let mut ordered: Vec<&(JsonPointer, Value)> = self.nodes.iter().collect();
        ordered.sort_by_key(|(pointer, _)| pointer.depth());

        let mut tree = Value::Object(Map::new());
        for (pointer, node) in ordered {
            if pointer.is_root() {
                continue;
            }
            let slot = slot_at(&mut tree, pointer)?;
            merge(slot, node);
        }
        debug!(nodes = self.nodes.len(), "built tree");
        Ok(tree)
    }
}

/// The node at `pointer`, creating empty objects along the way.
fn slot_at<'a>(tree: &'a mut Value, pointer: &JsonPointer) -> Result<&'a mut Value, BuildError> {
    let mut current = tree;
    for (depth, token) in pointer.tokens().iter().enumerate() {
        let Value::Object(map) = current else {
            return Err(BuildError::PathConflict {
                pointer: pointer.to_string(),
                segment: JsonPointer::from_tokens(&pointer.tokens()[..depth]).to_string(),
            });
        };
        current = map
            .entry(token.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Ok(current)
}
