//! Visitor-driven walks over a schema, with optional `$ref` expansion.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::builder::SharedBuilder;
use crate::context::TraversalContext;
use crate::error::{ResolveError, WalkError};
use crate::loader::{DocumentLoader, SchemaLoader};
use crate::pointer::JsonPointer;
use crate::reference::JsonReference;
use crate::resolver::{node_reference, Fragment, RefResolver};
use crate::traversal::{SchemaTraversal, Visit};
use crate::types::{base_of, keywords, WalkOptions};

/// Callback invoked for every node of a walk.
///
/// Visitors may edit the node in place. Any
/// `FnMut(&mut Value, &TraversalContext)` closure is a visitor.
pub trait Visitor {
    fn visit(&mut self, node: &mut Value, context: &TraversalContext);
}

impl<F> Visitor for F
where
    F: FnMut(&mut Value, &TraversalContext),
{
    fn visit(&mut self, node: &mut Value, context: &TraversalContext) {
        self(node, context)
    }
}

/// Walks a schema, handing every node to a list of visitors.
///
/// With dynamic reference resolution enabled, each `$ref` node (as left by
/// the visitors) is followed: the fragment it addresses is walked with the
/// `$ref` node's context before the walk moves on. A reference that was
/// already followed during the same walk is not followed again.
#[derive(Debug)]
pub struct SchemaWalker<L = SchemaLoader> {
    options: WalkOptions,
    resolver: RefResolver<L>,
}

impl SchemaWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self::with_loader(options, SchemaLoader::new())
    }
}

impl<L: DocumentLoader> SchemaWalker<L> {
    pub fn with_loader(options: WalkOptions, loader: L) -> Self {
        Self {
            options,
            resolver: RefResolver::with_loader(loader),
        }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// The builder attached to this walker's contexts.
    pub fn tree_builder(&self) -> Option<&SharedBuilder> {
        self.options.builder.as_ref()
    }

    /// Walk `schema` from a root context built from the options.
    ///
    /// # Errors
    ///
    /// Returns `WalkError::MissingTitle` when titles seed the lineage but the
    /// schema has none, `WalkError::MissingDocumentId` when references are
    /// expanded but the schema declares no `$id`, or the resolution error of a
    /// reference that cannot be followed.
    pub fn walk(&self, schema: &mut Value, visitors: &mut [&mut dyn Visitor]) -> Result<(), WalkError> {
        let mut context = TraversalContext::for_document(schema);
        if self.options.title_as_name {
            let title = schema
                .get(keywords::TITLE)
                .and_then(Value::as_str)
                .ok_or(WalkError::MissingTitle)?;
            context = context.with_title(title);
        }
        if let Some(builder) = &self.options.builder {
            context = context.with_builder(builder.clone());
        }
        self.walk_with_context(schema, context, visitors)
    }

    /// Walk `schema` starting from a caller-supplied root context.
    pub fn walk_with_context(
        &self,
        schema: &mut Value,
        context: TraversalContext,
        visitors: &mut [&mut dyn Visitor],
    ) -> Result<(), WalkError> {
        if self.options.dynamic_ref_resolution && schema.get(keywords::ID).is_none() {
            return Err(WalkError::MissingDocumentId);
        }

        let mut traversal = SchemaTraversal::new(self.options.strategy);
        traversal.traverse(schema, JsonPointer::root(), context);
        debug!(nodes = traversal.len(), strategy = ?self.options.strategy, "walking schema");

        let mut seen = HashSet::new();
        self.drain(schema, traversal, &mut seen, visitors)
    }

    fn drain(
        &self,
        document: &mut Value,
        mut traversal: SchemaTraversal,
        seen: &mut HashSet<JsonReference>,
        visitors: &mut [&mut dyn Visitor],
    ) -> Result<(), WalkError> {
        while let Some(Visit { location, context }) = traversal.next() {
            let Some(node) = location.get_mut(document) else {
                trace!(%location, "node no longer present, skipping");
                continue;
            };
            for visitor in visitors.iter_mut() {
                visitor.visit(node, &context);
            }
            if !self.options.dynamic_ref_resolution {
                continue;
            }

            let base = context.document_id.as_deref().map(base_of);
            let Some(reference) = node_reference(base.as_deref(), node).map_err(ResolveError::from)? else {
                continue;
            };
            if !seen.insert(reference.clone()) {
                trace!(%reference, "reference already followed");
                continue;
            }

            debug!(%reference, pointer = %context.pointer, "following reference");
            match self.resolver.locate(&reference, document)? {
                Fragment::Local(pointer) => {
                    let Some(fragment) = pointer.get(document) else {
                        continue;
                    };
                    let mut nested = SchemaTraversal::new(traversal.strategy());
                    nested.traverse(fragment, pointer, context);
                    self.drain(document, nested, seen, visitors)?;
                }
                Fragment::External {
                    mut document,
                    pointer,
                    ..
                } => {
                    let Some(fragment) = pointer.get(&document) else {
                        continue;
                    };
                    let mut nested = SchemaTraversal::new(traversal.strategy());
                    nested.traverse(fragment, pointer, context);
                    self.drain(&mut document, nested, seen, visitors)?;
                }
            }
        }
        Ok(())
    }
}

/// Walk `schema` with the default loader.
///
/// See [`SchemaWalker::walk`].
pub fn walk(
    schema: &mut Value,
    options: WalkOptions,
    visitors: &mut [&mut dyn Visitor],
) -> Result<(), WalkError> {
    SchemaWalker::new(options).walk(schema, visitors)
}
