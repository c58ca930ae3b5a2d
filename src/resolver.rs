//! `$ref` resolution: fragment lookup, external documents and inlining.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{ReferenceError, ResolveError};
use crate::loader::{DocumentLoader, SchemaLoader};
use crate::pointer::JsonPointer;
use crate::reference::JsonReference;
use crate::stitch::merge_all;
use crate::traversal::SchemaTraversal;
use crate::types::{base_uri, json_type_name, keywords, Strategy};

/// Most substitutions inline resolution nests inside one another.
///
/// A `$ref` inside a substituted fragment is one level deeper than the
/// reference that brought the fragment in. Going past this means the same
/// references keep re-entering each other and is reported as a cycle.
const MAX_EXPANSION_DEPTH: usize = 256;

/// Where a reference points.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A node of the document the reference was found in.
    Local(JsonPointer),
    /// A node of a separately loaded document. References inside `document`
    /// have been rewritten to absolute form.
    External {
        reference: JsonReference,
        document: Value,
        pointer: JsonPointer,
    },
}

impl Fragment {
    /// The referenced node, looked up in `document` for local fragments.
    pub fn node<'a>(&'a self, document: &'a Value) -> Option<&'a Value> {
        match self {
            Fragment::Local(pointer) => pointer.get(document),
            Fragment::External {
                document, pointer, ..
            } => pointer.get(document),
        }
    }
}

/// The reference carried by `node`, resolved against `base`.
///
/// Returns `Ok(None)` when `node` has no string `$ref`.
pub fn node_reference(base: Option<&str>, node: &Value) -> Result<Option<JsonReference>, ReferenceError> {
    match node.get(keywords::REF).and_then(Value::as_str) {
        Some(value) => JsonReference::resolve_against(base, value).map(Some),
        None => Ok(None),
    }
}

/// Resolves references within a document and across documents.
#[derive(Debug, Clone, Default)]
pub struct RefResolver<L = SchemaLoader> {
    loader: L,
}

impl RefResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: DocumentLoader> RefResolver<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Find the node `reference` addresses.
    ///
    /// Local references are looked up in `document`; others are loaded
    /// through the loader. An absent or empty fragment addresses the whole
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::DanglingReference` when the pointer addresses
    /// nothing, or the loader's error when the document cannot be loaded.
    pub fn locate(&self, reference: &JsonReference, document: &Value) -> Result<Fragment, ResolveError> {
        let pointer = reference.pointer()?;

        let Some(origin) = reference.document() else {
            if pointer.get(document).is_none() {
                return Err(dangling(reference));
            }
            return Ok(Fragment::Local(pointer));
        };

        let mut loaded = self.loader.load(reference)?;
        qualify_refs(&mut loaded, &origin)?;
        if pointer.get(&loaded).is_none() {
            return Err(dangling(reference));
        }
        Ok(Fragment::External {
            reference: origin,
            document: loaded,
            pointer,
        })
    }

    /// A copy of the node `reference` addresses.
    pub fn resolve(&self, reference: &JsonReference, document: &Value) -> Result<Value, ResolveError> {
        let fragment = self.locate(reference, document)?;
        fragment
            .node(document)
            .cloned()
            .ok_or_else(|| dangling(reference))
    }

    /// Replace every `$ref` of `document` with the fragment it addresses.
    ///
    /// Nodes are processed children first. A `$ref` node loses its sibling
    /// keys and takes on the fragment's, and the substituted subtree is
    /// processed again so transitive references expand too. A node carrying
    /// `allOf` is replaced by the merge of its members. Any other node clears
    /// the set of references seen so far; meeting a reference that is still in
    /// the set is a cycle.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ReferenceCycle` on a cycle,
    /// `ResolveError::InvalidFragment` when a reference addresses a non-object,
    /// or `ResolveError::InvalidSchema` for an unusable `allOf`.
    pub fn resolve_inline(&self, document: &mut Value) -> Result<(), ResolveError> {
        let base = base_uri(document);
        let mut seen: HashSet<JsonReference> = HashSet::new();
        let mut expansions: HashMap<JsonPointer, usize> = HashMap::new();
        let mut traversal = SchemaTraversal::new(Strategy::PostOrder);
        traversal.traverse_root(document);

        while let Some(visit) = traversal.next() {
            let Some(node) = visit.location.get(document) else {
                trace!(location = %visit.location, "node no longer present, skipping");
                continue;
            };

            if let Some(reference) = node_reference(base.as_deref(), node)? {
                let nesting = expansion_depth(&expansions, &visit.location);
                if !seen.insert(reference.clone()) || nesting >= MAX_EXPANSION_DEPTH {
                    return Err(ResolveError::ReferenceCycle {
                        reference: reference.to_string(),
                    });
                }
                let fragment = self.resolve(&reference, document)?;
                if !fragment.is_object() {
                    return Err(ResolveError::InvalidFragment {
                        reference: reference.to_string(),
                        actual: json_type_name(&fragment).to_string(),
                    });
                }
                debug!(%reference, location = %visit.location, "inlining reference");

                let Some(slot) = visit.location.get_mut(document) else {
                    continue;
                };
                *slot = fragment;
                expansions.insert(visit.location.clone(), nesting + 1);
                traversal.traverse(slot, visit.location, visit.context);
            } else if let Some(members) = node.get(keywords::ALL_OF) {
                let combined = combine_all_of(members, &visit.location)?;
                if let Some(slot) = visit.location.get_mut(document) {
                    *slot = combined;
                }
            } else {
                seen.clear();
            }
        }
        Ok(())
    }
}

/// Inline every `$ref` of `document` using the default loader.
///
/// See [`RefResolver::resolve_inline`].
pub fn resolve_inline(document: &mut Value) -> Result<(), ResolveError> {
    RefResolver::new().resolve_inline(document)
}

/// Substitutions enclosing `location`: the count recorded at the nearest
/// substituted ancestor (or `location` itself).
fn expansion_depth(expansions: &HashMap<JsonPointer, usize>, location: &JsonPointer) -> usize {
    let mut current = Some(location.clone());
    while let Some(pointer) = current {
        if let Some(depth) = expansions.get(&pointer) {
            return *depth;
        }
        current = pointer.head();
    }
    0
}

fn combine_all_of(members: &Value, location: &JsonPointer) -> Result<Value, ResolveError> {
    let invalid = |message: String| ResolveError::InvalidSchema {
        path: location.append(keywords::ALL_OF).to_string(),
        message,
    };
    let members = members
        .as_array()
        .ok_or_else(|| invalid(format!("expected array, found {}", json_type_name(members))))?;
    let combined = merge_all(members).ok_or_else(|| invalid("must not be empty".to_string()))?;
    if !combined.is_object() {
        return Err(invalid(format!(
            "members combine to {}, expected object",
            json_type_name(&combined)
        )));
    }
    Ok(combined)
}

/// Rewrite every `$ref` of a loaded document relative to `origin`, the
/// document's own address.
fn qualify_refs(node: &mut Value, origin: &JsonReference) -> Result<(), ReferenceError> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(value)) = map.get_mut(keywords::REF) {
                let qualified = origin.join(value)?;
                *value = qualified.canonical().to_string();
            }
            for child in map.values_mut() {
                qualify_refs(child, origin)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                qualify_refs(item, origin)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn dangling(reference: &JsonReference) -> ResolveError {
    ResolveError::DanglingReference {
        reference: reference.to_string(),
    }
}
