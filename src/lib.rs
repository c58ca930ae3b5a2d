//! Schema Walker
//!
//! Traversal, `$ref` resolution and stitching of JSON Schema documents.
//!
//! A schema is walked node by node in pre-order or post-order. Each node is
//! handed to a list of visitors together with a [`TraversalContext`] that says
//! where the node sits (pointer, property lineage) and what it is (object,
//! array, `properties` container, composition list, reference). Visitors edit
//! the document in place.
//!
//! # Example
//!
//! ```
//! use schema_walker::{walk, TraversalContext, WalkOptions};
//! use serde_json::{json, Value};
//!
//! let mut schema = json!({
//!     "$id": "/schemas/order.json",
//!     "type": "object",
//!     "properties": {
//!         "buyer": { "$ref": "#/definitions/Person" }
//!     },
//!     "definitions": {
//!         "Person": {
//!             "type": "object",
//!             "properties": { "name": { "type": "string" } }
//!         }
//!     }
//! });
//!
//! let mut names = Vec::new();
//! let mut collect = |_: &mut Value, ctx: &TraversalContext| {
//!     if ctx.is_property() && !ctx.is_ref {
//!         names.push(ctx.fully_qualified_name());
//!     }
//! };
//!
//! let options = WalkOptions::new().dynamic_ref_resolution(true);
//! walk(&mut schema, options, &mut [&mut collect]).unwrap();
//!
//! assert_eq!(names, vec!["buyer.name"]);
//! ```
//!
//! # Inlining references
//!
//! ```
//! use schema_walker::resolve_inline;
//! use serde_json::json;
//!
//! let mut schema = json!({
//!     "properties": {
//!         "id": { "allOf": [{ "$ref": "#/definitions/Id" }, { "maxLength": 8 }] }
//!     },
//!     "definitions": { "Id": { "type": "string" } }
//! });
//!
//! resolve_inline(&mut schema).unwrap();
//! assert_eq!(schema["properties"]["id"], json!({ "type": "string", "maxLength": 8 }));
//! ```
//!
//! # Reference resolution
//!
//! | `$ref` form                         | resolved against                         |
//! |-------------------------------------|------------------------------------------|
//! | `#/definitions/A`                   | the current document                     |
//! | `child.json#/definitions/A`         | directory of the root `$id`              |
//! | `/schemas/child.json`               | loader resources                         |
//! | `file:///tmp/child.json`            | local filesystem                         |
//! | `https://example.com/child.json`    | not implemented                          |

mod builder;
mod context;
mod error;
mod loader;
mod pointer;
mod reference;
mod resolver;
mod stitch;
mod traversal;
mod types;
mod version;
mod visitors;
mod walker;

pub use builder::{shared, SchemaBuilder, SharedBuilder, TreeBuilder};
pub use context::TraversalContext;
pub use error::{BuildError, LoadError, ReferenceError, ResolveError, VisitorError, WalkError};
pub use loader::{load_embedded, load_schema, load_schema_str, write_schema, DocumentLoader, SchemaLoader};
pub use pointer::JsonPointer;
pub use reference::{has_scheme, JsonReference};
pub use resolver::{node_reference, resolve_inline, Fragment, RefResolver};
pub use stitch::{merge, merge_all};
pub use traversal::{SchemaTraversal, Visit};
pub use types::{keywords, Strategy, TraversalLabel, WalkOptions};
pub use version::SchemaVersion;
pub use visitors::{
    CaseFormat, EnumCollector, FieldNamesCollector, KeywordsFilter, Level, NamespaceVisitor,
    NamingStrategyVisitor, PropertiesFilter, SubtreeCollector,
};
pub use walker::{walk, SchemaWalker, Visitor};
