//! Error types for schema traversal, reference resolution and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while parsing `$ref` values and JSON Pointers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("malformed reference \"{reference}\": {message}")]
    MalformedReference { reference: String, message: String },

    #[error("malformed pointer \"{pointer}\": {message}")]
    MalformedPointer { pointer: String, message: String },
}

/// Errors raised by a document loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {location}: {source}")]
    InvalidJson {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("loading documents over {scheme} is not implemented: {locator}")]
    NotImplemented { scheme: String, locator: String },

    #[error("unsupported scheme \"{scheme}\" in {locator}")]
    UnsupportedScheme { scheme: String, locator: String },

    #[error("cannot map {locator} to a local file path")]
    InvalidFilePath { locator: String },
}

/// Errors during reference resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("dangling reference: {reference} does not address any node")]
    DanglingReference { reference: String },

    #[error("reference cycle: {reference} has been seen already")]
    ReferenceCycle { reference: String },

    #[error("reference {reference} resolves to {actual}, expected object")]
    InvalidFragment { reference: String, actual: String },

    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
}

/// Errors during a walk over a schema tree.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("$id must be declared at the top level of the schema for reference resolution")]
    MissingDocumentId,

    #[error("schema title is required to seed field names but is missing")]
    MissingTitle,

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors while reassembling a document from collected nodes.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot place node at {pointer}: {segment} is not an object")]
    PathConflict { pointer: String, segment: String },
}

/// Errors while configuring a stock visitor.
#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("meta-schema must describe allowed keywords under \"properties\"")]
    MissingVocabulary,

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ResolveError {
    /// Returns true when the failure came from reading a document.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ResolveError::Load(LoadError::FileNotFound { .. })
                | ResolveError::Load(LoadError::ReadError { .. })
                | ResolveError::Load(LoadError::ResourceNotFound { .. })
        )
    }
}
