//! Schema loading from files, strings and embedded resources.
//!
//! External `$ref` targets are fetched through a [`DocumentLoader`]. The stock
//! [`SchemaLoader`] dispatches on the reference scheme:
//!
//! | scheme          | source                                               |
//! |-----------------|------------------------------------------------------|
//! | none            | resources registered on the loader, then embedded    |
//! | `jar`           | resources embedded in this library                   |
//! | `file`          | local filesystem                                     |
//! | `http`, `https` | not implemented                                      |

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::LoadError;
use crate::reference::JsonReference;

/// Resources compiled into the library (meta-schemas and the like).
static RESOURCES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// Fetches the document an external reference points at.
pub trait DocumentLoader {
    /// Load the whole document addressed by `reference`'s locator. The
    /// fragment is not applied.
    fn load(&self, reference: &JsonReference) -> Result<Value, LoadError>;
}

/// Default [`DocumentLoader`].
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    bundled: HashMap<String, Value>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `path` for scheme-less references.
    pub fn with_resource(mut self, path: &str, document: Value) -> Self {
        self.add_resource(path, document);
        self
    }

    pub fn add_resource(&mut self, path: &str, document: Value) {
        self.bundled.insert(resource_key(path).to_string(), document);
    }

    fn load_resource(&self, locator: &str) -> Result<Value, LoadError> {
        match self.bundled.get(resource_key(locator)) {
            Some(document) => Ok(document.clone()),
            None => load_embedded(locator),
        }
    }
}

impl DocumentLoader for SchemaLoader {
    fn load(&self, reference: &JsonReference) -> Result<Value, LoadError> {
        let Some(locator) = reference.locator() else {
            return Err(LoadError::ResourceNotFound {
                path: reference.to_string(),
            });
        };
        debug!(%reference, "loading document");

        match reference.scheme() {
            None => self.load_resource(locator),
            Some("jar") => load_embedded(jar_entry(locator)),
            Some("file") => {
                let path = Url::parse(locator)
                    .ok()
                    .and_then(|url| url.to_file_path().ok())
                    .ok_or_else(|| LoadError::InvalidFilePath {
                        locator: locator.to_string(),
                    })?;
                load_schema(&path)
            }
            Some(scheme @ ("http" | "https")) => Err(LoadError::NotImplemented {
                scheme: scheme.to_string(),
                locator: locator.to_string(),
            }),
            Some(scheme) => Err(LoadError::UnsupportedScheme {
                scheme: scheme.to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}

/// Load a schema from a file path.
///
/// The file must be strict JSON; comments are not accepted.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson {
        location: path.display().to_string(),
        source,
    })
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson {
        location: "<string>".to_string(),
        source,
    })
}

/// Load a resource embedded in this library, e.g.
/// `/json-schema-draft/json-schema-spec-draft-07.json`.
pub fn load_embedded(path: &str) -> Result<Value, LoadError> {
    let key = resource_key(path);
    let content = RESOURCES
        .get_file(key)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| LoadError::ResourceNotFound {
            path: path.to_string(),
        })?;
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson {
        location: path.to_string(),
        source,
    })
}

/// Write `schema` as pretty-printed JSON, creating parent directories.
pub fn write_schema(path: &Path, schema: &Value) -> Result<(), LoadError> {
    let write_error = |source| LoadError::WriteError {
        path: PathBuf::from(path),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let mut content = serde_json::to_string_pretty(schema).map_err(|source| LoadError::InvalidJson {
        location: path.display().to_string(),
        source,
    })?;
    content.push('\n');
    fs::write(path, content).map_err(write_error)
}

fn resource_key(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Entry name inside an archive locator: `jar:file:/lib.jar!/a/b.json` → `/a/b.json`.
fn jar_entry(locator: &str) -> &str {
    let opaque = locator.strip_prefix("jar:").unwrap_or(locator);
    match opaque.rsplit_once('!') {
        Some((_, entry)) => entry,
        None => opaque,
    }
}
