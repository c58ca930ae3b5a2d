//! Bundled JSON Schema meta-schemas.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::warn;

use crate::error::LoadError;
use crate::loader::load_embedded;

/// JSON Schema drafts whose meta-schemas ship with the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    Draft3,
    Draft4,
    Draft7,
}

static META_SCHEMAS: OnceLock<HashMap<SchemaVersion, Value>> = OnceLock::new();

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [
        SchemaVersion::Draft3,
        SchemaVersion::Draft4,
        SchemaVersion::Draft7,
    ];

    /// Path of the meta-schema among the embedded resources.
    pub fn location(self) -> &'static str {
        match self {
            SchemaVersion::Draft3 => "/json-schema-draft/json-schema-spec-draft-03.json",
            SchemaVersion::Draft4 => "/json-schema-draft/json-schema-spec-draft-04.json",
            SchemaVersion::Draft7 => "/json-schema-draft/json-schema-spec-draft-07.json",
        }
    }

    /// A copy of the meta-schema.
    ///
    /// Meta-schemas are parsed once per process and cached.
    pub fn schema(self) -> Result<Value, LoadError> {
        let cache = META_SCHEMAS.get_or_init(|| {
            Self::ALL
                .iter()
                .filter_map(|version| match load_embedded(version.location()) {
                    Ok(schema) => Some((*version, schema)),
                    Err(error) => {
                        warn!(%version, %error, "meta-schema unavailable");
                        None
                    }
                })
                .collect()
        });
        match cache.get(&self) {
            Some(schema) => Ok(schema.clone()),
            None => load_embedded(self.location()),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaVersion::Draft3 => "draft-03",
            SchemaVersion::Draft4 => "draft-04",
            SchemaVersion::Draft7 => "draft-07",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_version_loads() {
        for version in SchemaVersion::ALL {
            let schema = version.schema().unwrap();
            assert!(
                schema["properties"].is_object(),
                "{version} has no properties"
            );
        }
    }

    #[test]
    fn copies_are_independent() {
        let mut first = SchemaVersion::Draft7.schema().unwrap();
        first["properties"] = Value::Null;
        let second = SchemaVersion::Draft7.schema().unwrap();
        assert!(second["properties"].is_object());
    }

    #[test]
    fn draft_specific_keywords() {
        let draft3 = SchemaVersion::Draft3.schema().unwrap();
        assert!(draft3["properties"].get("divisibleBy").is_some());

        let draft7 = SchemaVersion::Draft7.schema().unwrap();
        assert!(draft7["properties"].get("$id").is_some());
        assert!(draft7["properties"].get("divisibleBy").is_none());
    }
}
