//! Integration tests for reference resolution and inlining.

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use schema_walker::{
    load_schema, resolve_inline, JsonReference, LoadError, RefResolver, ResolveError, SchemaLoader,
};

fn load_fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    load_schema(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {e}", path.display()))
}

fn common_loader() -> SchemaLoader {
    SchemaLoader::new().with_resource("/resolving/common.json", load_fixture("resolving/common.json"))
}

// === Documents without references ===

mod plain {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_refs_is_unchanged() {
        let mut schema = load_fixture("resolving/no-refs.json");
        let before = schema.clone();
        resolve_inline(&mut schema).unwrap();
        assert_eq!(schema, before);
    }
}

// === Local fragments ===

mod local {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_fragment_used_twice() {
        let mut schema = load_fixture("resolving/local-fragment.json");
        resolve_inline(&mut schema).unwrap();

        let expected = json!({"type": "string", "maxLength": 32});
        assert_eq!(schema["properties"]["field"], expected);
        assert_eq!(schema["properties"]["other"], expected);
    }

    #[test]
    fn definitions_are_kept() {
        let mut schema = load_fixture("resolving/local-fragment.json");
        resolve_inline(&mut schema).unwrap();
        assert!(schema["definitions"]["Field"].is_object());
    }

    #[test]
    fn percent_encoded_fragment() {
        let mut schema = json!({
            "properties": {"a": {"$ref": "#/definitions/My%20Type"}},
            "definitions": {"My Type": {"type": "string"}}
        });
        resolve_inline(&mut schema).unwrap();
        assert_eq!(schema["properties"]["a"], json!({"type": "string"}));
    }

    #[test]
    fn transitive_references_expand() {
        let mut schema = json!({
            "properties": {"a": {"$ref": "#/definitions/A"}},
            "definitions": {
                "A": {"$ref": "#/definitions/B"},
                "B": {"type": "object", "properties": {"c": {"$ref": "#/definitions/C"}}},
                "C": {"type": "boolean"}
            }
        });
        resolve_inline(&mut schema).unwrap();
        assert_eq!(
            schema["properties"]["a"],
            json!({"type": "object", "properties": {"c": {"type": "boolean"}}})
        );
    }
}

// === External documents ===

mod external {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fragments_of_registered_document() {
        let mut schema = load_fixture("resolving/external-fragment.json");
        RefResolver::with_loader(common_loader())
            .resolve_inline(&mut schema)
            .unwrap();

        assert_eq!(schema["properties"]["field"], json!({"type": "string"}));
        assert_eq!(
            schema["properties"]["nested"]["properties"]["inner"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn unregistered_document_is_not_found() {
        let mut schema = load_fixture("resolving/external-fragment.json");
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Load(LoadError::ResourceNotFound { .. })
        ));
        assert!(err.is_io());
    }

    #[test]
    fn embedded_meta_schema_fragment() {
        let mut schema = json!({
            "properties": {
                "count": {"$ref": "/json-schema-draft/json-schema-spec-draft-07.json#/definitions/nonNegativeInteger"}
            }
        });
        resolve_inline(&mut schema).unwrap();
        assert_eq!(
            schema["properties"]["count"],
            json!({"type": "integer", "minimum": 0})
        );
    }

    #[test]
    fn jar_reference_reads_embedded_entry() {
        let reference = JsonReference::parse(
            "jar:file:/lib/schemas.jar!/json-schema-draft/json-schema-spec-draft-07.json#/definitions/nonNegativeInteger",
        )
        .unwrap();
        let resolved = RefResolver::new().resolve(&reference, &json!({})).unwrap();
        assert_eq!(resolved, json!({"type": "integer", "minimum": 0}));
    }

    #[test]
    fn file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("common.json");
        schema_walker::write_schema(&path, &load_fixture("resolving/common.json")).unwrap();

        let url = url::Url::from_file_path(&path).unwrap();
        let reference = JsonReference::parse(&format!("{url}#/definitions/Nested")).unwrap();
        let resolved = RefResolver::new().resolve(&reference, &json!({})).unwrap();

        let inner = format!("{url}#/definitions/Field");
        assert_eq!(resolved["properties"]["inner"]["$ref"], json!(inner));
    }

    #[test]
    fn non_ascii_fragment_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json");
        let defs = json!({"definitions": {"Größe": {"type": "number"}}});
        schema_walker::write_schema(&path, &defs).unwrap();

        let url = url::Url::from_file_path(&path).unwrap();
        let reference = JsonReference::parse(&format!("{url}#/definitions/Größe")).unwrap();
        let resolved = RefResolver::new().resolve(&reference, &json!({})).unwrap();
        assert_eq!(resolved, json!({"type": "number"}));
    }

    #[test]
    fn remote_reference_is_not_implemented() {
        let reference = JsonReference::parse("https://example.com/schemas/a.json#/definitions/A").unwrap();
        let err = RefResolver::new().resolve(&reference, &json!({})).unwrap_err();
        match err {
            ResolveError::Load(LoadError::NotImplemented { scheme, .. }) => assert_eq!(scheme, "https"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_scheme_is_unsupported() {
        let reference = JsonReference::parse("ftp://example.com/a.json").unwrap();
        let err = RefResolver::new().resolve(&reference, &json!({})).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Load(LoadError::UnsupportedScheme { .. })
        ));
    }
}

// === Cycles ===

mod cycles {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutual_references_are_a_cycle() {
        let mut schema = load_fixture("resolving/circular-ref.json");
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(err, ResolveError::ReferenceCycle { .. }));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut schema = json!({
            "properties": {"a": {"$ref": "#/definitions/A"}},
            "definitions": {"A": {"$ref": "#/definitions/A"}}
        });
        let err = resolve_inline(&mut schema).unwrap_err();
        match err {
            ResolveError::ReferenceCycle { reference } => assert_eq!(reference, "#/definitions/A"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn recursive_structure_is_reported() {
        let mut schema = load_fixture("reference/circular.json");
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(err, ResolveError::ReferenceCycle { .. }));
    }
}

// === allOf ===

mod all_of {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_is_merged() {
        let mut schema = load_fixture("resolving/all-of-extension.json");
        resolve_inline(&mut schema).unwrap();

        assert_eq!(
            schema["properties"]["field"],
            json!({
                "type": "object",
                "required": ["integer_field", "number_field"],
                "properties": {
                    "integer_field": {"type": "integer"},
                    "number_field": {"type": "number"}
                }
            })
        );
    }

    #[test]
    fn non_array_all_of_is_invalid() {
        let mut schema = json!({"properties": {"a": {"allOf": {"type": "string"}}}});
        let err = resolve_inline(&mut schema).unwrap_err();
        match err {
            ResolveError::InvalidSchema { path, .. } => assert_eq!(path, "/properties/a/allOf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scalar_members_are_invalid() {
        let mut schema = json!({"properties": {"a": {"allOf": [true, false]}}});
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSchema { .. }));
    }
}

// === Errors ===

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dangling_reference() {
        let mut schema = load_fixture("reference/no-definitions-bad.json");
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(err, ResolveError::DanglingReference { .. }));
        assert!(!err.is_io());
    }

    #[test]
    fn malformed_pointer() {
        let mut schema = load_fixture("reference/bad-definition.json");
        let err = resolve_inline(&mut schema).unwrap_err();
        assert!(matches!(err, ResolveError::Reference(_)));
    }

    #[test]
    fn non_object_fragment() {
        let mut schema = json!({
            "properties": {"a": {"$ref": "#/definitions/list"}},
            "definitions": {"list": [1, 2]}
        });
        let err = resolve_inline(&mut schema).unwrap_err();
        match err {
            ResolveError::InvalidFragment { actual, .. } => assert_eq!(actual, "array"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
