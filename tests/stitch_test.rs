//! Integration tests for schema stitching.

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use schema_walker::{load_schema, merge, merge_all};

fn load_fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    load_schema(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {e}", path.display()))
}

fn stitched() -> Value {
    let mut target = load_fixture("stitching/target.json");
    merge(&mut target, &load_fixture("stitching/update.json"));
    target
}

#[test]
fn object_nodes_from_both_sides() {
    let schema = stitched();
    assert!(schema["properties"].get("target_object_node").is_some());
    assert!(schema["properties"].get("update_object_node").is_some());
}

#[test]
fn required_lists_are_combined() {
    let schema = stitched();
    assert_eq!(
        schema["required"],
        json!(["target_object_node", "update_object_node"])
    );
}

#[test]
fn array_items_are_merged() {
    let schema = stitched();
    let items = &schema["properties"]["common_array_node"]["items"]["properties"];
    assert_eq!(items["target_element"], json!({"type": "string"}));
    assert_eq!(items["update_element"], json!({"type": "string"}));
}

#[test]
fn conflicting_scalar_takes_update() {
    let schema = stitched();
    assert_eq!(schema["properties"]["conflict_node"], json!({"type": "integer"}));
}

#[test]
fn enum_values_are_unioned() {
    let schema = stitched();
    assert_eq!(
        schema["properties"]["enum_node_common"]["enum"],
        json!(["A", "B", "C"])
    );
}

#[test]
fn merging_a_schema_into_itself_is_a_no_op() {
    for name in ["stitching/target.json", "resolving/all-of-extension.json"] {
        let original = load_fixture(name);
        let mut merged = original.clone();
        merge(&mut merged, &original);
        assert_eq!(merged, original, "{name}");
    }
}

#[test]
fn update_is_left_untouched() {
    let update = load_fixture("stitching/update.json");
    let mut target = load_fixture("stitching/target.json");
    let before = update.clone();
    merge(&mut target, &update);
    assert_eq!(update, before);
}

#[test]
fn merge_all_folds_in_order() {
    let parts = vec![
        load_fixture("stitching/target.json"),
        load_fixture("stitching/update.json"),
        json!({"properties": {"conflict_node": {"type": "boolean"}}}),
    ];
    let schema = merge_all(&parts).unwrap();
    assert_eq!(schema["properties"]["conflict_node"], json!({"type": "boolean"}));
    assert_eq!(
        schema["properties"]["enum_node_common"]["enum"],
        json!(["A", "B", "C"])
    );
}

#[test]
fn merge_all_of_nothing() {
    assert_eq!(merge_all(&[]), None);
}
