use pretty_assertions::assert_eq;
use serde_json::json;
use svi_core::AssignmentRecord;
use svi_engine::legacy::{self, GALLERY_META};
use svi_engine::store::{ASSIGNMENTS_META, IMPORTED_META};
use svi_engine::{Catalog, Engine, MetaStore};
use svi_test_utils::*;

fn expected() -> Vec<AssignmentRecord> {
    vec![
        AssignmentRecord::new(["red"], ids(&[2, 3])),
        AssignmentRecord::new(["blue"], ids(&[4])),
    ]
}

#[test]
fn test_infers_records_from_image_tags() {
    let host = legacy_host();
    let product = host.product(LEGACY_PRODUCT).unwrap();
    assert_eq!(legacy::infer(&host, &product), expected());
}

#[test]
fn test_preparation_persists_inferred_records() {
    let engine = Engine::new(legacy_host());
    let dataset = engine.prepare_dataset(LEGACY_PRODUCT, false).unwrap();
    assert_eq!(dataset.assignments, expected());

    let host = engine.host();
    assert_eq!(host.meta(LEGACY_PRODUCT.into(), IMPORTED_META), Some(json!(true)));
    let stored = host.meta(LEGACY_PRODUCT.into(), ASSIGNMENTS_META).unwrap();
    assert_eq!(stored[0]["slugs"], json!(["red"]));
    assert_eq!(stored[1]["imgs"], json!([4]));
    assert_eq!(engine.resolve_for_selection(LEGACY_PRODUCT, ["Blue"]), Some(id(4)));
}

#[test]
fn test_inference_is_idempotent() {
    let host = legacy_host();
    let product = host.product(LEGACY_PRODUCT).unwrap();

    let first = legacy::import(&host, &product);
    let persisted = host.meta(LEGACY_PRODUCT.into(), ASSIGNMENTS_META);

    host.remove_meta(LEGACY_PRODUCT, IMPORTED_META);
    host.remove_meta(LEGACY_PRODUCT, ASSIGNMENTS_META);
    let second = legacy::import(&host, &product);

    assert_eq!(first, second);
    assert_eq!(persisted, host.meta(LEGACY_PRODUCT.into(), ASSIGNMENTS_META));
}

#[test]
fn test_inference_runs_once_until_invalidated() {
    let host = legacy_host();
    host.remove_meta(id(2), &legacy::image_slug_key(LEGACY_PRODUCT));
    host.remove_meta(id(3), "woosvi_slug");
    host.remove_meta(id(4), &legacy::image_slug_key(LEGACY_PRODUCT));
    let engine = Engine::new(host);

    assert!(engine.load_product(LEGACY_PRODUCT, false).unwrap().assignments.is_empty());
    assert_eq!(engine.host().meta(LEGACY_PRODUCT.into(), IMPORTED_META), Some(json!(true)));

    engine
        .host()
        .set_meta(id(5).into(), &legacy::image_slug_key(LEGACY_PRODUCT), json!([["green"]]))
        .unwrap();
    assert!(engine.load_product(LEGACY_PRODUCT, false).unwrap().assignments.is_empty());

    engine.invalidate_inference(LEGACY_PRODUCT).unwrap();
    let dataset = engine.load_product(LEGACY_PRODUCT, false).unwrap();
    assert_eq!(dataset.assignments, vec![AssignmentRecord::new(["green"], ids(&[5]))]);
}

#[test]
fn test_gallery_meta_overrides_attachments() {
    let host = legacy_host().with_meta(LEGACY_PRODUCT, GALLERY_META, json!("4,2,0,x"));
    let product = host.product(LEGACY_PRODUCT).unwrap();
    assert_eq!(
        legacy::infer(&host, &product),
        vec![
            AssignmentRecord::new(["blue"], ids(&[4])),
            AssignmentRecord::new(["red"], ids(&[2])),
        ]
    );
}

#[test]
fn test_multi_value_groups_become_combinations() {
    let host = legacy_host().with_meta(
        id(5),
        legacy::image_slug_key(LEGACY_PRODUCT),
        json!([["Red", "Large"], ["blue"]]),
    );
    let product = host.product(LEGACY_PRODUCT).unwrap();
    let records = legacy::infer(&host, &product);

    assert_eq!(records[0], AssignmentRecord::new(["red"], ids(&[2, 3])));
    assert_eq!(records[1], AssignmentRecord::new(["blue"], ids(&[4, 5])));
    assert_eq!(records[2], AssignmentRecord::new(["red", "large"], ids(&[5])));
}

#[test]
fn test_rejected_writes_keep_inferred_records_in_memory() {
    let host = legacy_host();
    host.reject_writes(true);
    let engine = Engine::new(host);

    let dataset = engine.load_product(LEGACY_PRODUCT, false).unwrap();
    assert_eq!(dataset.assignments, expected());
    assert!(!engine.host().meta_exists(LEGACY_PRODUCT.into(), IMPORTED_META));
}
