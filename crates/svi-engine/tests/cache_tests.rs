use serde_json::json;
use std::sync::Arc;
use svi_engine::store::ASSIGNMENTS_META;
use svi_engine::{CacheKey, Engine, EngineError, MetaStore, ProductId};
use svi_test_utils::*;

#[test]
fn test_prepared_dataset_is_memoized() {
    let engine = Engine::new(variable_product_host());
    let first = engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap();
    let second = engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = engine.cache().stats();
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_translate_flag_is_a_separate_entry() {
    let engine = Engine::new(variable_product_host());
    engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap();
    engine.prepare_dataset(VARIABLE_PRODUCT, true).unwrap();
    assert!(engine.cache().contains(&CacheKey::new(VARIABLE_PRODUCT, false)));
    assert!(engine.cache().contains(&CacheKey::new(VARIABLE_PRODUCT, true)));
    assert_eq!(engine.cache().len(), 2);
}

#[test]
fn test_direct_json_path_bypasses_cache() {
    let engine = Engine::new(variable_product_host());
    let cached = engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap();

    engine
        .host()
        .set_meta(VARIABLE_PRODUCT.into(), ASSIGNMENTS_META, json!([{ "slugs": ["red"], "imgs": [9] }]))
        .unwrap();

    let fresh = engine.load_product(VARIABLE_PRODUCT, false).unwrap();
    assert_eq!(fresh.assignments.len(), 1);
    assert_eq!(engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap(), cached);
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn test_failures_are_not_cached() {
    let engine = Engine::new(variable_product_host());
    let missing = ProductId::new(404);
    assert!(matches!(
        engine.prepare_dataset(missing, false),
        Err(EngineError::ProductNotFound(_))
    ));
    assert!(engine.cache().is_empty());
}

#[test]
fn test_concurrent_preparation_agrees() {
    let engine = Engine::new(variable_product_host());
    let datasets: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(datasets.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(engine.cache().len(), 1);
}
