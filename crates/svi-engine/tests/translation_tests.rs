use pretty_assertions::assert_eq;
use svi_engine::translate::translation_map;
use svi_engine::{CacheKey, Engine, FilterQuery};
use svi_test_utils::*;

#[test]
fn test_translation_map_pairs_terms_and_free_text() {
    let map = translation_map(&translated_host(), TRANSLATED_PRODUCT, VARIABLE_PRODUCT);
    let pairs: Vec<(&str, &str)> = map.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    assert_eq!(
        pairs,
        [("red", "rojo"), ("blue", "azul"), ("large", "grande"), ("small", "chico")]
    );
}

#[test]
fn test_displayed_keys_resolve_like_canonical_keys() {
    let engine = Engine::new(translated_host());
    let canonical = engine.resolve_for_selection(VARIABLE_PRODUCT, ["Red", "Large"]);
    let displayed = engine.resolve_for_selection(TRANSLATED_PRODUCT, ["Rojo", "Grande"]);
    assert_eq!(canonical, Some(id(101)));
    assert_eq!(displayed, canonical);
    assert_eq!(engine.resolve_for_selection(TRANSLATED_PRODUCT, ["azul"]), Some(id(201)));
}

#[test]
fn test_translate_flag_controls_rewrite() {
    let engine = Engine::new(translated_host());

    let plain = engine.prepare_dataset(TRANSLATED_PRODUCT, false).unwrap();
    assert_eq!(plain.product_id, VARIABLE_PRODUCT);
    assert_eq!(plain.assignments[1].slugs, vec!["red", "large"]);
    assert_eq!(plain.slugs.get("red").map(String::as_str), Some("rojo"));
    assert_eq!(plain.slugs.get("large").map(String::as_str), Some("grande"));

    let translated = engine.prepare_dataset(TRANSLATED_PRODUCT, true).unwrap();
    assert_eq!(translated.assignments[0].slugs, vec!["sviproglobal"]);
    assert_eq!(translated.assignments[1].slugs, vec!["rojo", "grande"]);
    assert_eq!(translated.assignments[2].slugs, vec!["azul"]);
    assert_eq!(translated.slugs.get("red").map(String::as_str), Some("rojo"));
}

#[test]
fn test_canonical_product_is_never_translated() {
    let engine = Engine::new(translated_host());
    let dataset = engine.prepare_dataset(VARIABLE_PRODUCT, true).unwrap();
    assert_eq!(dataset.assignments[1].slugs, vec!["red", "large"]);
}

#[test]
fn test_inactive_layer_skips_translation() {
    let engine = Engine::new(variable_product_host());
    let dataset = engine.prepare_dataset(VARIABLE_PRODUCT, true).unwrap();
    assert_eq!(dataset.assignments[2].slugs, vec!["blue"]);
    assert_eq!(engine.resolve_for_selection(TRANSLATED_PRODUCT, ["Red"]), None);
}

#[test]
fn test_filter_uses_displayed_language() {
    let engine = Engine::new(translated_host());
    let query = FilterQuery::parse("filter_pa_color=rojo").unwrap();
    let matches = engine.filtered_images(TRANSLATED_PRODUCT, &query).unwrap();
    let found: Vec<(&str, u64)> = matches.iter().map(|m| (m.slug.as_str(), m.image.get())).collect();
    assert_eq!(found, [("rojo", 101)]);

    let canonical = FilterQuery::parse("filter_pa_color=red").unwrap();
    assert!(engine.filtered_images(TRANSLATED_PRODUCT, &canonical).unwrap().is_empty());
    assert_eq!(engine.loop_thumbnails(TRANSLATED_PRODUCT).unwrap(), ids(&[5, 101, 201]));
}

#[test]
fn test_invalidate_inference_drops_every_language() {
    let engine = Engine::new(translated_host());
    engine.prepare_dataset(VARIABLE_PRODUCT, false).unwrap();
    engine.prepare_dataset(TRANSLATED_PRODUCT, true).unwrap();
    assert_eq!(engine.cache().len(), 2);

    engine.invalidate_inference(TRANSLATED_PRODUCT).unwrap();
    assert!(engine.cache().is_empty());
    assert!(!engine.cache().contains(&CacheKey::new(VARIABLE_PRODUCT, false)));
}
