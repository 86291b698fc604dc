//! Testing utilities for SVI workspace
//!
//! Shared fixtures: ready-made hosts for variable, legacy and translated
//! products.

#![allow(missing_docs)]

use serde_json::{json, Value};
use svi_core::ImageId;
use svi_engine::legacy::image_slug_key;
use svi_engine::store::ASSIGNMENTS_META;
use svi_engine::{AttributeTerm, MemoryHost, Product, ProductId, ProductKind, TermId, VariationAttribute};

pub const VARIABLE_PRODUCT: ProductId = ProductId::new(10);
pub const TRANSLATED_PRODUCT: ProductId = ProductId::new(11);
pub const LEGACY_PRODUCT: ProductId = ProductId::new(20);
pub const SIMPLE_PRODUCT: ProductId = ProductId::new(30);

pub fn id(raw: u64) -> ImageId {
    ImageId::new(raw).unwrap()
}

pub fn ids(raw: &[u64]) -> Vec<ImageId> {
    raw.iter().copied().map(id).collect()
}

pub fn product(pid: ProductId, kind: ProductKind, default_image: Option<u64>, gallery: &[u64]) -> Product {
    Product {
        id: pid,
        kind,
        default_image: default_image.map(id),
        gallery_images: ids(gallery),
    }
}

pub fn taxonomy(name: &str, terms: &[(u64, &str, &str)]) -> VariationAttribute {
    VariationAttribute {
        name: name.to_string(),
        taxonomy: true,
        variation: true,
        values: terms
            .iter()
            .map(|(term, slug, label)| AttributeTerm::term(TermId(*term), *slug, *label))
            .collect(),
    }
}

pub fn free_text(name: &str, labels: &[&str]) -> VariationAttribute {
    VariationAttribute {
        name: name.to_string(),
        taxonomy: false,
        variation: true,
        values: labels.iter().map(|label| AttributeTerm::text(*label)).collect(),
    }
}

/// Color taxonomy plus free-text size, canonical language
pub fn color_size_attributes() -> Vec<VariationAttribute> {
    vec![
        taxonomy("pa_color", &[(1, "red", "Red"), (2, "blue", "Blue")]),
        free_text("Size", &["Large", "Small"]),
    ]
}

/// Records of the variable product: global, red+large, blue
pub fn variable_records() -> Value {
    json!([
        { "slugs": ["sviproglobal"], "imgs": [5] },
        { "slugs": ["red", "large"], "imgs": [101, 102], "video": { "wc_svimainvideo": "main.mp4" } },
        { "slugs": ["blue"], "imgs": ["201"], "video": { "201": "blue.mp4" } }
    ])
}

/// Sources for every image id used by the fixtures
pub fn with_images(host: MemoryHost, raw: &[u64]) -> MemoryHost {
    raw.iter().fold(host, |host, &image| {
        host.with_image(id(image), format!("https://cdn.test/{image}.jpg"), 800, 800)
    })
}

pub fn variable_product_host() -> MemoryHost {
    let host = MemoryHost::new()
        .with_product(
            product(VARIABLE_PRODUCT, ProductKind::Variable, Some(1), &[2, 3]),
            color_size_attributes(),
        )
        .with_meta(VARIABLE_PRODUCT, ASSIGNMENTS_META, variable_records());
    with_images(host, &[1, 2, 3, 5, 101, 102, 201])
}

/// Variable product with only per-image tags
///
/// Images 2 and 3 are tagged `red` (scoped and generic meta), 4 is `blue`,
/// 5 is untagged, 1 is the primary image.
pub fn legacy_host() -> MemoryHost {
    let scoped = image_slug_key(LEGACY_PRODUCT);
    let host = MemoryHost::new()
        .with_product(
            product(LEGACY_PRODUCT, ProductKind::Variable, Some(1), &[]),
            color_size_attributes(),
        )
        .with_attached(LEGACY_PRODUCT, ids(&[1, 2, 3, 4, 5]))
        .with_meta(id(2), scoped.clone(), json!([["red"]]))
        .with_meta(id(3), "woosvi_slug", json!(["red"]))
        .with_meta(id(4), scoped, json!([["blue"]]));
    with_images(host, &[1, 2, 3, 4, 5])
}

/// Canonical product 10 plus its Spanish translation 11
pub fn translated_host() -> MemoryHost {
    let spanish = vec![
        taxonomy("pa_color", &[(11, "rojo", "Rojo"), (12, "azul", "Azul")]),
        free_text("Size", &["Grande", "Chico"]),
    ];
    variable_product_host()
        .with_product(
            product(TRANSLATED_PRODUCT, ProductKind::Variable, Some(1), &[2, 3]),
            spanish,
        )
        .with_translations()
        .with_canonical(TRANSLATED_PRODUCT, VARIABLE_PRODUCT)
        .with_term(TermId(1), "red", None)
        .with_term(TermId(2), "blue", None)
        .with_term(TermId(11), "rojo", Some(TermId(1)))
        .with_term(TermId(12), "azul", Some(TermId(2)))
}

pub fn simple_product_host() -> MemoryHost {
    let host = MemoryHost::new()
        .with_product(product(SIMPLE_PRODUCT, ProductKind::Simple, Some(1), &[2, 1, 3]), vec![])
        .with_meta(SIMPLE_PRODUCT, ASSIGNMENTS_META, json!([{ "slugs": ["svidefault"], "imgs": [2] }]));
    with_images(host, &[1, 2, 3])
}
