//! Legacy inference
//!
//! Before structured assignments existed, each image carried its own slug
//! tags. When a product has no structured data the records are rebuilt from
//! those tags once and persisted.

use crate::host::{Catalog, MetaStore, Product, ProductId};
use crate::store::{ASSIGNMENTS_META, IMPORTED_META};
use indexmap::IndexMap;
use serde_json::Value;
use svi_core::ingest::{images_from_value, records_to_value, scalar_text};
use svi_core::{AssignmentRecord, ImageId, COMBO_DELIMITER};

/// Product meta with the legacy comma-separated gallery order
pub const GALLERY_META: &str = "_product_image_gallery";

/// Generic image meta with slug tags
pub const IMAGE_SLUG_META: &str = "woosvi_slug";

/// Group key for images without any tag
pub const NO_SLUG: &str = "nullsvi";

/// Image meta with slug tags scoped to one product
#[must_use]
pub fn image_slug_key(product: ProductId) -> String {
    format!("{IMAGE_SLUG_META}_{product}")
}

/// Images to infer from, in display order
///
/// The legacy gallery field wins when present; otherwise attached images
/// excluding the primary image.
pub fn source_images<H>(host: &H, product: &Product) -> Vec<ImageId>
where
    H: Catalog + MetaStore,
{
    if host.meta_exists(product.id.into(), GALLERY_META) {
        return host
            .meta(product.id.into(), GALLERY_META)
            .map(|value| images_from_value(&value))
            .unwrap_or_default();
    }
    host.attached_images(product.id)
        .into_iter()
        .filter(|image| Some(*image) != product.default_image)
        .collect()
}

/// Group keys an image is tagged with
///
/// Untagged images yield [`NO_SLUG`].
pub fn image_keys<H: MetaStore>(host: &H, product: ProductId, image: ImageId) -> Vec<String> {
    let scoped = host
        .meta(image.into(), &image_slug_key(product))
        .map(|value| scoped_keys(&value))
        .unwrap_or_default();
    if !scoped.is_empty() {
        return scoped;
    }

    let generic = host
        .meta(image.into(), IMAGE_SLUG_META)
        .map(|value| generic_keys(&value))
        .unwrap_or_default();
    if !generic.is_empty() {
        return generic;
    }

    vec![NO_SLUG.to_string()]
}

/// Product-scoped tags: a list of value groups, each joined into one key
fn scoped_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(groups) => groups
            .iter()
            .filter_map(|group| match group {
                Value::Array(values) if values.len() > 1 => {
                    let parts: Vec<String> = values.iter().filter_map(scalar_text).collect();
                    Some(parts.join(COMBO_DELIMITER).to_lowercase())
                }
                Value::Array(values) => values.first().and_then(scalar_text).map(|s| s.to_lowercase()),
                other => scalar_text(other).map(|s| s.to_lowercase()),
            })
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect(),
        other => single_key(other),
    }
}

/// Generic tags: a flat list, nested lists contribute their first value
fn generic_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Array(values) => values.first().and_then(scalar_text),
                other => scalar_text(other),
            })
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect(),
        other => single_key(other),
    }
}

fn single_key(value: &Value) -> Vec<String> {
    scalar_text(value)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty() && key != "0")
        .into_iter()
        .collect()
}

/// Rebuild assignment records from per-image tags, without persisting
///
/// Groups keep first-seen order; untagged images are left out.
pub fn infer<H>(host: &H, product: &Product) -> Vec<AssignmentRecord>
where
    H: Catalog + MetaStore,
{
    let mut groups: IndexMap<String, Vec<ImageId>> = IndexMap::new();
    for image in source_images(host, product) {
        for key in image_keys(host, product.id, image) {
            groups.entry(key).or_default().push(image);
        }
    }
    groups.shift_remove(NO_SLUG);

    groups
        .into_iter()
        .map(|(key, imgs)| AssignmentRecord::new(key.split(COMBO_DELIMITER), imgs))
        .collect()
}

/// Infer records and persist them with the import flag
///
/// Write failures are logged; the inferred records are returned either way.
pub fn import<H>(host: &H, product: &Product) -> Vec<AssignmentRecord>
where
    H: Catalog + MetaStore,
{
    let records = infer(host, product);
    tracing::info!(product = %product.id, records = records.len(), "inferred legacy assignments");

    let entity = product.id.into();
    if let Err(e) = host.set_meta(entity, ASSIGNMENTS_META, records_to_value(&records)) {
        tracing::warn!(product = %product.id, "failed to persist inferred assignments: {}", e);
        return records;
    }
    if let Err(e) = host.set_meta(entity, IMPORTED_META, Value::Bool(true)) {
        tracing::warn!(product = %product.id, "failed to mark legacy import: {}", e);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scoped_groups_join_multi_values() {
        let keys = scoped_keys(&json!([["Red", "Large"], ["Blue"], "Green", []]));
        assert_eq!(keys, ["red_svipro_large", "blue", "green"]);
    }

    #[test]
    fn scoped_scalar_is_used_directly() {
        assert_eq!(scoped_keys(&json!("red")), ["red"]);
        assert!(scoped_keys(&json!("")).is_empty());
        assert!(scoped_keys(&json!(null)).is_empty());
    }

    #[test]
    fn generic_nested_lists_take_first() {
        assert_eq!(generic_keys(&json!([["red", "ignored"], "blue"])), ["red", "blue"]);
    }

    #[test]
    fn scoped_meta_key_includes_product() {
        assert_eq!(image_slug_key(ProductId::new(12)), "woosvi_slug_12");
    }
}
