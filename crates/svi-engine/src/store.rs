//! Assignment store
//!
//! Holds the ordered assignment records of one product and derives the
//! combination-key map the resolver looks up against.

use crate::config::GlobalPosition;
use crate::error::HostError;
use crate::host::{Catalog, MetaStore, Product, ProductId};
use crate::legacy;
use indexmap::IndexMap;
use svi_core::ingest::{flag_from_value, records_from_value, records_to_value};
use svi_core::slug::{combination_key, sanitize};
use svi_core::{AssignmentRecord, ImageId, ImageRef};

/// Product meta holding the structured record list
pub const ASSIGNMENTS_META: &str = "woosvi_slug";

/// Product meta marking that legacy inference already ran
pub const IMPORTED_META: &str = "woosvi_slug_imported";

/// Combination key to the first image of the owning record
pub type ComboMap = IndexMap<String, ImageId>;

/// Flattened gallery entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatImage {
    pub image: ImageRef,
    pub video: Option<String>,
}

/// Ordered assignment records of one product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentStore {
    records: Vec<AssignmentRecord>,
}

impl AssignmentStore {
    /// Create store from records
    #[inline]
    #[must_use]
    pub fn new(records: Vec<AssignmentRecord>) -> Self {
        Self { records }
    }

    /// Create store from a persisted value of any shape
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::new(records_from_value(value))
    }

    /// Load the store for a product
    ///
    /// Structured data wins; otherwise legacy inference runs once, its result
    /// is persisted and read back.
    pub fn load<H>(host: &H, product: &Product) -> Self
    where
        H: Catalog + MetaStore,
    {
        let store = Self::read(host, product.id);
        if !store.is_empty() {
            return store;
        }

        let imported = host
            .meta(product.id.into(), IMPORTED_META)
            .as_ref()
            .and_then(flag_from_value)
            .unwrap_or(false);
        if imported {
            tracing::debug!(product = %product.id, "legacy inference already ran, store stays empty");
            return store;
        }

        let inferred = legacy::import(host, product);
        let reread = Self::read(host, product.id);
        if reread.is_empty() && !inferred.is_empty() {
            tracing::warn!(product = %product.id, "inferred assignments did not persist, using them in memory");
            return Self::new(inferred);
        }
        reread
    }

    fn read<H: MetaStore>(host: &H, product: ProductId) -> Self {
        host.meta(product.into(), ASSIGNMENTS_META)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    /// Persist records as the product's structured data
    ///
    /// # Errors
    /// Returns [`HostError`] if the host rejects the write
    pub fn persist<H: MetaStore>(&self, host: &H, product: ProductId) -> Result<(), HostError> {
        host.set_meta(product.into(), ASSIGNMENTS_META, records_to_value(&self.records))
    }

    /// Records in current order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[AssignmentRecord] {
        &self.records
    }

    /// Mutable records, for healing and translation
    #[inline]
    pub fn records_mut(&mut self) -> &mut [AssignmentRecord] {
        &mut self.records
    }

    /// Take the records
    #[inline]
    #[must_use]
    pub fn into_records(self) -> Vec<AssignmentRecord> {
        self.records
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Combination map for the current records
    #[must_use]
    pub fn combo_map(&self) -> ComboMap {
        combo_map(&self.records)
    }

    /// Apply the configured display position of the global record
    pub fn apply_global_position(&mut self, position: GlobalPosition) {
        if position == GlobalPosition::End {
            self.move_global_last();
        }
    }

    /// Move global records after every other record, keeping relative order
    pub fn move_global_last(&mut self) {
        let (global, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(AssignmentRecord::is_global);
        self.records = rest;
        self.records.extend(global);
    }

    /// Default gallery: every record image tagged with its record index
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatImage> {
        self.records
            .iter()
            .enumerate()
            .flat_map(|(index, record)| {
                record.imgs.iter().map(move |&id| FlatImage {
                    image: ImageRef::in_record(id, index),
                    video: record.video_for(id).map(str::to_string),
                })
            })
            .collect()
    }
}

/// Combination key to first image for a record list
///
/// Slugs are re-sanitized exactly like selection values; records without
/// usable slugs or images are skipped. A later record with an equal key
/// replaces the image but keeps the first key position.
#[must_use]
pub fn combo_map(records: &[AssignmentRecord]) -> ComboMap {
    let mut map = ComboMap::new();
    for record in records {
        let Some(first) = record.first_image() else {
            continue;
        };
        let slugs: Vec<String> = record
            .slugs
            .iter()
            .map(|slug| sanitize(&slug.to_lowercase()))
            .filter(|slug| !slug.is_empty())
            .collect();
        if slugs.is_empty() {
            continue;
        }
        map.insert(combination_key(&slugs), first);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(raw: u64) -> ImageId {
        ImageId::new(raw).unwrap()
    }

    fn sample() -> AssignmentStore {
        AssignmentStore::new(vec![
            AssignmentRecord::new(["sviproglobal"], vec![id(1)]),
            AssignmentRecord::new(["Red", "Large"], vec![id(101), id(102)]),
            AssignmentRecord::new(["blue"], vec![id(201)]).with_video(id(201), "blue.mp4"),
        ])
    }

    #[test]
    fn combo_map_uses_canonical_keys() {
        let map = sample().combo_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sviproglobal", "red_svipro_large", "blue"]);
        assert_eq!(map["red_svipro_large"], id(101));
    }

    #[test]
    fn combo_map_skips_records_without_images() {
        let store = AssignmentStore::new(vec![AssignmentRecord::new(["red"], vec![])]);
        assert!(store.combo_map().is_empty());
    }

    #[test]
    fn duplicate_keys_keep_position_take_last_image() {
        let store = AssignmentStore::new(vec![
            AssignmentRecord::new(["red"], vec![id(1)]),
            AssignmentRecord::new(["blue"], vec![id(2)]),
            AssignmentRecord::new(["RED"], vec![id(3)]),
        ]);
        let map = store.combo_map();
        assert_eq!(map.get_index(0), Some((&"red".to_string(), &id(3))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn global_moves_last() {
        let mut store = sample();
        store.apply_global_position(GlobalPosition::End);
        assert!(store.records().last().unwrap().is_global());
        assert_eq!(store.records()[0].slugs, vec!["Red", "Large"]);
    }

    #[test]
    fn in_place_keeps_order() {
        let mut store = sample();
        store.apply_global_position(GlobalPosition::InPlace);
        assert!(store.records()[0].is_global());
    }

    #[test]
    fn flatten_tags_record_index_and_video() {
        let flat = sample().flatten();
        let refs: Vec<String> = flat.iter().map(|f| f.image.to_string()).collect();
        assert_eq!(refs, ["1k0", "101k1", "102k1", "201k2"]);
        assert_eq!(flat[3].video.as_deref(), Some("blue.mp4"));
        assert_eq!(flat[0].video, None);
    }
}
