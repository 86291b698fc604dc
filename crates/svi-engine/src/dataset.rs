//! Prepared product dataset
//!
//! Everything a product page needs to swap images client-side: the gallery
//! in display order with sources at every size, the assignment records and
//! the slug map.

use crate::host::{ImageSrc, Product, ProductId};
use crate::store::{combo_map, AssignmentStore, ComboMap, FlatImage};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use svi_core::{AssignmentRecord, ImageId, ImageRef};

/// One gallery entry with its sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: ImageId,
    /// Index of the owning record for flattened entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguator: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    /// Product's primary image
    #[serde(default)]
    pub is_default: bool,
    pub main: ImageSrc,
    pub thumb: ImageSrc,
    pub full: ImageSrc,
}

impl GalleryImage {
    /// Wire reference, e.g. `101k2`
    #[inline]
    #[must_use]
    pub fn reference(&self) -> ImageRef {
        ImageRef {
            id: self.id,
            disambiguator: self.disambiguator,
        }
    }
}

/// Prepared dataset of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub product_id: ProductId,
    pub default_image: Option<ImageId>,
    pub images: Vec<GalleryImage>,
    /// Records with lower-cased slugs, default image injected
    #[serde(rename = "svi")]
    pub assignments: Vec<AssignmentRecord>,
    /// Valid slug to label, or canonical to displayed slug when translated
    pub slugs: IndexMap<String, String>,
}

impl Dataset {
    /// Combination map over the prepared records
    #[must_use]
    pub fn combo_map(&self) -> ComboMap {
        combo_map(&self.assignments)
    }

    /// Gallery entry for a wire reference
    #[must_use]
    pub fn image(&self, reference: ImageRef) -> Option<&GalleryImage> {
        self.images.iter().find(|image| image.reference() == reference)
    }
}

/// Gallery entries in display order, before sources are attached
///
/// Default then gallery images, de-duplicated. Variable products with
/// records append every record image tagged with its record index. The main
/// video goes to the un-suffixed default entry.
#[must_use]
pub fn gallery_entries(product: &Product, store: &AssignmentStore) -> Vec<FlatImage> {
    let records = store.records();
    let main_video = records.iter().find_map(AssignmentRecord::main_video);
    let any_video = |id: ImageId| records.iter().find_map(|r| r.video_for(id));

    let plain: IndexSet<ImageId> = product
        .default_image
        .into_iter()
        .chain(product.gallery_images.iter().copied())
        .collect();

    let mut entries: Vec<FlatImage> = plain
        .into_iter()
        .map(|id| {
            let video = if Some(id) == product.default_image {
                main_video
            } else {
                any_video(id)
            };
            FlatImage {
                image: ImageRef::plain(id),
                video: video.map(str::to_string),
            }
        })
        .collect();

    if product.is_variable() && !store.is_empty() {
        entries.extend(store.flatten());
    }
    entries
}

/// Records as published in the dataset
///
/// Slugs are lower-cased; the default record gets the product's primary
/// image at the head of its list.
#[must_use]
pub fn published_records(records: &[AssignmentRecord], default_image: Option<ImageId>) -> Vec<AssignmentRecord> {
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            for slug in &mut record.slugs {
                *slug = slug.to_lowercase();
            }
            if let (true, Some(default)) = (record.is_default(), default_image) {
                record.imgs.retain(|&id| id != default);
                record.imgs.insert(0, default);
            }
            record
        })
        .collect()
}

/// Source for an image, falling back to the placeholder
#[must_use]
pub fn source_or_placeholder(src: Option<ImageSrc>, placeholder: &str) -> ImageSrc {
    src.unwrap_or_else(|| ImageSrc {
        url: placeholder.to_string(),
        width: 0,
        height: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ProductKind;
    use pretty_assertions::assert_eq;

    fn id(raw: u64) -> ImageId {
        ImageId::new(raw).unwrap()
    }

    fn product(kind: ProductKind) -> Product {
        Product {
            id: ProductId::new(10),
            kind,
            default_image: Some(id(1)),
            gallery_images: vec![id(2), id(1), id(3)],
        }
    }

    fn refs(entries: &[FlatImage]) -> Vec<String> {
        entries.iter().map(|e| e.image.to_string()).collect()
    }

    #[test]
    fn simple_product_gallery_is_deduplicated() {
        let store = AssignmentStore::new(vec![AssignmentRecord::new(["red"], vec![id(9)])]);
        let entries = gallery_entries(&product(ProductKind::Simple), &store);
        assert_eq!(refs(&entries), ["1", "2", "3"]);
    }

    #[test]
    fn variable_product_appends_flattened_records() {
        let store = AssignmentStore::new(vec![
            AssignmentRecord::new(["red"], vec![id(4), id(5)]).with_main_video("main.mp4"),
            AssignmentRecord::new(["blue"], vec![id(2)]).with_video(id(2), "blue.mp4"),
        ]);
        let entries = gallery_entries(&product(ProductKind::Variable), &store);
        assert_eq!(refs(&entries), ["1", "2", "3", "4k0", "5k0", "2k1"]);
        assert_eq!(entries[0].video.as_deref(), Some("main.mp4"));
        assert_eq!(entries[1].video.as_deref(), Some("blue.mp4"));
        assert_eq!(entries[5].video.as_deref(), Some("blue.mp4"));
    }

    #[test]
    fn default_record_receives_primary_image() {
        let records = vec![
            AssignmentRecord::new(["svidefault"], vec![id(7), id(1)]),
            AssignmentRecord::new(["Red"], vec![id(8)]),
        ];
        let published = published_records(&records, Some(id(1)));
        assert_eq!(published[0].imgs, vec![id(1), id(7)]);
        assert_eq!(published[1].slugs, vec!["red"]);
        assert_eq!(published[1].imgs, vec![id(8)]);
    }

    #[test]
    fn placeholder_for_missing_source() {
        let src = source_or_placeholder(None, "ph.png");
        assert_eq!(src.url, "ph.png");
        assert_eq!(src.width, 0);
    }
}
