//! In-memory host
//!
//! Backs the CLI and the test suites. Loadable from a JSON fixture:
//!
//! ```json
//! {
//!   "products": [{ "id": 10, "kind": "variable", "default_image": 1,
//!                  "attributes": [], "attached_images": [2, 3] }],
//!   "meta": [{ "entity": 10, "key": "woosvi_slug", "value": [] }],
//!   "images": [{ "id": 1, "url": "https://cdn/1.jpg", "width": 800, "height": 600 }],
//!   "translations": { "active": false, "products": [], "terms": [] }
//! }
//! ```

use crate::error::HostError;
use crate::host::{
    Catalog, EntityId, ImageAssets, ImageSrc, MetaStore, Product, ProductId, TermId, Translations,
    VariationAttribute,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use svi_core::ImageId;

#[derive(Debug, Clone, Deserialize)]
struct ProductFixture {
    #[serde(flatten)]
    product: Product,
    #[serde(default)]
    attributes: Vec<VariationAttribute>,
    #[serde(default)]
    attached_images: Vec<ImageId>,
}

#[derive(Debug, Clone, Deserialize)]
struct MetaFixture {
    entity: u64,
    key: String,
    value: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageFixture {
    id: ImageId,
    #[serde(flatten)]
    src: ImageSrc,
    /// Per-size overrides
    #[serde(default)]
    sizes: HashMap<String, ImageSrc>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductLink {
    displayed: ProductId,
    canonical: ProductId,
}

#[derive(Debug, Clone, Deserialize)]
struct TermFixture {
    id: TermId,
    slug: String,
    #[serde(default)]
    canonical: Option<TermId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TranslationFixture {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    products: Vec<ProductLink>,
    #[serde(default)]
    terms: Vec<TermFixture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    products: Vec<ProductFixture>,
    #[serde(default)]
    meta: Vec<MetaFixture>,
    #[serde(default)]
    images: Vec<ImageFixture>,
    #[serde(default)]
    translations: TranslationFixture,
}

#[derive(Debug, Clone, Default)]
struct TermEntry {
    slug: String,
    canonical: Option<TermId>,
}

#[derive(Debug, Clone)]
struct ProductEntry {
    product: Product,
    attributes: Vec<VariationAttribute>,
    attached: Vec<ImageId>,
}

#[derive(Debug, Clone)]
struct ImageEntry {
    src: ImageSrc,
    sizes: HashMap<String, ImageSrc>,
}

/// Host keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    products: RwLock<IndexMap<ProductId, ProductEntry>>,
    meta: RwLock<HashMap<(EntityId, String), Value>>,
    images: RwLock<HashMap<ImageId, ImageEntry>>,
    translations_active: AtomicBool,
    canonical: RwLock<HashMap<ProductId, ProductId>>,
    terms: RwLock<HashMap<TermId, TermEntry>>,
    writes: AtomicUsize,
    reject_writes: AtomicBool,
}

impl MemoryHost {
    /// Create empty host
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build host from a JSON fixture
    ///
    /// # Errors
    /// Returns the parse error for malformed fixtures
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let fixture: Fixture = serde_json::from_str(raw)?;
        let mut host = Self::new();
        for p in fixture.products {
            let id = p.product.id;
            host = host.with_product(p.product, p.attributes).with_attached(id, p.attached_images);
        }
        for m in fixture.meta {
            host = host.with_meta(EntityId(m.entity), m.key, m.value);
        }
        for image in fixture.images {
            host.images.write().insert(
                image.id,
                ImageEntry {
                    src: image.src,
                    sizes: image.sizes,
                },
            );
        }
        let t = fixture.translations;
        host.translations_active.store(t.active, Ordering::Relaxed);
        for link in t.products {
            host = host.with_canonical(link.displayed, link.canonical);
        }
        for term in t.terms {
            host = host.with_term(term.id, term.slug, term.canonical);
        }
        Ok(host)
    }

    /// With product and its attribute definitions
    #[must_use]
    pub fn with_product(self, product: Product, attributes: Vec<VariationAttribute>) -> Self {
        self.products.write().insert(
            product.id,
            ProductEntry {
                product,
                attributes,
                attached: Vec::new(),
            },
        );
        self
    }

    /// With attached images of a known product
    #[must_use]
    pub fn with_attached(self, product: ProductId, images: Vec<ImageId>) -> Self {
        if let Some(entry) = self.products.write().get_mut(&product) {
            entry.attached = images;
        }
        self
    }

    /// With a metadata value
    #[must_use]
    pub fn with_meta(self, entity: impl Into<EntityId>, key: impl Into<String>, value: Value) -> Self {
        self.meta.write().insert((entity.into(), key.into()), value);
        self
    }

    /// With an image source used for every size
    #[must_use]
    pub fn with_image(self, id: ImageId, url: impl Into<String>, width: u32, height: u32) -> Self {
        let src = ImageSrc {
            url: url.into(),
            width,
            height,
        };
        self.images.write().insert(
            id,
            ImageEntry {
                src,
                sizes: HashMap::new(),
            },
        );
        self
    }

    /// With translations active
    #[must_use]
    pub fn with_translations(self) -> Self {
        self.translations_active.store(true, Ordering::Relaxed);
        self
    }

    /// With a displayed to canonical product link
    #[must_use]
    pub fn with_canonical(self, displayed: ProductId, canonical: ProductId) -> Self {
        self.canonical.write().insert(displayed, canonical);
        self
    }

    /// With a term slug and its canonical counterpart
    #[must_use]
    pub fn with_term(self, id: TermId, slug: impl Into<String>, canonical: Option<TermId>) -> Self {
        self.terms.write().insert(
            id,
            TermEntry {
                slug: slug.into(),
                canonical,
            },
        );
        self
    }

    /// Delete a metadata value
    pub fn remove_meta(&self, entity: impl Into<EntityId>, key: &str) -> Option<Value> {
        self.meta.write().remove(&(entity.into(), key.to_string()))
    }

    /// Make every following write fail
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }

    /// Successful metadata writes so far
    #[inline]
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Catalog for MemoryHost {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.read().get(&id).map(|e| e.product.clone())
    }

    fn variation_attributes(&self, id: ProductId) -> Vec<VariationAttribute> {
        self.products.read().get(&id).map(|e| e.attributes.clone()).unwrap_or_default()
    }

    fn attached_images(&self, id: ProductId) -> Vec<ImageId> {
        self.products.read().get(&id).map(|e| e.attached.clone()).unwrap_or_default()
    }
}

impl MetaStore for MemoryHost {
    fn meta(&self, entity: EntityId, key: &str) -> Option<Value> {
        self.meta.read().get(&(entity, key.to_string())).cloned()
    }

    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), HostError> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(HostError::write(entity, key, "writes rejected"));
        }
        self.meta.write().insert((entity, key.to_string()), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Translations for MemoryHost {
    fn is_active(&self) -> bool {
        self.translations_active.load(Ordering::Relaxed)
    }

    fn canonical_product(&self, id: ProductId) -> ProductId {
        self.canonical.read().get(&id).copied().unwrap_or(id)
    }

    fn canonical_counterpart(&self, term: TermId) -> Option<TermId> {
        self.terms.read().get(&term).and_then(|t| t.canonical)
    }

    fn term_slug(&self, term: TermId) -> Option<String> {
        self.terms.read().get(&term).map(|t| t.slug.clone())
    }
}

impl ImageAssets for MemoryHost {
    fn image_src(&self, id: ImageId, size: &str) -> Option<ImageSrc> {
        self.images
            .read()
            .get(&id)
            .map(|e| e.sizes.get(size).cloned().unwrap_or_else(|| e.src.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ProductKind;
    use serde_json::json;

    #[test]
    fn loads_fixture() {
        let host = MemoryHost::from_json(
            r#"{
                "products": [{ "id": 10, "kind": "variable", "default_image": 1, "attached_images": [2, 3] }],
                "meta": [{ "entity": 10, "key": "woosvi_slug", "value": [] }],
                "images": [{ "id": 1, "url": "1.jpg", "width": 8, "height": 6,
                             "sizes": { "thumb": { "url": "1-t.jpg", "width": 2, "height": 1 } } }],
                "translations": { "active": true, "products": [{ "displayed": 11, "canonical": 10 }] }
            }"#,
        )
        .unwrap();

        let product = host.product(ProductId::new(10)).unwrap();
        assert_eq!(product.kind, ProductKind::Variable);
        assert_eq!(host.attached_images(ProductId::new(10)).len(), 2);
        assert!(host.meta_exists(EntityId(10), "woosvi_slug"));
        let one = ImageId::new(1).unwrap();
        assert_eq!(host.image_src(one, "thumb").unwrap().url, "1-t.jpg");
        assert_eq!(host.image_src(one, "full").unwrap().url, "1.jpg");
        assert!(host.is_active());
        assert_eq!(host.canonical_product(ProductId::new(11)), ProductId::new(10));
        assert_eq!(host.canonical_product(ProductId::new(12)), ProductId::new(12));
    }

    #[test]
    fn rejected_writes_are_errors() {
        let host = MemoryHost::new();
        host.reject_writes(true);
        assert!(host.set_meta(EntityId(1), "k", json!(1)).is_err());
        host.reject_writes(false);
        host.set_meta(EntityId(1), "k", json!(1)).unwrap();
        assert_eq!(host.write_count(), 1);
        assert_eq!(host.remove_meta(EntityId(1), "k"), Some(json!(1)));
    }
}
