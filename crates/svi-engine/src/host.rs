//! Host platform contracts
//!
//! The engine never talks to a commerce platform directly. It reads products,
//! attributes, metadata, translations and image sources through these traits,
//! and writes only assignment metadata back.

use crate::error::HostError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use svi_core::slug::sanitize;
use svi_core::ImageId;

/// Product identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Wrap a raw id
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Zero is never a real product
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute term identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u64);

/// Anything that carries metadata: products and image assets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl From<ProductId> for EntityId {
    fn from(id: ProductId) -> Self {
        Self(id.0)
    }
}

impl From<ImageId> for EntityId {
    fn from(id: ImageId) -> Self {
        Self(id.get())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product type as far as image resolution cares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// No configurable attributes
    #[default]
    Simple,
    /// Configurable by variation attributes
    Variable,
}

/// Product as read from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub kind: ProductKind,
    /// Primary image
    #[serde(default)]
    pub default_image: Option<ImageId>,
    /// Gallery in host display order
    #[serde(default)]
    pub gallery_images: Vec<ImageId>,
}

impl Product {
    /// Check for a variable product
    #[inline]
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.kind == ProductKind::Variable
    }
}

/// One value of a variation attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTerm {
    /// Backing term for taxonomy attributes
    #[serde(default)]
    pub term_id: Option<TermId>,
    pub slug: String,
    pub label: String,
}

impl AttributeTerm {
    /// Taxonomy-backed term
    pub fn term(id: TermId, slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            term_id: Some(id),
            slug: slug.into(),
            label: label.into(),
        }
    }

    /// Free-text value; the slug is derived from the label
    pub fn text(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            term_id: None,
            slug: sanitize(&label),
            label,
        }
    }
}

/// Product attribute definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAttribute {
    pub name: String,
    /// Values are taxonomy terms rather than free text
    #[serde(default)]
    pub taxonomy: bool,
    /// Used for variations
    #[serde(default)]
    pub variation: bool,
    #[serde(default)]
    pub values: Vec<AttributeTerm>,
}

/// Valid attribute-value slugs of a product mapped to their labels
///
/// Only variation attributes count; taxonomy slugs are lower-cased, free-text
/// slugs are re-sanitized from the label.
#[must_use]
pub fn valid_slugs(attributes: &[VariationAttribute]) -> IndexMap<String, String> {
    let mut slugs = IndexMap::new();
    for attribute in attributes.iter().filter(|a| a.variation) {
        for term in &attribute.values {
            let slug = if attribute.taxonomy {
                term.slug.to_lowercase()
            } else {
                sanitize(&term.label)
            };
            let label = term.label.trim();
            if !slug.is_empty() && !label.is_empty() {
                slugs.insert(slug, label.to_string());
            }
        }
    }
    slugs
}

/// Resolved source of an image at one size
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageSrc {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Product and attribute lookup
pub trait Catalog {
    /// Product by id
    fn product(&self, id: ProductId) -> Option<Product>;

    /// Attribute definitions of a product
    fn variation_attributes(&self, id: ProductId) -> Vec<VariationAttribute>;

    /// Image assets attached to a product, in display order
    fn attached_images(&self, id: ProductId) -> Vec<ImageId>;
}

/// Entity metadata storage
pub trait MetaStore {
    /// Read a metadata value
    fn meta(&self, entity: EntityId, key: &str) -> Option<Value>;

    /// Write a metadata value
    ///
    /// # Errors
    /// Returns [`HostError`] if the host rejects the write
    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), HostError>;

    /// Check if a metadata key is present
    fn meta_exists(&self, entity: EntityId, key: &str) -> bool {
        self.meta(entity, key).is_some()
    }
}

/// Multi-language relationships; inactive unless overridden
pub trait Translations {
    /// Check if a multi-language layer is active
    fn is_active(&self) -> bool {
        false
    }

    /// Canonical-language product for a displayed product
    fn canonical_product(&self, id: ProductId) -> ProductId {
        id
    }

    /// Canonical-language counterpart of a term
    fn canonical_counterpart(&self, _term: TermId) -> Option<TermId> {
        None
    }

    /// Slug of a term
    fn term_slug(&self, _term: TermId) -> Option<String> {
        None
    }
}

/// Image source lookup
pub trait ImageAssets {
    /// Source of an image at a named size, `None` if the asset is missing
    fn image_src(&self, id: ImageId, size: &str) -> Option<ImageSrc>;
}

/// Everything the engine needs from its host
pub trait Host: Catalog + MetaStore + Translations + ImageAssets {}

impl<T> Host for T where T: Catalog + MetaStore + Translations + ImageAssets {}
