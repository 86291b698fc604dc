//! SVI Engine - variation image resolution
//!
//! Turns curated assignment records into what a product page needs:
//! - Loads records from host metadata, inferring them from legacy
//!   per-image tags when absent
//! - Heals stale slugs and translates them for non-canonical languages
//! - Resolves an attribute selection to an image, exact then fuzzy
//! - Prepares and memoizes the per-product gallery dataset
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use svi_engine::prelude::*;
//!
//! let product = Product {
//!     id: ProductId::new(10),
//!     kind: ProductKind::Variable,
//!     default_image: None,
//!     gallery_images: vec![],
//! };
//! let host = MemoryHost::new()
//!     .with_product(product, vec![])
//!     .with_meta(ProductId::new(10), "woosvi_slug", json!([{ "slugs": ["red", "large"], "imgs": [101] }]));
//!
//! let engine = Engine::new(host);
//! let image = engine.resolve_for_selection(ProductId::new(10), ["Red", "Large"]);
//! assert_eq!(image.map(|id| id.get()), Some(101));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod host;
pub mod legacy;
pub mod memory;
pub mod resolver;
pub mod store;
pub mod translate;

pub use cache::{CacheKey, CacheStats, DatasetCache, RequestCache};
pub use config::{EngineConfig, GlobalPosition, MatchConfig};
pub use dataset::{Dataset, GalleryImage};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, EngineResult, HostError};
pub use filter::{FilterMatch, FilterQuery};
pub use host::{
    AttributeTerm, Catalog, EntityId, Host, ImageAssets, ImageSrc, MetaStore, Product, ProductId, ProductKind,
    TermId, Translations, VariationAttribute,
};
pub use memory::MemoryHost;
pub use resolver::{Match, MatchKind, Resolver, SlugHealer};
pub use store::{AssignmentStore, ComboMap};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the engine
    pub use crate::{
        Dataset, Engine, EngineConfig, EngineError, FilterQuery, GalleryImage, Host, MemoryHost, Product,
        ProductId, ProductKind,
    };
    pub use svi_core::{AssignmentRecord, ImageId, ImageRef};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
