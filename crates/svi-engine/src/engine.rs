//! Dataset preparation and selection resolution
//!
//! One engine per process, holding the host, configuration, similarity
//! heuristic and the request cache.

use crate::cache::{CacheKey, DatasetCache};
use crate::config::EngineConfig;
use crate::dataset::{gallery_entries, published_records, source_or_placeholder, Dataset, GalleryImage};
use crate::error::{EngineError, EngineResult};
use crate::filter::{self, FilterMatch, FilterQuery};
use crate::host::{valid_slugs, Host, Product, ProductId};
use crate::resolver::{Match, Resolver, SlugHealer};
use crate::store::{AssignmentStore, FlatImage, IMPORTED_META};
use crate::translate::{needs_translation, translate_records, translation_map};
use serde_json::Value;
use std::sync::Arc;
use svi_core::slug::{normalize, normalize_scalars};
use svi_core::{CandidateKeys, ImageId, SimilarText, Similarity};

/// Variation image engine
pub struct Engine<H, S = SimilarText> {
    host: H,
    config: EngineConfig,
    similarity: S,
    cache: DatasetCache,
}

impl<H: Host> Engine<H> {
    /// Create engine with default configuration
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    /// Create engine with configuration
    #[must_use]
    pub fn with_config(host: H, config: EngineConfig) -> Self {
        tracing::debug!(?config, "creating engine");
        Self {
            host,
            config,
            similarity: SimilarText,
            cache: DatasetCache::new(),
        }
    }
}

impl<H: Host, S: Similarity + Clone> Engine<H, S> {
    /// Swap the similarity heuristic; the cache starts empty
    #[must_use]
    pub fn with_similarity<T: Similarity + Clone>(self, similarity: T) -> Engine<H, T> {
        Engine {
            host: self.host,
            config: self.config,
            similarity,
            cache: DatasetCache::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    fn resolver(&self) -> Resolver<S> {
        Resolver::with_similarity(self.similarity.clone()).with_threshold(self.config.matching.fuzzy_threshold)
    }

    fn healer(&self) -> SlugHealer<S> {
        SlugHealer::with_similarity(self.similarity.clone()).with_threshold(self.config.matching.heal_threshold)
    }

    /// Prepared dataset, memoized per (product, translate)
    ///
    /// # Errors
    /// - [`EngineError::InvalidProductId`] for product id zero
    /// - [`EngineError::ProductNotFound`] if the host has no such product
    pub fn prepare_dataset(&self, product: ProductId, translate: bool) -> EngineResult<Arc<Dataset>> {
        check_product_id(product)?;
        self.cache
            .try_get_or_compute(CacheKey::new(product, translate), || self.build_dataset(product, translate))
    }

    /// Prepared dataset, always recomputed
    ///
    /// # Errors
    /// Same as [`Engine::prepare_dataset`]
    pub fn load_product(&self, product: ProductId, translate: bool) -> EngineResult<Dataset> {
        check_product_id(product)?;
        self.build_dataset(product, translate)
    }

    /// Image for raw attribute values, `None` if nothing matches
    ///
    /// Unknown products resolve to `None` as well.
    pub fn resolve_for_selection<I, V>(&self, product: ProductId, values: I) -> Option<ImageId>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        self.resolve_candidates(product, &normalize(values)).map(|m| m.image)
    }

    /// Image for a JSON selection object; non-scalar values are ignored
    pub fn resolve_json_selection(&self, product: ProductId, selection: &Value) -> Option<ImageId> {
        let values: Vec<Value> = match selection {
            Value::Object(map) => map.values().cloned().collect(),
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        self.resolve_candidates(product, &normalize_scalars(&values)).map(|m| m.image)
    }

    /// Match with provenance for prepared candidate keys
    pub fn resolve_candidates(&self, product: ProductId, candidates: &CandidateKeys) -> Option<Match> {
        let dataset = match self.prepare_dataset(product, true) {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::debug!(%product, "no dataset for selection: {}", e);
                return None;
            }
        };
        self.resolver().resolve_match(candidates, &dataset.combo_map())
    }

    /// First image of every record shown in product loops
    ///
    /// # Errors
    /// Same as [`Engine::prepare_dataset`]
    pub fn loop_thumbnails(&self, product: ProductId) -> EngineResult<Vec<ImageId>> {
        let dataset = self.prepare_dataset(product, true)?;
        Ok(filter::loop_thumbnails(&dataset.assignments))
    }

    /// Images for an active attribute filter
    ///
    /// Filter values arrive in the displayed language, so records are
    /// translated before matching.
    ///
    /// # Errors
    /// Same as [`Engine::prepare_dataset`]
    pub fn filtered_images(&self, product: ProductId, query: &FilterQuery) -> EngineResult<Vec<FilterMatch>> {
        let dataset = self.prepare_dataset(product, true)?;
        Ok(filter::match_filter(&dataset.assignments, query))
    }

    /// Clear the legacy import flag and every cached dataset built from the
    /// same canonical product
    ///
    /// The next preparation re-infers if the product still has no structured
    /// assignments.
    ///
    /// # Errors
    /// Returns [`EngineError::Host`] if the flag cannot be written
    pub fn invalidate_inference(&self, product: ProductId) -> EngineResult<()> {
        check_product_id(product)?;
        let canonical = self.canonical(product);
        self.host.set_meta(canonical.into(), IMPORTED_META, Value::Bool(false))?;
        self.cache.invalidate_if(|_, dataset| dataset.product_id == canonical);
        tracing::info!(%product, %canonical, "cleared legacy import flag");
        Ok(())
    }

    fn canonical(&self, displayed: ProductId) -> ProductId {
        if self.host.is_active() {
            self.host.canonical_product(displayed)
        } else {
            displayed
        }
    }

    fn build_dataset(&self, displayed: ProductId, translate: bool) -> EngineResult<Dataset> {
        let canonical = self.canonical(displayed);
        let product = self
            .host
            .product(canonical)
            .ok_or(EngineError::ProductNotFound(displayed))?;

        let mut store = AssignmentStore::load(&self.host, &product);
        let mut slugs = valid_slugs(&self.host.variation_attributes(canonical));

        if !store.is_empty()
            && product.is_variable()
            && self.healer().heal(store.records_mut(), &slugs) > 0
        {
            if let Err(e) = store.persist(&self.host, canonical) {
                tracing::warn!(product = %canonical, "failed to persist healed assignments: {}", e);
            }
        }

        // Translated pages always publish the canonical to displayed map;
        // records are only rewritten on request.
        if needs_translation(&self.host, product.is_variable(), displayed, canonical) {
            let map = translation_map(&self.host, displayed, canonical);
            if translate {
                let rewrites = translate_records(store.records_mut(), &map);
                tracing::debug!(%displayed, %canonical, rewrites, "translated assignment slugs");
            }
            slugs = map;
        }

        store.apply_global_position(self.config.global_position);

        let images = gallery_entries(&product, &store)
            .into_iter()
            .map(|entry| self.gallery_image(&product, entry))
            .collect();

        tracing::debug!(product = %canonical, records = store.len(), "prepared dataset");
        Ok(Dataset {
            product_id: canonical,
            default_image: product.default_image,
            images,
            assignments: published_records(store.records(), product.default_image),
            slugs,
        })
    }

    fn gallery_image(&self, product: &Product, entry: FlatImage) -> GalleryImage {
        let id = entry.image.id;
        let src = |size: &str| {
            let found = self.host.image_src(id, size);
            if found.is_none() {
                tracing::debug!(image = %id, size, "missing image source, using placeholder");
            }
            source_or_placeholder(found, &self.config.placeholder_url)
        };
        GalleryImage {
            id,
            disambiguator: entry.image.disambiguator,
            video: entry.video,
            is_default: product.default_image == Some(id),
            main: src(&self.config.main_image_size),
            thumb: src(&self.config.thumb_image_size),
            full: src(&self.config.full_image_size),
        }
    }
}

fn check_product_id(product: ProductId) -> EngineResult<()> {
    if product.is_valid() {
        Ok(())
    } else {
        Err(EngineError::InvalidProductId(product))
    }
}
