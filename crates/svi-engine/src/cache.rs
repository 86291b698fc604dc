//! Request cache of prepared datasets
//!
//! Keyed by (product, translate flag), process-scoped, never evicted.

use crate::dataset::Dataset;
use crate::host::ProductId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key: product plus whether translation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub product: ProductId,
    pub translate: bool,
}

impl CacheKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(product: ProductId, translate: bool) -> Self {
        Self { product, translate }
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: usize,
    /// Lookups served from cache
    pub hits: u64,
    /// Lookups that had to compute
    pub misses: u64,
}

/// Memoizing map from [`CacheKey`] to shared values
#[derive(Debug)]
pub struct RequestCache<V> {
    inner: DashMap<CacheKey, Arc<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache of prepared product datasets
pub type DatasetCache = RequestCache<Dataset>;

impl<V> RequestCache<V> {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cached value
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let found = self.inner.get(key).map(|entry| Arc::clone(entry.value()));
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert value, replacing any previous entry
    pub fn insert(&self, key: CacheKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.inner.insert(key, Arc::clone(&value));
        value
    }

    /// Get or compute value
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(cached) = self.get(&key) {
            return cached;
        }
        self.insert(key, compute())
    }

    /// Try to get or compute value; errors are not cached
    ///
    /// The computation runs without holding a map lock, so concurrent misses
    /// may both compute and the last insert wins.
    ///
    /// # Errors
    /// Returns the computation's error unchanged
    pub fn try_get_or_compute<E, F>(&self, key: CacheKey, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(cached) = self.get(&key) {
            tracing::debug!(product = %key.product, translate = key.translate, "dataset cache hit");
            return Ok(cached);
        }
        let value = compute()?;
        Ok(self.insert(key, value))
    }

    /// Drop both entries of a product
    pub fn invalidate(&self, product: ProductId) {
        for translate in [false, true] {
            self.inner.remove(&CacheKey::new(product, translate));
        }
    }

    /// Drop entries matching a predicate
    pub fn invalidate_if<F>(&self, predicate: F)
    where
        F: Fn(&CacheKey, &V) -> bool,
    {
        self.inner.retain(|key, value| !predicate(key, value));
    }

    /// Drop every entry
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.clear();
    }

    /// Check if cache contains key
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> Default for RequestCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
