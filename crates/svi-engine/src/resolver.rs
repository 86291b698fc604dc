//! Variation image resolver
//!
//! Exact lookup first, then a single fuzzy pass over every candidate/key
//! pair. The same heuristic, with a stricter threshold, repairs stored slugs
//! that drifted away from the product's current attribute values.

use crate::config::MatchConfig;
use crate::store::ComboMap;
use indexmap::IndexMap;
use svi_core::record::is_sentinel;
use svi_core::{AssignmentRecord, CandidateKeys, ImageId, SimilarText, Similarity};

/// How a key was matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Candidate present verbatim
    Exact,
    /// Best candidate/key pair above the threshold
    Fuzzy {
        /// Similarity percentage
        score: f64,
    },
}

/// Resolution result with provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Selection candidate that matched
    pub candidate: String,
    /// Store key it matched
    pub key: String,
    pub image: ImageId,
    pub kind: MatchKind,
}

/// Candidate keys to image resolver
#[derive(Debug, Clone)]
pub struct Resolver<S = SimilarText> {
    similarity: S,
    threshold: f64,
}

impl Resolver {
    /// Resolver with the default heuristic and threshold
    #[must_use]
    pub fn new() -> Self {
        Self::with_similarity(SimilarText)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Similarity> Resolver<S> {
    /// Resolver with a custom similarity function
    #[must_use]
    pub fn with_similarity(similarity: S) -> Self {
        Self {
            similarity,
            threshold: MatchConfig::default().fuzzy_threshold,
        }
    }

    /// With fuzzy threshold (exclusive)
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Image for the selection, or `None`
    #[must_use]
    pub fn resolve(&self, candidates: &CandidateKeys, map: &ComboMap) -> Option<ImageId> {
        self.resolve_match(candidates, map).map(|m| m.image)
    }

    /// Image for the selection with match details
    #[must_use]
    pub fn resolve_match(&self, candidates: &CandidateKeys, map: &ComboMap) -> Option<Match> {
        if let Some(found) = self.exact(candidates, map) {
            return Some(found);
        }

        let found = self.fuzzy(candidates, map);
        match &found {
            Some(m) => tracing::debug!(candidate = %m.candidate, key = %m.key, kind = ?m.kind, "fuzzy match"),
            None => tracing::debug!(candidates = ?candidates.as_slice(), "no match above threshold"),
        }
        found
    }

    fn exact(&self, candidates: &CandidateKeys, map: &ComboMap) -> Option<Match> {
        candidates.iter().find_map(|candidate| {
            map.get(candidate).map(|&image| Match {
                candidate: candidate.clone(),
                key: candidate.clone(),
                image,
                kind: MatchKind::Exact,
            })
        })
    }

    fn fuzzy(&self, candidates: &CandidateKeys, map: &ComboMap) -> Option<Match> {
        let mut best_score = self.threshold;
        let mut best = None;
        for candidate in candidates {
            for (key, &image) in map {
                let score = self.similarity.score(candidate, key);
                if score > best_score {
                    best_score = score;
                    best = Some((candidate, key, image));
                }
            }
        }

        best.map(|(candidate, key, image)| Match {
            candidate: candidate.clone(),
            key: key.clone(),
            image,
            kind: MatchKind::Fuzzy { score: best_score },
        })
    }
}

/// Rewrites stale record slugs to the closest valid attribute slug
#[derive(Debug, Clone)]
pub struct SlugHealer<S = SimilarText> {
    similarity: S,
    threshold: f64,
}

impl SlugHealer {
    /// Healer with the default heuristic and threshold
    #[must_use]
    pub fn new() -> Self {
        Self::with_similarity(SimilarText)
    }
}

impl Default for SlugHealer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Similarity> SlugHealer<S> {
    /// Healer with a custom similarity function
    #[must_use]
    pub fn with_similarity(similarity: S) -> Self {
        Self {
            similarity,
            threshold: MatchConfig::default().heal_threshold,
        }
    }

    /// With heal threshold (exclusive)
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Rewrite slugs not found in `valid`; returns the number of rewrites
    ///
    /// Sentinel slugs are left alone. The caller persists when this is
    /// non-zero.
    pub fn heal(&self, records: &mut [AssignmentRecord], valid: &IndexMap<String, String>) -> usize {
        let mut rewrites = 0;
        for record in records.iter_mut() {
            for slug in record.slugs.iter_mut() {
                if valid.contains_key(slug.as_str()) || is_sentinel(slug) {
                    continue;
                }
                if let Some(replacement) = self.closest(slug, valid) {
                    tracing::info!(from = %slug, to = %replacement, "healing stale assignment slug");
                    *slug = replacement.trim().to_string();
                    rewrites += 1;
                }
            }
        }
        rewrites
    }

    fn closest<'v>(&self, slug: &str, valid: &'v IndexMap<String, String>) -> Option<&'v str> {
        let mut best_score = self.threshold;
        let mut best = None;
        for candidate in valid.keys() {
            let score = self.similarity.score(candidate, slug);
            if score > best_score {
                best_score = score;
                best = Some(candidate.as_str());
            }
        }
        best
    }
}
