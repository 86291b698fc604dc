//! Shop-loop attribute filters and thumbnails
//!
//! Layered navigation passes `filter_<attribute>=v1,v2` in the query string.
//! Each filtered value maps to the first image of the first record tagged
//! with it.

use indexmap::IndexSet;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use svi_core::slug::sanitize;
use svi_core::{AssignmentRecord, ImageId};

const FILTER_PREFIX: &str = "filter_";

/// Active attribute filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Attribute name without the `filter_` prefix
    pub attribute: String,
    /// Sanitized filter values in query order
    pub values: Vec<String>,
}

impl FilterQuery {
    /// First `filter_` pair with a non-empty value
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Option<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs.into_iter().find_map(|(key, value)| {
            let attribute = key.as_ref().strip_prefix(FILTER_PREFIX)?;
            let values: Vec<String> = value
                .as_ref()
                .split(',')
                .map(sanitize)
                .filter(|v| !v.is_empty())
                .collect();
            if attribute.is_empty() || values.is_empty() {
                return None;
            }
            Some(Self {
                attribute: attribute.to_string(),
                values,
            })
        })
    }

    /// Parse a raw query string such as `filter_color=red,blue&page=2`
    #[must_use]
    pub fn parse(query: &str) -> Option<Self> {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(key), decode(value))
            });
        Self::from_pairs(pairs)
    }
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    percent_decode_str(&raw).decode_utf8_lossy().into_owned()
}

/// Image chosen for one filter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMatch {
    pub slug: String,
    pub image: ImageId,
}

/// Per filter value, the first image of the first record tagged with it
///
/// Values without a tagged record are left out.
#[must_use]
pub fn match_filter(records: &[AssignmentRecord], query: &FilterQuery) -> Vec<FilterMatch> {
    let values: IndexSet<&str> = query.values.iter().map(String::as_str).collect();
    values
        .into_iter()
        .filter_map(|value| {
            records
                .iter()
                .filter(|record| record.slugs.iter().any(|slug| sanitize(slug) == value))
                .find_map(AssignmentRecord::first_image)
                .map(|image| FilterMatch {
                    slug: value.to_string(),
                    image,
                })
        })
        .collect()
}

/// First image of every record shown in product loops, de-duplicated
#[must_use]
pub fn loop_thumbnails(records: &[AssignmentRecord]) -> Vec<ImageId> {
    let thumbs: IndexSet<ImageId> = records
        .iter()
        .filter(|record| record.loop_hidden != Some(true))
        .filter_map(AssignmentRecord::first_image)
        .collect();
    thumbs.into_iter().collect()
}
