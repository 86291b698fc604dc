//! Assignment records and image references
//!
//! An [`AssignmentRecord`] says "this attribute combination shows these
//! images". Records only enter the system through [`ingest`], which absorbs
//! every loosely-typed shape the persisted data has been seen in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First slug of the global/catch-all record
pub const GLOBAL_SENTINEL: &str = "sviproglobal";

/// First slug of the record that also receives the product's default image
pub const DEFAULT_SENTINEL: &str = "svidefault";

/// Video map key for the product's main image
pub const MAIN_VIDEO_KEY: &str = "wc_svimainvideo";

/// Separator between an image id and its record disambiguator
pub const DISAMBIGUATOR_SEPARATOR: char = 'k';

/// Positive numeric image asset identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(u64);

impl ImageId {
    /// Create id, rejecting zero
    #[inline]
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Parse a decimal id; anything non-numeric or non-positive is rejected
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().and_then(Self::new)
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image id plus the index of the record it was flattened from
///
/// The same physical image may be assigned to several records; the
/// disambiguator keeps flattened gallery entries distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// Underlying asset
    pub id: ImageId,
    /// Owning record index, if flattened from a record
    pub disambiguator: Option<usize>,
}

impl ImageRef {
    /// Plain reference without a record tag
    #[inline]
    #[must_use]
    pub fn plain(id: ImageId) -> Self {
        Self {
            id,
            disambiguator: None,
        }
    }

    /// Reference tagged with its owning record index
    #[inline]
    #[must_use]
    pub fn in_record(id: ImageId, record: usize) -> Self {
        Self {
            id,
            disambiguator: Some(record),
        }
    }

    /// Parse the wire form `"101"` or `"101k2"`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().splitn(2, DISAMBIGUATOR_SEPARATOR);
        let id = ImageId::parse(parts.next()?)?;
        let disambiguator = parts.next().and_then(|tag| tag.parse::<usize>().ok());
        Some(Self { id, disambiguator })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.disambiguator {
            Some(record) => write!(f, "{}{}{}", self.id, DISAMBIGUATOR_SEPARATOR, record),
            None => write!(f, "{}", self.id),
        }
    }
}

impl Serialize for ImageRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid image reference: {raw}")))
    }
}

/// Curated mapping from one attribute combination to an ordered image list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Attribute-value slugs in storage order
    pub slugs: Vec<String>,

    /// Images shown for this combination
    pub imgs: Vec<ImageId>,

    /// Image key (decimal id or [`MAIN_VIDEO_KEY`]) to video reference
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub video: IndexMap<String, String>,

    /// Excluded from product-loop thumbnails when `true`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_hidden: Option<bool>,
}

impl AssignmentRecord {
    /// Create record from slugs and images
    pub fn new<S: Into<String>>(slugs: impl IntoIterator<Item = S>, imgs: Vec<ImageId>) -> Self {
        Self {
            slugs: slugs.into_iter().map(Into::into).collect(),
            imgs,
            video: IndexMap::new(),
            loop_hidden: None,
        }
    }

    /// With a video for one image
    #[must_use]
    pub fn with_video(mut self, image: ImageId, video: impl Into<String>) -> Self {
        self.video.insert(image.to_string(), video.into());
        self
    }

    /// With a video for the product's main image
    #[must_use]
    pub fn with_main_video(mut self, video: impl Into<String>) -> Self {
        self.video.insert(MAIN_VIDEO_KEY.to_string(), video.into());
        self
    }

    /// With loop visibility
    #[must_use]
    pub fn with_loop_hidden(mut self, hidden: bool) -> Self {
        self.loop_hidden = Some(hidden);
        self
    }

    /// First slug, if any
    #[inline]
    #[must_use]
    pub fn first_slug(&self) -> Option<&str> {
        self.slugs.first().map(String::as_str)
    }

    /// Check if this is the global/catch-all record
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.first_slug() == Some(GLOBAL_SENTINEL)
    }

    /// Check if this record receives the default image
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.first_slug() == Some(DEFAULT_SENTINEL)
    }

    /// First image, used as the record's representative
    #[inline]
    #[must_use]
    pub fn first_image(&self) -> Option<ImageId> {
        self.imgs.first().copied()
    }

    /// Video assigned to an image of this record
    #[must_use]
    pub fn video_for(&self, image: ImageId) -> Option<&str> {
        self.video.get(&image.to_string()).map(String::as_str)
    }

    /// Video assigned to the product's main image
    #[must_use]
    pub fn main_video(&self) -> Option<&str> {
        self.video.get(MAIN_VIDEO_KEY).map(String::as_str)
    }
}

/// Check if a slug is one of the reserved record markers
#[inline]
#[must_use]
pub fn is_sentinel(slug: &str) -> bool {
    slug == GLOBAL_SENTINEL || slug == DEFAULT_SENTINEL
}

pub mod ingest {
    //! Normalization of persisted assignment data
    //!
    //! Stored values have been seen as proper lists, PHP-style objects with
    //! numeric keys, serialized JSON strings, and empty sentinels such as
    //! `""`, `"[]"` or `"\"\""`. All of them collapse into `Vec<AssignmentRecord>`
    //! here; anything unreadable is dropped, never reported as an error.

    use super::{AssignmentRecord, ImageId, ImageRef};
    use crate::slug::COMBO_DELIMITER;
    use indexmap::IndexMap;
    use serde_json::{Map, Value};

    /// Records from a persisted value
    pub fn records_from_value(value: &Value) -> Vec<AssignmentRecord> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            Value::String(raw) => return records_from_str(raw),
            _ => return Vec::new(),
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(fields) => record_from_fields(fields),
                other => {
                    tracing::warn!(entry = %other, "skipping non-object assignment entry");
                    None
                }
            })
            .collect()
    }

    fn records_from_str(raw: &str) -> Vec<AssignmentRecord> {
        let trimmed = raw.trim();
        if is_empty_sentinel(trimmed) {
            return Vec::new();
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::String(_)) | Err(_) => Vec::new(),
            Ok(inner) => records_from_value(&inner),
        }
    }

    /// Check for the empty shapes legacy writers left behind
    #[must_use]
    pub fn is_empty_sentinel(raw: &str) -> bool {
        matches!(raw.trim(), "" | "[]" | "{}" | "\"\"" | "''" | "null" | "0")
    }

    fn record_from_fields(fields: &Map<String, Value>) -> Option<AssignmentRecord> {
        let slugs = fields.get("slugs").map(slugs_from_value).unwrap_or_default();
        if slugs.is_empty() {
            tracing::warn!("skipping assignment entry without slugs");
            return None;
        }

        let imgs = fields.get("imgs").map(images_from_value).unwrap_or_default();
        let video = fields.get("video").map(videos_from_value).unwrap_or_default();
        let loop_hidden = fields.get("loop_hidden").and_then(flag_from_value);

        Some(AssignmentRecord {
            slugs,
            imgs,
            video,
            loop_hidden,
        })
    }

    fn slugs_from_value(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(scalar_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Value::Object(map) => slugs_from_value(&Value::Array(map.values().cloned().collect())),
            Value::String(raw) if !is_empty_sentinel(raw) => raw
                .split(COMBO_DELIMITER)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Image ids from a persisted value, skipping invalid entries
    pub fn images_from_value(value: &Value) -> Vec<ImageId> {
        match value {
            Value::Array(items) => items.iter().filter_map(image_from_value).collect(),
            Value::Object(map) if map.contains_key("id") => image_from_value(value).into_iter().collect(),
            Value::Object(map) => map.values().filter_map(image_from_value).collect(),
            Value::String(raw) if raw.contains(',') => {
                raw.split(',').filter_map(ImageId::parse).collect()
            }
            other => image_from_value(other).into_iter().collect(),
        }
    }

    fn image_from_value(value: &Value) -> Option<ImageId> {
        match value {
            Value::Number(n) => n.as_u64().and_then(ImageId::new),
            Value::String(raw) => ImageRef::parse(raw).map(|r| r.id),
            Value::Object(map) => map.get("id").and_then(image_from_value),
            _ => None,
        }
    }

    fn videos_from_value(value: &Value) -> IndexMap<String, String> {
        let Value::Object(map) = value else {
            return IndexMap::new();
        };
        map.iter()
            .filter_map(|(key, video)| {
                let video = scalar_text(video)?;
                let video = video.trim();
                (!video.is_empty()).then(|| (key.clone(), video.to_string()))
            })
            .collect()
    }

    /// Boolean-ish flag (`true`, `1`, `"yes"`, `"on"`)
    #[must_use]
    pub fn flag_from_value(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "" | "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text of a scalar value; arrays, objects and null yield `None`
    ///
    /// Booleans follow PHP string casting: `true` is `"1"`, `false` is empty.
    #[must_use]
    pub fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            _ => None,
        }
    }

    /// Persistable form of a record list
    #[must_use]
    pub fn records_to_value(records: &[AssignmentRecord]) -> Value {
        serde_json::to_value(records).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use pretty_assertions::assert_eq;
        use serde_json::json;

        fn id(raw: u64) -> ImageId {
            ImageId::new(raw).unwrap()
        }

        #[test]
        fn reads_structured_list() {
            let value = json!([
                {"slugs": ["red", "large"], "imgs": [101, 102]},
                {"slugs": ["blue"], "imgs": ["201"], "video": {"201": "https://v/1"}},
            ]);
            let records = records_from_value(&value);
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].slugs, vec!["red", "large"]);
            assert_eq!(records[0].imgs, vec![id(101), id(102)]);
            assert_eq!(records[1].video_for(id(201)), Some("https://v/1"));
        }

        #[test]
        fn empty_sentinels_become_empty_store() {
            for value in [json!(""), json!("[]"), json!("\"\""), json!(null), json!(0), json!(false)] {
                assert!(records_from_value(&value).is_empty(), "{value}");
            }
        }

        #[test]
        fn serialized_string_is_decoded() {
            let value = json!(r#"[{"slugs":["red"],"imgs":[5]}]"#);
            let records = records_from_value(&value);
            assert_eq!(records, vec![AssignmentRecord::new(["red"], vec![id(5)])]);
        }

        #[test]
        fn php_style_objects_are_lists() {
            let value = json!({
                "0": {"slugs": {"0": "red"}, "imgs": {"0": 7, "1": "8"}},
                "3": {"slugs": "blue_svipro_small", "imgs": 9},
            });
            let records = records_from_value(&value);
            assert_eq!(records[0].slugs, vec!["red"]);
            assert_eq!(records[0].imgs, vec![id(7), id(8)]);
            assert_eq!(records[1].slugs, vec!["blue", "small"]);
            assert_eq!(records[1].imgs, vec![id(9)]);
        }

        #[test]
        fn invalid_images_are_skipped() {
            let value = json!([{"slugs": ["red"], "imgs": [0, -3, "abc", "", "12k3", {"id": 4}, [1]]}]);
            let records = records_from_value(&value);
            assert_eq!(records[0].imgs, vec![id(12), id(4)]);
        }

        #[test]
        fn entries_without_slugs_are_dropped() {
            let value = json!([{"imgs": [1]}, {"slugs": [], "imgs": [2]}, {"slugs": [""], "imgs": [3]}, "junk"]);
            assert!(records_from_value(&value).is_empty());
        }

        #[test]
        fn loop_hidden_flag_variants() {
            let value = json!([
                {"slugs": ["a"], "imgs": [1], "loop_hidden": "1"},
                {"slugs": ["b"], "imgs": [2], "loop_hidden": false},
                {"slugs": ["c"], "imgs": [3]},
            ]);
            let records = records_from_value(&value);
            assert_eq!(records[0].loop_hidden, Some(true));
            assert_eq!(records[1].loop_hidden, Some(false));
            assert_eq!(records[2].loop_hidden, None);
        }

        #[test]
        fn persisted_form_reads_back() {
            let records = vec![
                AssignmentRecord::new(["red"], vec![id(1), id(2)]).with_video(id(2), "v2"),
                AssignmentRecord::new(["sviproglobal"], vec![id(3)]).with_loop_hidden(true),
            ];
            assert_eq!(records_from_value(&records_to_value(&records)), records);
        }
    }
}
