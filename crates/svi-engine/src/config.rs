//! Engine configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! global_position = "end"
//! main_image_size = "woocommerce_single"
//!
//! [match]
//! fuzzy_threshold = 70.0
//! heal_threshold = 95.0
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the global/catch-all record sits in the default gallery
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalPosition {
    /// Keep storage order
    #[default]
    InPlace,
    /// Move after every other record
    End,
}

/// Similarity thresholds (percent, exclusive)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum score a fuzzy selection match must exceed
    pub fuzzy_threshold: f64,
    /// Minimum score a stale stored slug must exceed to be rewritten
    pub heal_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 70.0,
            heal_threshold: 95.0,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display position of the global record
    pub global_position: GlobalPosition,
    /// Size name for the main gallery image
    pub main_image_size: String,
    /// Size name for thumbnails
    pub thumb_image_size: String,
    /// Size name for the zoom/full image
    pub full_image_size: String,
    /// Image shown when an asset cannot be resolved
    pub placeholder_url: String,
    /// Similarity thresholds
    #[serde(rename = "match")]
    pub matching: MatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_position: GlobalPosition::InPlace,
            main_image_size: "full".to_string(),
            thumb_image_size: "shop_thumbnail".to_string(),
            full_image_size: "full".to_string(),
            placeholder_url: String::new(),
            matching: MatchConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With global record position
    #[inline]
    #[must_use]
    pub fn with_global_position(mut self, position: GlobalPosition) -> Self {
        self.global_position = position;
        self
    }

    /// With placeholder image
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = url.into();
        self
    }

    /// With image size names
    #[must_use]
    pub fn with_image_sizes(
        mut self,
        main: impl Into<String>,
        thumb: impl Into<String>,
        full: impl Into<String>,
    ) -> Self {
        self.main_image_size = main.into();
        self.thumb_image_size = thumb.into();
        self.full_image_size = full.into();
        self
    }

    /// With similarity thresholds
    #[inline]
    #[must_use]
    pub fn with_matching(mut self, matching: MatchConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Check thresholds are percentages
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let MatchConfig {
            fuzzy_threshold,
            heal_threshold,
        } = self.matching;
        for (name, value) in [("fuzzy_threshold", fuzzy_threshold), ("heal_threshold", heal_threshold)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within 0..=100, got {value}")));
            }
        }
        for (name, value) in [
            ("main_image_size", &self.main_image_size),
            ("thumb_image_size", &self.thumb_image_size),
            ("full_image_size", &self.full_image_size),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
