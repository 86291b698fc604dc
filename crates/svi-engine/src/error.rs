//! Error types for the SVI engine
//!
//! Data-quality problems never surface here; they degrade to empty stores,
//! skipped images or "no match". What remains:
//! - Calling-contract violations (zero product id)
//! - Products the host does not know
//! - Host write failures and configuration problems

use crate::host::{EntityId, ProductId};
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Product id zero or otherwise unusable
    #[error("invalid product id: {0}")]
    InvalidProductId(ProductId),

    /// Host has no such product
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Host collaborator failed
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Check if the error only means "nothing to show"
    #[inline]
    #[must_use]
    pub fn is_missing_product(&self) -> bool {
        matches!(self, Self::InvalidProductId(_) | Self::ProductNotFound(_))
    }
}

/// Errors reported by host collaborators
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Metadata write rejected
    #[error("failed to write {key} on {entity}: {message}")]
    Write {
        entity: EntityId,
        key: String,
        message: String,
    },

    /// Host backend unavailable
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Create write error for entity and key
    pub fn write(entity: impl Into<EntityId>, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            entity: entity.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::EngineConfig`]
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
