//! SVI Core
//!
//! Pure building blocks of the variation image engine: slug canonicalization,
//! the similarity heuristic and the assignment record model.
//!
//! # Overview
//!
//! - **Slugs**: [`slug::sanitize`] and [`slug::normalize`] turn raw attribute
//!   labels into candidate lookup keys
//! - **Similarity**: [`Similarity`] trait with the [`SimilarText`] percentage
//!   heuristic
//! - **Records**: [`AssignmentRecord`] plus the [`ingest`] layer that turns
//!   loosely-typed persisted data into records
//!
//! # Example
//!
//! ```rust
//! use svi_core::slug;
//!
//! let keys = slug::normalize(["Red", "Large"]);
//! assert_eq!(keys.as_slice(), ["red", "large", "red_svipro_large"]);
//! ```

#![warn(missing_docs)]

pub mod record;
pub mod similarity;
pub mod slug;

pub use record::{ingest, AssignmentRecord, ImageId, ImageRef};
pub use similarity::{SimilarText, Similarity};
pub use slug::{CandidateKeys, COMBO_DELIMITER};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for slug and record handling
    pub use crate::record::{AssignmentRecord, ImageId, ImageRef};
    pub use crate::similarity::{SimilarText, Similarity};
    pub use crate::slug::{normalize, sanitize, CandidateKeys, COMBO_DELIMITER};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
