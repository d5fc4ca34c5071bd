//! Error taxonomy for the AAKR core.
//!
//! Every variant signals a caller contract violation (bad shapes, bad call
//! order, bad configuration). Computation is deterministic and in-memory,
//! so none of these are transient; there is no retry path. The core never
//! logs or swallows an error, callers translate into diagnostics.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AakrError>;

#[derive(Debug, Error, PartialEq)]
pub enum AakrError {
    /// Feature-name intersection between historical and query data is
    /// empty, or an input table lacks features a fitted model requires.
    #[error("feature alignment failed: {0}")]
    DataAlignment(String),

    /// `transform` or `predict` invoked before `fit`.
    #[error("model is not fitted; call fit before {0}")]
    NotFitted(&'static str),

    /// Fold count or sample size exceeds the available rows.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Aligned matrices disagree on feature count. Structurally impossible
    /// when alignment is done through `fit`/`transform`; kept as a
    /// defensive check for callers driving `predict` with raw matrices.
    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A configuration value failed validation at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
