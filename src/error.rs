//! Error types for graphlink.
//!
//! All errors are strongly typed using thiserror. Configuration errors are
//! construction-time only: once a scorer or service is built, resolution
//! itself never fails — the worst-case output for any mention is a
//! well-formed `CreateNew` resolution.

use thiserror::Error;

/// Configuration errors raised when building a scorer or resolution service.
///
/// These fail fast at construction and never surface during resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The four signal weights must sum to 1 within epsilon. Weights are
    /// never silently renormalized.
    #[error("Signal weights sum to {sum}, expected 1.0 within {epsilon}")]
    WeightSumMismatch {
        /// Actual sum of the supplied weights.
        sum: f64,
        /// Tolerance applied to the sum check.
        epsilon: f64,
    },

    /// A signal weight was negative (or NaN).
    #[error("Signal weight '{name}' is {value}, must be a finite value >= 0")]
    NegativeWeight {
        /// Which weight failed validation.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// A threshold fell outside [0.0, 1.0].
    #[error("Threshold '{name}' is {value}, must be in [0.0, 1.0]")]
    ThresholdOutOfRange {
        /// Which threshold failed validation.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The decision thresholds must satisfy `low < high`.
    #[error("Decision thresholds must satisfy low < high, got low={low}, high={high}")]
    ThresholdOrder {
        /// The low (create-new) threshold.
        low: f64,
        /// The high (auto-resolve) threshold.
        high: f64,
    },

    /// The ambiguity margin must be finite and non-negative.
    #[error("Ambiguity margin is {value}, must be a finite value >= 0")]
    InvalidMargin {
        /// The offending value.
        value: f64,
    },

    /// `max_candidates` of zero would drop every candidate unconditionally.
    #[error("max_candidates must be at least 1")]
    ZeroMaxCandidates,

    /// A zero retrieval timeout would degrade every batch.
    #[error("Context retrieval timeout must be nonzero")]
    ZeroTimeout,
}

/// Errors surfaced by a [`GraphStore`](crate::store::GraphStore) backend.
///
/// Store errors are recovered inside context retrieval — the batch degrades
/// to an empty snapshot instead of failing.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Neighborhood retrieval exceeded its bounded timeout.
    #[error("Context retrieval timed out after {waited_ms}ms")]
    Timeout {
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// Backend failure (lock poisoning, connection loss, storage fault).
    #[error("Graph store backend error: {0}")]
    Backend(String),
}

/// Top-level error type for graphlink.
#[derive(Debug, Error)]
pub enum GraphLinkError {
    /// Invalid configuration at construction time.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Graph store failure that escaped local recovery.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl GraphLinkError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false, // Configuration won't change on retry
            Self::Store(e) => matches!(e, StoreError::Timeout { .. }),
        }
    }
}

/// Result type alias for graphlink operations.
pub type Result<T> = std::result::Result<T, GraphLinkError>;
