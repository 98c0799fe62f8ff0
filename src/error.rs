//! Error types for the Chaos Mesh SDK

use thiserror::Error;

use crate::experiment::ChaosKind;

/// Result alias used throughout the SDK
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the SDK
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or contradictory experiment fields, raised at construction
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// Selector invariant violation, raised at construction
    #[error("ambiguous selector: {0}")]
    AmbiguousSelector(String),

    /// Create conflict (HTTP 409), surfaced unchanged to the caller
    #[error("{kind}/{name} already exists in namespace {namespace}")]
    AlreadyExists {
        kind: ChaosKind,
        namespace: String,
        name: String,
    },

    /// Resource absent (HTTP 404)
    #[error("{kind}/{name} not found in namespace {namespace}")]
    NotFound {
        kind: ChaosKind,
        namespace: String,
        name: String,
    },

    /// Transport/API failure after the retry budget is exhausted
    #[error("failed to {operation}: {reason}")]
    Connection { operation: String, reason: String },

    /// Terminal failure condition reported by the cluster during a wait
    #[error("chaos {name} reported {condition}: {message}")]
    ExperimentFailed {
        name: String,
        condition: String,
        message: String,
    },

    /// A wait loop exceeded its deadline without reaching a terminal condition
    #[error("chaos {name} {operation} timeout after {elapsed_secs:.1}s")]
    WaitTimeout {
        name: String,
        operation: &'static str,
        elapsed_secs: f64,
    },

    /// Resource document (de)serialization failure at the client boundary
    #[error("failed to serialize resource document: {0}")]
    Serialization(String),
}

impl Error {
    /// True for errors that indicate a bad experiment definition rather
    /// than a cluster-side problem.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::AmbiguousSelector(_))
    }
}
