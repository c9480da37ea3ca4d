//! Error types for the scan pipeline
//!
//! The pipeline distinguishes four outcomes:
//! - infrastructure failures (API calls, exec channels, deadlines) —
//!   logged and the current item skipped, retried next cycle
//! - resolution failures (no owning controller) — expected for
//!   standalone pods, logged at low severity
//! - negative probe results — values, not errors
//! - already-remediated controllers — a no-op outcome, not an error

use crate::cluster::ApiError;
use warden_core::ConfigError;

/// Errors surfaced by the scan pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A cluster API call failed
    #[error("{operation} failed for {namespace}/{name}: {source}")]
    Api {
        /// Which operation failed, e.g. `list_pods`
        operation: &'static str,
        /// Namespace of the affected object
        namespace: String,
        /// Name of the affected object; empty for namespace-wide calls
        name: String,
        /// Underlying API error
        #[source]
        source: ApiError,
    },

    /// A cluster call missed its deadline
    #[error("{operation} timed out after {secs}s for {namespace}/{name}")]
    Deadline {
        /// Which operation timed out
        operation: &'static str,
        /// Namespace of the affected object
        namespace: String,
        /// Name of the affected object
        name: String,
        /// The deadline that was exceeded
        secs: u64,
    },

    /// No replica-set or deployment owner could be found for a pod
    #[error("no owning controller for pod {namespace}/{name}")]
    NoController {
        /// Pod namespace
        namespace: String,
        /// Pod name
        name: String,
    },

    /// The scanner configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScanError {
    /// Whether this is an expected resolution failure rather than an
    /// infrastructure problem
    #[inline]
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::NoController { .. })
    }

    /// Whether this failure indicates control-plane trouble and the item
    /// should be retried next cycle
    #[inline]
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Deadline { .. })
    }
}
