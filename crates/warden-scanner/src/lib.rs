//! Warden Scanner - detection and remediation pipeline
//!
//! The impure half of the compliance scanner:
//! - [`cluster::ClusterApi`], the abstract control-plane boundary
//! - [`probe`], remote diagnostic probes over the exec channel
//! - [`evaluate`], the per-pod compliance evaluator
//! - [`resolve`], pod → replica set → deployment owner chain walking
//! - [`remediate`], idempotent scale-to-zero with audit annotations
//! - [`scanner`], the cycle orchestrator with its bounded worker pool
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::ScanConfig;
//! use warden_scanner::Scanner;
//!
//! # async fn example(cluster: Arc<dyn warden_scanner::ClusterApi>) {
//! let config = ScanConfig::new("_test");
//! let scanner = Scanner::new(cluster, config).expect("valid config");
//! scanner.run().await;
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cluster;
pub mod error;
pub mod evaluate;
pub mod probe;
pub mod remediate;
pub mod resolve;
pub mod scanner;

// Re-exports for convenience
pub use cluster::{ApiError, ClusterApi, ExecOutput};
pub use error::ScanError;
pub use evaluate::ComplianceEvaluator;
pub use probe::{CommandProbe, Detection, Probe};
pub use remediate::{
    Outcome, RemediationEngine, STATUS_ANNOTATION, STATUS_QUARANTINED, TIMESTAMP_ANNOTATION,
};
pub use resolve::OwnerResolver;
pub use scanner::{CycleReport, Scanner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
