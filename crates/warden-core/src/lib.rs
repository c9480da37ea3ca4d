//! Warden Core - domain model and compliance policy
//!
//! The pure half of the compliance scanner:
//! - Domain model for namespaces, pods, controllers and verdicts
//! - Scanner configuration with explicit, validated policy inputs
//! - Namespace selection, pod eligibility and main-container resolution
//!
//! No I/O happens here; everything that talks to the cluster lives in
//! `warden-scanner`.

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod model;
pub mod policy;

// Re-exports for convenience
pub use config::{LabelRule, ProbeSpec, ScanConfig};
pub use error::ConfigError;
pub use model::{
    ComplianceVerdict, Container, Deployment, Namespace, OwnerRef, Pod, ReplicaSet,
    KIND_DEPLOYMENT, KIND_REPLICA_SET,
};
pub use policy::{
    eligibility, is_in_scope, is_protected, main_container, select_namespaces, Eligibility,
    SkipReason,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
