//! Pure compliance policy
//!
//! Side-effect-free decisions over the domain model:
//! - Namespace selection (scope marker, protected denylist)
//! - Pod eligibility (terminating, critical labels, controller-owned)
//! - Main-container resolution
//!
//! Everything here is a total function of its inputs and the
//! configuration; all I/O lives in the scanner crate.

use crate::config::ScanConfig;
use crate::model::{Namespace, Pod, KIND_REPLICA_SET};

/// Why a pod was excluded from the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Termination already requested; the controller is winding it down
    Terminating,
    /// A critical label rule matched, the pod is infrastructure
    CriticalLabel {
        /// Matching label key
        key: String,
        /// Matching label value
        value: String,
    },
    /// Not owned by a replica-set controller; nothing to scale down
    NoController,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Terminating => write!(f, "terminating"),
            Self::CriticalLabel { key, value } => write!(f, "critical label {key}={value}"),
            Self::NoController => write!(f, "no owning controller"),
        }
    }
}

/// Eligibility decision for one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// The pod is a scan candidate
    Eligible,
    /// The pod is excluded
    Skip(SkipReason),
}

impl Eligibility {
    /// Whether the pod should be scanned
    #[inline]
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Whether a namespace is on the protected denylist, case-insensitively
#[must_use]
pub fn is_protected(name: &str, config: &ScanConfig) -> bool {
    config
        .protected_namespaces
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

/// Whether a namespace carries the configured scope marker
#[must_use]
pub fn is_in_scope(name: &str, config: &ScanConfig) -> bool {
    name.contains(&config.scope_marker)
}

/// Select the namespaces to scan this cycle.
///
/// A namespace is selected iff it is in scope and not protected. The
/// protected check wins: a denylisted namespace is never selected even
/// when it matches the scope marker.
#[must_use]
pub fn select_namespaces<'a>(
    namespaces: &'a [Namespace],
    config: &ScanConfig,
) -> Vec<&'a Namespace> {
    namespaces
        .iter()
        .filter(|ns| !is_protected(&ns.name, config) && is_in_scope(&ns.name, config))
        .collect()
}

/// Decide whether one pod is a scan candidate.
///
/// Total function; never fails. Skips terminating pods, pods matching a
/// critical label rule, and pods without a replica-set owner.
#[must_use]
pub fn eligibility(pod: &Pod, config: &ScanConfig) -> Eligibility {
    if pod.is_terminating() {
        return Eligibility::Skip(SkipReason::Terminating);
    }

    for rule in &config.critical_labels {
        if rule.matches(&pod.labels) {
            return Eligibility::Skip(SkipReason::CriticalLabel {
                key: rule.key.clone(),
                value: rule.value.clone(),
            });
        }
    }

    if pod.owner_of_kind(KIND_REPLICA_SET).is_none() {
        return Eligibility::Skip(SkipReason::NoController);
    }

    Eligibility::Eligible
}

/// Resolve the pod's main container name.
///
/// Preference order:
/// 1. the container named by the configured annotation, when a container
///    with exactly that name exists;
/// 2. the first container whose name contains the configured marker
///    token, case-insensitively;
/// 3. the first container in declaration order.
///
/// `None` only for a pod with zero containers.
#[must_use]
pub fn main_container<'a>(pod: &'a Pod, config: &ScanConfig) -> Option<&'a str> {
    if let Some(declared) = pod.annotations.get(&config.main_container_annotation) {
        if let Some(c) = pod.containers.iter().find(|c| c.name == *declared) {
            return Some(&c.name);
        }
    }

    let marker = config.main_container_marker.to_lowercase();
    if let Some(c) = pod
        .containers
        .iter()
        .find(|c| c.name.to_lowercase().contains(&marker))
    {
        return Some(&c.name);
    }

    pod.containers.first().map(|c| c.name.as_str())
}
