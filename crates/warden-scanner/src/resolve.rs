//! Owner chain resolution
//!
//! Walks a pod's ownership references up to the deployment that manages
//! it: pod → ReplicaSet owner ref → ReplicaSet → Deployment owner ref →
//! Deployment. Two sequential remote reads, each under the configured
//! deadline. Deliberately uncached across cycles: ownership can change,
//! and a stale chain would remediate the wrong controller.

use crate::cluster::{with_deadline, ClusterApi};
use crate::error::ScanError;
use std::time::Duration;
use warden_core::{Deployment, Pod, KIND_DEPLOYMENT, KIND_REPLICA_SET};

/// Resolves a pod to its owning deployment.
#[derive(Debug, Clone)]
pub struct OwnerResolver {
    api_deadline: Duration,
}

impl OwnerResolver {
    /// Create a resolver using the given per-read deadline
    #[inline]
    #[must_use]
    pub fn new(api_deadline: Duration) -> Self {
        Self { api_deadline }
    }

    /// Resolve the deployment owning `pod`.
    ///
    /// # Errors
    /// - `ScanError::NoController` when either link of the chain is
    ///   missing from the ownership references
    /// - `ScanError::Api` / `ScanError::Deadline` when a fetch fails;
    ///   propagated per-pod, never retried here
    pub async fn resolve(
        &self,
        cluster: &dyn ClusterApi,
        pod: &Pod,
    ) -> Result<Deployment, ScanError> {
        let rs_ref = pod
            .owner_of_kind(KIND_REPLICA_SET)
            .ok_or_else(|| ScanError::NoController {
                namespace: pod.namespace.clone(),
                name: pod.name.clone(),
            })?;

        let replica_set = with_deadline(
            "get_replica_set",
            &pod.namespace,
            &rs_ref.name,
            self.api_deadline,
            cluster.get_replica_set(&pod.namespace, &rs_ref.name),
        )
        .await?;

        let dep_ref = replica_set
            .owner_of_kind(KIND_DEPLOYMENT)
            .ok_or_else(|| ScanError::NoController {
                namespace: pod.namespace.clone(),
                name: pod.name.clone(),
            })?;

        let deployment = with_deadline(
            "get_deployment",
            &pod.namespace,
            &dep_ref.name,
            self.api_deadline,
            cluster.get_deployment(&pod.namespace, &dep_ref.name),
        )
        .await?;

        tracing::debug!(pod = %pod, deployment = %deployment, "owner chain resolved");
        Ok(deployment)
    }
}

// Tests live in tests/resolve.rs: `FakeCluster` implements the trait
// from the externally compiled library, so it cannot be used from unit
// tests (dev-dependency cycle limitation).
