//! Remediation of non-compliant workloads
//!
//! Remediation scales the owning deployment to zero replicas and stamps
//! two audit annotations in the same merge patch: a fixed status marker
//! and a timestamp of the action. The annotations are the system's only
//! persisted output and stay human-readable and grep-able.
//!
//! The patch touches only `spec.replicas` and the two annotation keys;
//! it is never a read-modify-write of the full object, so concurrent
//! unrelated edits to the deployment survive.

use crate::cluster::{with_deadline, ClusterApi};
use crate::error::ScanError;
use crate::resolve::OwnerResolver;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::time::Duration;
use warden_core::{Deployment, Pod, ScanConfig};

/// Annotation carrying the fixed remediation status marker.
pub const STATUS_ANNOTATION: &str = "warden.io/status";

/// Annotation carrying the remediation timestamp.
pub const TIMESTAMP_ANNOTATION: &str = "warden.io/last-remediated";

/// Value written to [`STATUS_ANNOTATION`].
pub const STATUS_QUARANTINED: &str = "quarantined by warden";

/// What remediation did to a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The deployment was scaled to zero and annotated
    ScaledDown,
    /// Already at zero replicas; nothing was patched
    AlreadyScaledDown,
}

/// Format the audit timestamp.
///
/// ISO-8601-like, with `:` and `+` replaced by `-` since both are
/// illegal in the label value charset and awkward in filenames.
#[must_use]
pub fn audit_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
        .replace([':', '+'], "-")
}

/// Scales non-compliant workloads down, idempotently.
#[derive(Debug, Clone)]
pub struct RemediationEngine {
    resolver: OwnerResolver,
    api_deadline: Duration,
}

impl RemediationEngine {
    /// Create an engine using the configuration's API deadline
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            resolver: OwnerResolver::new(config.api_timeout()),
            api_deadline: config.api_timeout(),
        }
    }

    /// Resolve `pod`'s deployment and scale it down.
    ///
    /// # Errors
    /// Resolution failures and API failures; when resolution fails no
    /// action is taken.
    pub async fn remediate(
        &self,
        cluster: &dyn ClusterApi,
        pod: &Pod,
    ) -> Result<Outcome, ScanError> {
        let deployment = self.resolver.resolve(cluster, pod).await?;
        self.scale_down(cluster, &deployment).await
    }

    /// Scale an already-resolved deployment to zero and annotate it.
    ///
    /// No-op when the deployment is already at zero replicas.
    ///
    /// # Errors
    /// API failures from the patch call.
    pub async fn scale_down(
        &self,
        cluster: &dyn ClusterApi,
        deployment: &Deployment,
    ) -> Result<Outcome, ScanError> {
        if deployment.is_scaled_down() {
            tracing::info!(deployment = %deployment, "already scaled down, skipping");
            return Ok(Outcome::AlreadyScaledDown);
        }

        let patch = quarantine_patch(Utc::now());
        tracing::info!(deployment = %deployment, "scaling down and annotating");

        with_deadline(
            "patch_deployment",
            &deployment.namespace,
            &deployment.name,
            self.api_deadline,
            cluster.patch_deployment(&deployment.namespace, &deployment.name, &patch),
        )
        .await?;

        Ok(Outcome::ScaledDown)
    }
}

/// Build the merge patch: zero replicas plus the two audit annotations.
fn quarantine_patch(at: DateTime<Utc>) -> serde_json::Value {
    json!({
        "metadata": {
            "annotations": {
                STATUS_ANNOTATION: STATUS_QUARANTINED,
                TIMESTAMP_ANNOTATION: audit_timestamp(at),
            }
        },
        "spec": {
            "replicas": 0
        }
    })
}
