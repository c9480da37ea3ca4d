//! Remote diagnostic probes
//!
//! A probe answers one question about a live container: is a given
//! condition present inside it? [`CommandProbe`] is the reference
//! implementation, running a fixed operator-defined command over the
//! exec channel and reading the exit status. The [`Probe`] trait keeps
//! the detection mechanism pluggable; a future implementation could
//! consult an agent health endpoint instead without touching the
//! evaluator.
//!
//! Exit-status semantics: the probe command is expected to exit non-zero
//! exactly when the searched-for condition is absent (a grep with no
//! match), so a clean non-zero exit is the normal negative signal. A
//! channel failure or deadline expiry is an infrastructure error and is
//! never folded into "absent" — remediating on unknown state during a
//! control-plane outage is the one thing this scanner must not do.

use crate::cluster::{with_deadline, ClusterApi};
use crate::error::ScanError;
use async_trait::async_trait;
use std::time::Duration;
use warden_core::{Pod, ProbeSpec};

/// Result of one diagnostic probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The condition is present in the container
    Present,
    /// The condition is absent; a valid negative result
    Absent,
}

impl Detection {
    /// Whether the condition was detected
    #[inline]
    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

/// A presence check against one container of a pod.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run the check inside `container` of `pod`.
    ///
    /// # Errors
    /// Infrastructure failures only: channel errors and deadline expiry.
    /// "Condition absent" is `Ok(Detection::Absent)`, never an error.
    async fn detect(
        &self,
        cluster: &dyn ClusterApi,
        pod: &Pod,
        container: &str,
    ) -> Result<Detection, ScanError>;
}

/// Probe that runs a fixed command and reads its exit status.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    spec: ProbeSpec,
    deadline: Duration,
}

impl CommandProbe {
    /// Create a probe from its command spec and per-invocation deadline
    #[inline]
    #[must_use]
    pub fn new(spec: ProbeSpec, deadline: Duration) -> Self {
        Self { spec, deadline }
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn detect(
        &self,
        cluster: &dyn ClusterApi,
        pod: &Pod,
        container: &str,
    ) -> Result<Detection, ScanError> {
        let output = with_deadline(
            "exec",
            &pod.namespace,
            &pod.name,
            self.deadline,
            cluster.exec(&pod.namespace, &pod.name, container, &self.spec.command),
        )
        .await?;

        let detection = if output.exited_zero {
            Detection::Present
        } else {
            Detection::Absent
        };
        tracing::debug!(
            probe = %self.spec.name,
            pod = %pod,
            container,
            detected = detection.is_present(),
            "probe finished"
        );
        Ok(detection)
    }
}
