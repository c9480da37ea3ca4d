//! Compliance evaluation
//!
//! Combines the two diagnostic probes into a per-pod verdict. Each pod
//! is freshly probed every cycle; process state can change between
//! cycles and there is no signal to invalidate a cache, so there is
//! deliberately none.

use crate::cluster::ClusterApi;
use crate::error::ScanError;
use crate::probe::{CommandProbe, Probe};
use std::sync::Arc;
use warden_core::{main_container, ComplianceVerdict, Pod, ScanConfig};

/// Evaluates one pod against the compliance rule.
pub struct ComplianceEvaluator {
    config: ScanConfig,
    runtime_probe: Arc<dyn Probe>,
    agent_probe: Arc<dyn Probe>,
}

impl ComplianceEvaluator {
    /// Build the evaluator with command probes from the configuration
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let runtime_probe: Arc<dyn Probe> = Arc::new(CommandProbe::new(
            config.runtime_probe.clone(),
            config.exec_timeout(),
        ));
        let agent_probe: Arc<dyn Probe> = Arc::new(CommandProbe::new(
            config.agent_probe.clone(),
            config.exec_timeout(),
        ));
        Self {
            config,
            runtime_probe,
            agent_probe,
        }
    }

    /// With custom probe implementations, for detection mechanisms other
    /// than in-container commands
    #[must_use]
    pub fn with_probes(
        config: ScanConfig,
        runtime_probe: Arc<dyn Probe>,
        agent_probe: Arc<dyn Probe>,
    ) -> Self {
        Self {
            config,
            runtime_probe,
            agent_probe,
        }
    }

    /// Probe one pod and return its verdict.
    ///
    /// A pod with zero containers cannot run the managed runtime and is
    /// vacuously compliant.
    ///
    /// # Errors
    /// Infrastructure failures from either probe; the pod's state is
    /// then unknown and the caller must skip it for this cycle.
    pub async fn evaluate(
        &self,
        cluster: &dyn ClusterApi,
        pod: &Pod,
    ) -> Result<ComplianceVerdict, ScanError> {
        let Some(container) = main_container(pod, &self.config) else {
            tracing::debug!(pod = %pod, "pod has no containers, vacuously compliant");
            return Ok(ComplianceVerdict::vacuously_compliant());
        };

        let runtime = self.runtime_probe.detect(cluster, pod, container).await?;
        let agent = self.agent_probe.detect(cluster, pod, container).await?;

        let verdict = ComplianceVerdict::new(runtime.is_present(), agent.is_present());
        tracing::debug!(
            pod = %pod,
            container,
            runtime = verdict.runtime_detected,
            agent = verdict.agent_detected,
            compliant = verdict.is_compliant(),
            "pod evaluated"
        );
        Ok(verdict)
    }
}

// Tests live in tests/evaluate.rs: `FakeCluster` implements the trait
// from the externally compiled library, so it cannot be used from unit
// tests (dev-dependency cycle limitation).
