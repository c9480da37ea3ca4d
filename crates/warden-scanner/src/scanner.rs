//! Scan orchestration
//!
//! Drives one full cycle: enumerate namespaces, select, enumerate pods,
//! filter, evaluate under a bounded worker pool, deduplicate resolved
//! controllers, remediate serially. Per-item failures are logged and
//! counted, never fatal to the cycle; only a failed namespace
//! enumeration aborts, because there is nothing left to iterate over.

use crate::cluster::{with_deadline, ClusterApi};
use crate::error::ScanError;
use crate::evaluate::ComplianceEvaluator;
use crate::remediate::{Outcome, RemediationEngine};
use crate::resolve::OwnerResolver;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use warden_core::{eligibility, select_namespaces, ConfigError, Eligibility, Pod, ScanConfig};

/// Aggregated result of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Namespaces selected and scanned
    pub namespaces_scanned: usize,
    /// Eligible pods that were probed
    pub pods_inspected: usize,
    /// Pods excluded by the eligibility filter
    pub pods_skipped: usize,
    /// Pods found running the managed runtime without the agent
    pub non_compliant: usize,
    /// Deployments scaled down this cycle
    pub remediated: usize,
    /// Deployments that were already at zero replicas
    pub already_remediated: usize,
    /// Non-compliant pods whose controller could not be resolved
    pub unresolved: usize,
    /// Per-item infrastructure failures, retried next cycle
    pub failures: usize,
}

/// The compliance scanner.
pub struct Scanner {
    cluster: Arc<dyn ClusterApi>,
    config: ScanConfig,
    evaluator: ComplianceEvaluator,
    resolver: OwnerResolver,
    engine: RemediationEngine,
}

impl Scanner {
    /// Create a scanner over a live cluster handle.
    ///
    /// # Errors
    /// `ConfigError` when the configuration fails validation.
    pub fn new(cluster: Arc<dyn ClusterApi>, config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let evaluator = ComplianceEvaluator::new(config.clone());
        let resolver = OwnerResolver::new(config.api_timeout());
        let engine = RemediationEngine::new(&config);
        Ok(Self {
            cluster,
            config,
            evaluator,
            resolver,
            engine,
        })
    }

    /// With a custom evaluator, for non-command detection mechanisms
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: ComplianceEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Run scan cycles forever on the configured interval.
    ///
    /// Overrunning cycles coalesce the next tick instead of overlapping
    /// it; two cycles never race on the same controller.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.scan_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match self.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        namespaces = report.namespaces_scanned,
                        inspected = report.pods_inspected,
                        non_compliant = report.non_compliant,
                        remediated = report.remediated,
                        failures = report.failures,
                        "scan cycle finished"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scan cycle aborted");
                }
            }
        }
    }

    /// Run one full scan cycle.
    ///
    /// # Errors
    /// Only a failure to enumerate the namespace list; every other
    /// failure is absorbed into the [`CycleReport`].
    pub async fn run_cycle(&self) -> Result<CycleReport, ScanError> {
        let mut report = CycleReport::default();

        let namespaces = with_deadline(
            "list_namespaces",
            "",
            "",
            self.config.api_timeout(),
            self.cluster.list_namespaces(),
        )
        .await?;

        let selected = select_namespaces(&namespaces, &self.config);
        report.namespaces_scanned = selected.len();
        tracing::debug!(selected = selected.len(), total = namespaces.len(), "namespaces selected");

        let mut violators: Vec<Pod> = Vec::new();
        for namespace in selected {
            self.scan_namespace(&namespace.name, &mut report, &mut violators)
                .await;
        }
        report.non_compliant = violators.len();

        self.remediate_all(&violators, &mut report).await;
        Ok(report)
    }

    /// Scan one namespace, accumulating violators into `violators`.
    async fn scan_namespace(
        &self,
        namespace: &str,
        report: &mut CycleReport,
        violators: &mut Vec<Pod>,
    ) {
        tracing::debug!(namespace, "scanning namespace");

        let pods = match with_deadline(
            "list_pods",
            namespace,
            "",
            self.config.api_timeout(),
            self.cluster.list_pods(namespace),
        )
        .await
        {
            Ok(pods) => pods,
            Err(e) => {
                tracing::warn!(namespace, error = %e, "failed to list pods, skipping namespace");
                report.failures += 1;
                return;
            }
        };

        let mut eligible = Vec::new();
        for pod in pods {
            match eligibility(&pod, &self.config) {
                Eligibility::Eligible => eligible.push(pod),
                Eligibility::Skip(reason) => {
                    tracing::debug!(pod = %pod, %reason, "pod skipped");
                    report.pods_skipped += 1;
                }
            }
        }
        report.pods_inspected += eligible.len();

        // Probe with bounded fan-out; the bound protects the API server,
        // not this process.
        let verdicts = stream::iter(eligible.into_iter().map(|pod| {
            let cluster = Arc::clone(&self.cluster);
            let evaluator = &self.evaluator;
            async move {
                let verdict = evaluator.evaluate(cluster.as_ref(), &pod).await;
                (pod, verdict)
            }
        }))
        .buffer_unordered(self.config.max_concurrent_probes)
        .collect::<Vec<_>>()
        .await;

        for (pod, verdict) in verdicts {
            match verdict {
                Ok(v) if !v.is_compliant() => {
                    tracing::info!(pod = %pod, "non-compliant pod found");
                    violators.push(pod);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(pod = %pod, error = %e, "probe failed, pod state unknown");
                    report.failures += 1;
                }
            }
        }
    }

    /// Resolve violators to deployments, deduplicate, and remediate.
    ///
    /// Multiple pods of one deployment resolve to the same target;
    /// deduplication keeps remediation against a single controller
    /// serialized within a cycle and avoids duplicate patches.
    async fn remediate_all(&self, violators: &[Pod], report: &mut CycleReport) {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut targets = Vec::new();

        for pod in violators {
            match self.resolver.resolve(self.cluster.as_ref(), pod).await {
                Ok(deployment) => {
                    let key = (deployment.namespace.clone(), deployment.name.clone());
                    if seen.insert(key) {
                        targets.push(deployment);
                    }
                }
                Err(e) if e.is_resolution() => {
                    tracing::debug!(pod = %pod, error = %e, "no controller to remediate");
                    report.unresolved += 1;
                }
                Err(e) => {
                    tracing::warn!(pod = %pod, error = %e, "controller resolution failed");
                    report.failures += 1;
                }
            }
        }

        for deployment in targets {
            match self.engine.scale_down(self.cluster.as_ref(), &deployment).await {
                Ok(Outcome::ScaledDown) => report.remediated += 1,
                Ok(Outcome::AlreadyScaledDown) => report.already_remediated += 1,
                Err(e) => {
                    tracing::warn!(deployment = %deployment, error = %e, "remediation failed");
                    report.failures += 1;
                }
            }
        }
    }
}

// Tests live in tests/scanner.rs: `FakeCluster` implements the trait
// from the externally compiled library, so it cannot be used from unit
// tests (dev-dependency cycle limitation).
