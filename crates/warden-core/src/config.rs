//! Scanner configuration
//!
//! Everything that used to be a compiled-in constant in earlier scanners
//! is an explicit [`ScanConfig`] value handed to the orchestrator at
//! construction time:
//! - the namespace scope marker (required, the scanner's safety gate)
//! - the protected namespace denylist
//! - critical label rules shielding infrastructure pods
//! - the two diagnostic probe commands and their deadlines
//! - the concurrency bound and scan interval

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A `key=value` label equality rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    /// Label key
    pub key: String,
    /// Required label value
    pub value: String,
}

impl LabelRule {
    /// Create a rule matching pods labelled `key=value`
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a `key=value` string
    ///
    /// # Errors
    /// `ConfigError::InvalidLabelRule` if the string is not `key=value`
    /// with a non-empty key.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Self::new(key, value)),
            _ => Err(ConfigError::InvalidLabelRule(raw.to_string())),
        }
    }

    /// Whether the given label mapping satisfies this rule
    #[must_use]
    pub fn matches(&self, labels: &std::collections::BTreeMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|v| *v == self.value)
    }
}

/// A fixed, operator-defined diagnostic command.
///
/// The command is configuration, never derived from pod-controlled data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// Short name used in logs, e.g. `runtime` or `agent`
    pub name: String,
    /// Command and arguments executed inside the container
    pub command: Vec<String>,
}

impl ProbeSpec {
    /// Create a probe spec
    #[must_use]
    pub fn new(name: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    /// A `sh -c` probe that greps the process list for a pattern
    #[must_use]
    pub fn process_grep(name: impl Into<String>, pattern: &str) -> Self {
        Self::new(
            name,
            vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("ps -ef | grep -v grep | grep {pattern}"),
            ],
        )
    }
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Required substring a namespace name must contain to be in scope.
    ///
    /// This is the deployment-specific safety gate: the scanner only acts
    /// on namespaces carrying this marker.
    pub scope_marker: String,
    /// Namespaces never scanned, matched case-insensitively
    pub protected_namespaces: Vec<String>,
    /// Pods whose labels match any of these rules are never scanned
    pub critical_labels: Vec<LabelRule>,
    /// Annotation naming the pod's main container
    pub main_container_annotation: String,
    /// Case-insensitive token marking a main container by name
    pub main_container_marker: String,
    /// Probe detecting the managed runtime process
    pub runtime_probe: ProbeSpec,
    /// Probe detecting the required observability agent
    pub agent_probe: ProbeSpec,
    /// Upper bound on concurrently probed pods, chosen for API-server
    /// rate limits rather than pod count
    pub max_concurrent_probes: usize,
    /// Deadline for a single API read or patch, in seconds
    pub api_timeout_secs: u64,
    /// Deadline for a single in-container probe, in seconds
    pub exec_timeout_secs: u64,
    /// Seconds between scan cycles
    pub scan_interval_secs: u64,
}

impl ScanConfig {
    /// Create a configuration scoped to namespaces containing `scope_marker`.
    ///
    /// All other fields start from the reference policy defaults and can
    /// be adjusted with the `with_*` builders.
    #[must_use]
    pub fn new(scope_marker: impl Into<String>) -> Self {
        Self {
            scope_marker: scope_marker.into(),
            protected_namespaces: vec![
                "kube-system".to_string(),
                "kube-public".to_string(),
                "monitoring".to_string(),
            ],
            critical_labels: vec![LabelRule::new("app.kubernetes.io/component", "monitoring")],
            main_container_annotation: "app.kubernetes.io/main-container".to_string(),
            main_container_marker: "main".to_string(),
            runtime_probe: ProbeSpec::process_grep("runtime", "java"),
            agent_probe: ProbeSpec::process_grep("agent", "pinpoint"),
            max_concurrent_probes: 8,
            api_timeout_secs: 10,
            exec_timeout_secs: 15,
            scan_interval_secs: 60,
        }
    }

    /// With a protected namespace denylist
    #[inline]
    #[must_use]
    pub fn with_protected_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.protected_namespaces = namespaces;
        self
    }

    /// With critical label rules
    #[inline]
    #[must_use]
    pub fn with_critical_labels(mut self, rules: Vec<LabelRule>) -> Self {
        self.critical_labels = rules;
        self
    }

    /// With the runtime-process probe
    #[inline]
    #[must_use]
    pub fn with_runtime_probe(mut self, probe: ProbeSpec) -> Self {
        self.runtime_probe = probe;
        self
    }

    /// With the agent probe
    #[inline]
    #[must_use]
    pub fn with_agent_probe(mut self, probe: ProbeSpec) -> Self {
        self.agent_probe = probe;
        self
    }

    /// With a probe concurrency bound
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max;
        self
    }

    /// With a scan interval in seconds
    #[inline]
    #[must_use]
    pub fn with_scan_interval_secs(mut self, secs: u64) -> Self {
        self.scan_interval_secs = secs;
        self
    }

    /// Deadline for a single API call
    #[inline]
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Deadline for a single in-container probe
    #[inline]
    #[must_use]
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }

    /// Interval between scan cycles
    #[inline]
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// - `ConfigError::EmptyScopeMarker` if no scope marker was given;
    ///   an unrestricted scanner could mutate unrelated namespaces.
    /// - `ConfigError::EmptyProbeCommand` if either probe has no command.
    /// - `ConfigError::ZeroConcurrency` if the probe bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scope_marker.trim().is_empty() {
            return Err(ConfigError::EmptyScopeMarker);
        }
        if self.runtime_probe.command.is_empty() {
            return Err(ConfigError::EmptyProbeCommand(self.runtime_probe.name.clone()));
        }
        if self.agent_probe.command.is_empty() {
            return Err(ConfigError::EmptyProbeCommand(self.agent_probe.name.clone()));
        }
        if self.max_concurrent_probes == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
