//! Domain model for the compliance scanner
//!
//! Plain value types mirroring what the scanner observes through the
//! cluster API:
//! - Namespaces and their names
//! - Pods with labels, annotations, containers and owner references
//! - The intermediate ReplicaSet and the top-level Deployment
//! - The per-pod compliance verdict

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owner reference kind for the intermediate replica-set controller.
pub const KIND_REPLICA_SET: &str = "ReplicaSet";

/// Owner reference kind for the top-level workload controller.
pub const KIND_DEPLOYMENT: &str = "Deployment";

/// A cluster namespace, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace name
    pub name: String,
}

impl Namespace {
    /// Create a namespace with the given name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A typed back-pointer from a managed object to its controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Controller kind, e.g. `ReplicaSet` or `Deployment`
    pub kind: String,
    /// Controller name
    pub name: String,
}

impl OwnerRef {
    /// Create an owner reference
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// A container inside a pod, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container name
    pub name: String,
}

impl Container {
    /// Create a container with the given name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A running instance of one or more co-located containers.
///
/// Pods are ephemeral and observed only; the scanner never mutates them.
/// Remediation always targets the owning [`Deployment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    /// Namespace the pod runs in
    pub namespace: String,
    /// Pod name
    pub name: String,
    /// Label mapping
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotation mapping
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Containers in declaration order
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Owner references, if created by a controller
    #[serde(default)]
    pub owner_refs: Vec<OwnerRef>,
    /// Set once termination has been requested
    pub deletion_timestamp: Option<String>,
}

impl Pod {
    /// Create a pod with no labels, annotations, containers or owners
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            containers: Vec::new(),
            owner_refs: Vec::new(),
            deletion_timestamp: None,
        }
    }

    /// Whether termination of this pod has already been requested
    #[inline]
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    /// First owner reference of the given kind, if any
    #[must_use]
    pub fn owner_of_kind(&self, kind: &str) -> Option<&OwnerRef> {
        self.owner_refs.iter().find(|r| r.kind == kind)
    }
}

impl std::fmt::Display for Pod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The intermediate controller between a pod and its deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    /// Namespace the replica set lives in
    pub namespace: String,
    /// Replica set name
    pub name: String,
    /// Owner references; at most one points at a deployment
    #[serde(default)]
    pub owner_refs: Vec<OwnerRef>,
}

impl ReplicaSet {
    /// Create a replica set with no owners
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            owner_refs: Vec::new(),
        }
    }

    /// First owner reference of the given kind, if any
    #[must_use]
    pub fn owner_of_kind(&self, kind: &str) -> Option<&OwnerRef> {
        self.owner_refs.iter().find(|r| r.kind == kind)
    }
}

/// The top-level workload controller and unit of remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Namespace the deployment lives in
    pub namespace: String,
    /// Deployment name
    pub name: String,
    /// Desired replica count; `None` means unspecified/default
    pub replicas: Option<i32>,
    /// Label mapping
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotation mapping
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl Deployment {
    /// Create a deployment with an unspecified replica count
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            replicas: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// With a desired replica count
    #[inline]
    #[must_use]
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    /// Whether the deployment is already scaled to zero
    #[inline]
    #[must_use]
    pub fn is_scaled_down(&self) -> bool {
        self.replicas == Some(0)
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of probing one pod.
///
/// A pod is compliant unless it runs the managed runtime without the
/// required observability agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    /// The managed runtime process was detected
    pub runtime_detected: bool,
    /// The required observability agent was detected
    pub agent_detected: bool,
}

impl ComplianceVerdict {
    /// Combine the two probe results into a verdict
    #[inline]
    #[must_use]
    pub fn new(runtime_detected: bool, agent_detected: bool) -> Self {
        Self {
            runtime_detected,
            agent_detected,
        }
    }

    /// Verdict for a pod that could not run the managed runtime at all
    /// (for example, a pod with zero containers)
    #[inline]
    #[must_use]
    pub fn vacuously_compliant() -> Self {
        Self::new(false, false)
    }

    /// Whether the pod passes the policy
    #[inline]
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        !(self.runtime_detected && !self.agent_detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn verdict_truth_table() {
        assert!(!ComplianceVerdict::new(true, false).is_compliant());
        assert!(ComplianceVerdict::new(true, true).is_compliant());
        assert!(ComplianceVerdict::new(false, false).is_compliant());
        assert!(ComplianceVerdict::new(false, true).is_compliant());
    }

    #[test]
    fn pod_owner_lookup() {
        let mut pod = Pod::new("billing_test", "api-7f8d");
        pod.owner_refs.push(OwnerRef::new(KIND_REPLICA_SET, "api-rs"));
        pod.owner_refs.push(OwnerRef::new("Node", "worker-1"));

        assert_eq!(
            pod.owner_of_kind(KIND_REPLICA_SET),
            Some(&OwnerRef::new(KIND_REPLICA_SET, "api-rs"))
        );
        assert_eq!(pod.owner_of_kind(KIND_DEPLOYMENT), None);
    }

    #[test]
    fn pod_terminating() {
        let mut pod = Pod::new("ns", "p");
        assert!(!pod.is_terminating());

        pod.deletion_timestamp = Some("2026-08-30T10:00:00Z".to_string());
        assert!(pod.is_terminating());
    }

    #[test]
    fn deployment_scaled_down() {
        let dep = Deployment::new("ns", "api");
        assert!(!dep.is_scaled_down());
        assert!(dep.with_replicas(0).is_scaled_down());
        assert!(!Deployment::new("ns", "api").with_replicas(3).is_scaled_down());
    }

    #[test]
    fn pod_display() {
        let pod = Pod::new("billing_test", "api-7f8d");
        assert_eq!(pod.to_string(), "billing_test/api-7f8d");
    }
}
