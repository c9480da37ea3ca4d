//! Testing utilities for the warden workspace
//!
//! An in-memory [`FakeCluster`] implementing the scanner's cluster API,
//! with scripted probe outcomes, injectable faults and call recording,
//! plus fixture builders for pods and workloads.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use warden_core::{
    Container, Deployment, Namespace, OwnerRef, Pod, ReplicaSet, KIND_DEPLOYMENT, KIND_REPLICA_SET,
};
use warden_scanner::{ApiError, ClusterApi, ExecOutput};

/// Scripted outcome for an exec whose command contains a given needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecScript {
    /// Command exits zero, the condition is present
    Present,
    /// Command exits non-zero, the condition is absent
    Absent,
}

/// In-memory cluster with scripted behavior and call recording.
///
/// All mutating methods take `&self`; the fake is shared freely behind
/// an `Arc` like a real client handle.
#[derive(Default)]
pub struct FakeCluster {
    namespaces: Mutex<Vec<Namespace>>,
    pods: DashMap<String, Vec<Pod>>,
    replica_sets: DashMap<(String, String), ReplicaSet>,
    deployments: DashMap<(String, String), Deployment>,
    // Scripts keyed by pod name: (command needle, outcome).
    exec_scripts: DashMap<String, Vec<(String, ExecScript)>>,
    broken_exec_pods: DashMap<String, ()>,
    broken_pod_lists: DashMap<String, ()>,
    namespaces_broken: AtomicBool,
    patch_calls: DashMap<(String, String), usize>,
    exec_calls: DashMap<String, usize>,
}

impl FakeCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(&self, name: &str) {
        let mut namespaces = self.namespaces.lock().unwrap();
        if !namespaces.iter().any(|ns| ns.name == name) {
            namespaces.push(Namespace::new(name));
        }
    }

    pub fn add_pod(&self, pod: Pod) {
        self.add_namespace(&pod.namespace);
        self.pods.entry(pod.namespace.clone()).or_default().push(pod);
    }

    pub fn put_replica_set(&self, replica_set: ReplicaSet) {
        self.replica_sets.insert(
            (replica_set.namespace.clone(), replica_set.name.clone()),
            replica_set,
        );
    }

    pub fn put_deployment(&self, deployment: Deployment) {
        self.deployments.insert(
            (deployment.namespace.clone(), deployment.name.clone()),
            deployment,
        );
    }

    /// Seed a full deployment → replica set → pods chain.
    ///
    /// The replica set is named `{deployment}-rs`; each pod gets one
    /// container named `app` and an owner reference to the replica set.
    pub fn seed_workload(&self, namespace: &str, deployment: &str, replicas: i32, pods: &[&str]) {
        self.add_namespace(namespace);
        self.put_deployment(Deployment::new(namespace, deployment).with_replicas(replicas));

        let rs_name = format!("{deployment}-rs");
        let mut replica_set = ReplicaSet::new(namespace, rs_name.clone());
        replica_set
            .owner_refs
            .push(OwnerRef::new(KIND_DEPLOYMENT, deployment));
        self.put_replica_set(replica_set);

        for pod_name in pods {
            self.add_pod(owned_pod(namespace, pod_name, &rs_name));
        }
    }

    /// Seed a replica set that no deployment owns.
    pub fn seed_orphan_replica_set(&self, namespace: &str, name: &str) {
        self.add_namespace(namespace);
        self.put_replica_set(ReplicaSet::new(namespace, name));
    }

    /// Script the outcome of any exec on `pod` whose command contains
    /// `needle`. Unscripted commands default to [`ExecScript::Absent`].
    pub fn script_probe(&self, pod: &str, needle: &str, script: ExecScript) {
        self.exec_scripts
            .entry(pod.to_string())
            .or_default()
            .push((needle.to_string(), script));
    }

    /// Make every exec against `pod` fail at the channel level.
    pub fn break_exec(&self, pod: &str) {
        self.broken_exec_pods.insert(pod.to_string(), ());
    }

    /// Make namespace enumeration fail.
    pub fn fail_list_namespaces(&self) {
        self.namespaces_broken.store(true, Ordering::SeqCst);
    }

    /// Make pod listing fail for one namespace.
    pub fn fail_list_pods(&self, namespace: &str) {
        self.broken_pod_lists.insert(namespace.to_string(), ());
    }

    #[must_use]
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .map(|d| d.clone())
    }

    /// Patches issued against one deployment.
    #[must_use]
    pub fn patch_count(&self, namespace: &str, name: &str) -> usize {
        self.patch_calls
            .get(&(namespace.to_string(), name.to_string()))
            .map_or(0, |c| *c)
    }

    /// Patches issued against any deployment.
    #[must_use]
    pub fn total_patch_count(&self) -> usize {
        self.patch_calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Exec calls issued against one pod.
    #[must_use]
    pub fn exec_count(&self, pod: &str) -> usize {
        self.exec_calls.get(pod).map_or(0, |c| *c)
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ApiError> {
        if self.namespaces_broken.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("namespace list unavailable".to_string()));
        }
        Ok(self.namespaces.lock().unwrap().clone())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ApiError> {
        if self.broken_pod_lists.contains_key(namespace) {
            return Err(ApiError::Transport(format!(
                "pod list unavailable in {namespace}"
            )));
        }
        Ok(self
            .pods
            .get(namespace)
            .map(|pods| pods.clone())
            .unwrap_or_default())
    }

    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ApiError> {
        self.replica_sets
            .get(&(namespace.to_string(), name.to_string()))
            .map(|rs| rs.clone())
            .ok_or_else(|| ApiError::NotFound {
                kind: "ReplicaSet",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ApiError> {
        self.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .map(|d| d.clone())
            .ok_or_else(|| ApiError::NotFound {
                kind: "Deployment",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn exec(
        &self,
        _namespace: &str,
        pod: &str,
        _container: &str,
        command: &[String],
    ) -> Result<ExecOutput, ApiError> {
        *self.exec_calls.entry(pod.to_string()).or_insert(0) += 1;

        if self.broken_exec_pods.contains_key(pod) {
            return Err(ApiError::ExecChannel(format!(
                "channel to {pod} could not be opened"
            )));
        }

        let joined = command.join(" ");
        if let Some(scripts) = self.exec_scripts.get(pod) {
            for (needle, script) in scripts.iter() {
                if joined.contains(needle.as_str()) {
                    return Ok(match script {
                        ExecScript::Present => ExecOutput::matched(format!("{needle} 1234")),
                        ExecScript::Absent => ExecOutput::unmatched(),
                    });
                }
            }
        }
        Ok(ExecOutput::unmatched())
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, ApiError> {
        let key = (namespace.to_string(), name.to_string());
        let mut deployment = self
            .deployments
            .get(&key)
            .map(|d| d.clone())
            .ok_or_else(|| ApiError::NotFound {
                kind: "Deployment",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        // Merge semantics for the two fields the scanner touches.
        if let Some(replicas) = patch["spec"]["replicas"].as_i64() {
            deployment.replicas = Some(replicas as i32);
        }
        if let Some(annotations) = patch["metadata"]["annotations"].as_object() {
            for (k, v) in annotations {
                if let Some(value) = v.as_str() {
                    deployment.annotations.insert(k.clone(), value.to_string());
                }
            }
        }

        *self.patch_calls.entry(key.clone()).or_insert(0) += 1;
        self.deployments.insert(key, deployment.clone());
        Ok(deployment)
    }
}

/// A pod with one `app` container, owned by the given replica set.
#[must_use]
pub fn owned_pod(namespace: &str, name: &str, replica_set: &str) -> Pod {
    let mut pod = Pod::new(namespace, name);
    pod.containers.push(Container::new("app"));
    pod.owner_refs
        .push(OwnerRef::new(KIND_REPLICA_SET, replica_set));
    pod
}

/// A pod with one `app` container and no owner references.
#[must_use]
pub fn standalone_pod(namespace: &str, name: &str) -> Pod {
    let mut pod = Pod::new(namespace, name);
    pod.containers.push(Container::new("app"));
    pod
}
