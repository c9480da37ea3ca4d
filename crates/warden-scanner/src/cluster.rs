//! Cluster API boundary
//!
//! The scanner consumes the orchestration platform's control plane
//! through [`ClusterApi`], an async trait covering exactly the six
//! operations the pipeline needs: list namespaces, list pods, get
//! replica set, get deployment, exec into a container, and merge-patch a
//! deployment. A live client implements this trait in the deployment
//! binary; tests implement it in memory.
//!
//! A non-zero command exit is NOT an [`ApiError`]: it is a valid
//! [`ExecOutput`] with `exited_zero == false`. Only failures of the
//! channel itself (open, stream, auth, transport) are errors.

use crate::error::ScanError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use warden_core::{Deployment, Namespace, Pod, ReplicaSet};

/// Errors surfaced by the cluster API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Object kind, e.g. `ReplicaSet`
        kind: &'static str,
        /// Object namespace
        namespace: String,
        /// Object name
        name: String,
    },

    /// The exec channel could not be opened or streamed
    #[error("exec channel failed: {0}")]
    ExecChannel(String),

    /// The control plane could not be reached
    #[error("transport failure: {0}")]
    Transport(String),

    /// The credential lacks permission for the operation
    #[error("access denied: {0}")]
    Denied(String),
}

impl ApiError {
    /// Whether this is a missing-object error rather than an outage
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Captured output of one in-container command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Whether the command exited with status zero
    pub exited_zero: bool,
}

impl ExecOutput {
    /// A successful execution with the given stdout
    #[must_use]
    pub fn matched(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exited_zero: true,
        }
    }

    /// A clean non-zero exit, the normal negative probe signal
    #[must_use]
    pub fn unmatched() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exited_zero: false,
        }
    }
}

/// The scanner's window onto the cluster control plane.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List all namespaces known to the cluster
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ApiError>;

    /// List running pods in one namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ApiError>;

    /// Fetch a replica set by namespace and name
    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ApiError>;

    /// Fetch a deployment by namespace and name
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ApiError>;

    /// Run a command in one container of a pod and capture its output
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, ApiError>;

    /// Apply a merge patch to a deployment, returning the updated object
    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, ApiError>;
}

/// Run one cluster call under a deadline, mapping both the API failure
/// and deadline expiry into a [`ScanError`] that carries the operation
/// and object identity for the logs.
pub(crate) async fn with_deadline<T, F>(
    operation: &'static str,
    namespace: &str,
    name: &str,
    deadline: Duration,
    call: F,
) -> Result<T, ScanError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ScanError::Api {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        }),
        Err(_) => Err(ScanError::Deadline {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
            secs: deadline.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_output_constructors() {
        assert!(ExecOutput::matched("java 1234").exited_zero);
        assert!(!ExecOutput::unmatched().exited_zero);
    }

    #[test]
    fn not_found_classifier() {
        let err = ApiError::NotFound {
            kind: "ReplicaSet",
            namespace: "billing_test".to_string(),
            name: "api-rs".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ApiError::Transport("connection refused".to_string()).is_not_found());
    }

    #[tokio::test]
    async fn deadline_maps_api_error() {
        let result: Result<(), ScanError> = with_deadline(
            "get_deployment",
            "ns",
            "api",
            Duration::from_secs(5),
            async { Err(ApiError::Transport("down".to_string())) },
        )
        .await;

        assert!(matches!(
            result,
            Err(ScanError::Api { operation: "get_deployment", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_maps_timeout() {
        let result: Result<(), ScanError> = with_deadline(
            "exec",
            "ns",
            "api-7f8d",
            Duration::from_secs(1),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(ScanError::Deadline { secs: 1, .. })));
    }
}
