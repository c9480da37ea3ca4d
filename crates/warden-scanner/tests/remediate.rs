//! Remediation tests against the fake cluster.
//!
//! These live as integration tests rather than unit tests because
//! `FakeCluster` implements `ClusterApi` from the externally compiled
//! library; inside a unit test the crate is compiled a second time and
//! the trait identities diverge (dev-dependency cycle limitation).
//! Tests of the private patch builder remain in `src/remediate.rs`.

use pretty_assertions::assert_eq;
use warden_core::ScanConfig;
use warden_scanner::{
    Outcome, RemediationEngine, STATUS_ANNOTATION, STATUS_QUARANTINED, TIMESTAMP_ANNOTATION,
};
use warden_test_utils::{owned_pod, FakeCluster};

fn engine() -> RemediationEngine {
    RemediationEngine::new(&ScanConfig::new("_test"))
}

#[tokio::test]
async fn scales_down_and_annotates() {
    let cluster = FakeCluster::new();
    cluster.seed_workload("billing_test", "api", 3, &["api-7f8d"]);

    let pod = owned_pod("billing_test", "api-7f8d", "api-rs");
    let outcome = engine().remediate(&cluster, &pod).await.unwrap();
    assert_eq!(outcome, Outcome::ScaledDown);

    let deployment = cluster.deployment("billing_test", "api").unwrap();
    assert_eq!(deployment.replicas, Some(0));
    assert_eq!(
        deployment.annotations.get(STATUS_ANNOTATION).map(String::as_str),
        Some(STATUS_QUARANTINED)
    );
    assert!(deployment.annotations.contains_key(TIMESTAMP_ANNOTATION));
}

#[tokio::test]
async fn second_remediation_is_a_no_op() {
    let cluster = FakeCluster::new();
    cluster.seed_workload("billing_test", "api", 3, &["api-7f8d"]);
    let pod = owned_pod("billing_test", "api-7f8d", "api-rs");

    let engine = engine();
    assert_eq!(
        engine.remediate(&cluster, &pod).await.unwrap(),
        Outcome::ScaledDown
    );
    assert_eq!(
        engine.remediate(&cluster, &pod).await.unwrap(),
        Outcome::AlreadyScaledDown
    );

    // Exactly one patch across both invocations.
    assert_eq!(cluster.patch_count("billing_test", "api"), 1);
}

#[tokio::test]
async fn unresolvable_pod_takes_no_action() {
    let cluster = FakeCluster::new();
    let pod = warden_core::Pod::new("billing_test", "one-off");

    let err = engine().remediate(&cluster, &pod).await.unwrap_err();
    assert!(err.is_resolution());
    assert_eq!(cluster.total_patch_count(), 0);
}

#[tokio::test]
async fn unspecified_replicas_still_patched() {
    // `None` means platform default (one replica), not zero.
    let cluster = FakeCluster::new();
    cluster.seed_workload("billing_test", "api", 1, &["api-7f8d"]);
    let mut deployment = cluster.deployment("billing_test", "api").unwrap();
    deployment.replicas = None;
    cluster.put_deployment(deployment.clone());

    let outcome = engine().scale_down(&cluster, &deployment).await.unwrap();
    assert_eq!(outcome, Outcome::ScaledDown);
    assert_eq!(
        cluster.deployment("billing_test", "api").unwrap().replicas,
        Some(0)
    );
}
