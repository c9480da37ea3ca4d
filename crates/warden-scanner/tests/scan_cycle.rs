//! End-to-end scan cycles against the in-memory cluster.

use std::sync::Arc;
use warden_core::ScanConfig;
use warden_scanner::{Scanner, STATUS_ANNOTATION, STATUS_QUARANTINED, TIMESTAMP_ANNOTATION};
use warden_test_utils::{standalone_pod, ExecScript, FakeCluster};

fn scanner(cluster: &Arc<FakeCluster>) -> Scanner {
    Scanner::new(Arc::clone(cluster) as Arc<dyn warden_scanner::ClusterApi>, ScanConfig::new("_test"))
        .expect("valid config")
}

/// Mark a pod as running the managed runtime without the agent.
fn script_violator(cluster: &FakeCluster, pod: &str) {
    cluster.script_probe(pod, "java", ExecScript::Present);
    cluster.script_probe(pod, "pinpoint", ExecScript::Absent);
}

/// Mark a pod as running the runtime with the agent attached.
fn script_instrumented(cluster: &FakeCluster, pod: &str) {
    cluster.script_probe(pod, "java", ExecScript::Present);
    cluster.script_probe(pod, "pinpoint", ExecScript::Present);
}

#[tokio::test]
async fn violating_workload_is_scaled_down_and_annotated() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 3, &["api-7f8d"]);
    script_violator(&cluster, "api-7f8d");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.non_compliant, 1);
    assert_eq!(report.remediated, 1);
    assert_eq!(report.failures, 0);

    let deployment = cluster.deployment("billing_test", "api").unwrap();
    assert_eq!(deployment.replicas, Some(0));
    assert_eq!(
        deployment.annotations.get(STATUS_ANNOTATION).map(String::as_str),
        Some(STATUS_QUARANTINED)
    );
    let stamp = deployment.annotations.get(TIMESTAMP_ANNOTATION).unwrap();
    assert!(!stamp.contains(':') && !stamp.contains('+'));
}

#[tokio::test]
async fn instrumented_workload_is_left_alone() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 3, &["api-7f8d"]);
    script_instrumented(&cluster, "api-7f8d");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.non_compliant, 0);
    assert_eq!(report.remediated, 0);
    assert_eq!(cluster.total_patch_count(), 0);
    assert_eq!(cluster.deployment("billing_test", "api").unwrap().replicas, Some(3));
}

#[tokio::test]
async fn out_of_scope_and_protected_namespaces_are_never_probed() {
    let cluster = Arc::new(FakeCluster::new());
    // In scope and violating.
    cluster.seed_workload("billing_test", "api", 2, &["api-7f8d"]);
    script_violator(&cluster, "api-7f8d");
    // Protected, would otherwise violate.
    cluster.seed_workload("kube-system", "dns", 2, &["dns-1"]);
    script_violator(&cluster, "dns-1");
    // No scope marker.
    cluster.seed_workload("production", "store", 2, &["store-1"]);
    script_violator(&cluster, "store-1");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.namespaces_scanned, 1);
    assert_eq!(cluster.exec_count("dns-1"), 0);
    assert_eq!(cluster.exec_count("store-1"), 0);
    assert_eq!(cluster.deployment("kube-system", "dns").unwrap().replicas, Some(2));
    assert_eq!(cluster.deployment("production", "store").unwrap().replicas, Some(2));
    assert_eq!(cluster.deployment("billing_test", "api").unwrap().replicas, Some(0));
}

#[tokio::test]
async fn pods_of_one_deployment_produce_a_single_patch() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 4, &["api-7f8d", "api-9c2a", "api-b441"]);
    for pod in ["api-7f8d", "api-9c2a", "api-b441"] {
        script_violator(&cluster, pod);
    }

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.non_compliant, 3);
    assert_eq!(report.remediated, 1);
    assert_eq!(cluster.patch_count("billing_test", "api"), 1);
}

#[tokio::test]
async fn ownerless_pod_is_skipped_without_probing() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.add_pod(standalone_pod("billing_test", "one-off"));
    script_violator(&cluster, "one-off");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.pods_skipped, 1);
    assert_eq!(report.pods_inspected, 0);
    // The eligibility filter ran before any diagnostic probe.
    assert_eq!(cluster.exec_count("one-off"), 0);
}

#[tokio::test]
async fn broken_exec_channel_never_remediates() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 2, &["api-7f8d"]);
    cluster.break_exec("api-7f8d");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    // Infrastructure failure: state unknown, retried next cycle.
    assert_eq!(report.failures, 1);
    assert_eq!(report.non_compliant, 0);
    assert_eq!(cluster.total_patch_count(), 0);
    assert_eq!(cluster.deployment("billing_test", "api").unwrap().replicas, Some(2));
}

#[tokio::test]
async fn already_zero_deployment_is_not_patched_again() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 0, &["api-7f8d"]);
    script_violator(&cluster, "api-7f8d");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.already_remediated, 1);
    assert_eq!(report.remediated, 0);
    assert_eq!(cluster.patch_count("billing_test", "api"), 0);
}

#[tokio::test]
async fn two_cycles_patch_each_controller_once() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 3, &["api-7f8d"]);
    script_violator(&cluster, "api-7f8d");

    let scanner = scanner(&cluster);
    let first = scanner.run_cycle().await.unwrap();
    let second = scanner.run_cycle().await.unwrap();

    assert_eq!(first.remediated, 1);
    assert_eq!(second.remediated, 0);
    assert_eq!(second.already_remediated, 1);
    assert_eq!(cluster.patch_count("billing_test", "api"), 1);
}

#[tokio::test]
async fn violator_with_orphan_replica_set_is_reported_unresolved() {
    let cluster = Arc::new(FakeCluster::new());
    // Replica set exists but nothing owns it, so the chain dead-ends.
    cluster.seed_orphan_replica_set("billing_test", "legacy-rs");
    cluster.add_pod(warden_test_utils::owned_pod("billing_test", "legacy-1", "legacy-rs"));
    script_violator(&cluster, "legacy-1");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.non_compliant, 1);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.remediated, 0);
    assert_eq!(cluster.total_patch_count(), 0);
}

#[tokio::test]
async fn compliant_and_violating_workloads_in_one_namespace() {
    let cluster = Arc::new(FakeCluster::new());
    cluster.seed_workload("billing_test", "api", 2, &["api-7f8d"]);
    cluster.seed_workload("billing_test", "worker", 2, &["worker-1"]);
    script_violator(&cluster, "api-7f8d");
    script_instrumented(&cluster, "worker-1");

    let report = scanner(&cluster).run_cycle().await.unwrap();

    assert_eq!(report.pods_inspected, 2);
    assert_eq!(report.non_compliant, 1);
    assert_eq!(cluster.deployment("billing_test", "api").unwrap().replicas, Some(0));
    assert_eq!(cluster.deployment("billing_test", "worker").unwrap().replicas, Some(2));
}
