//! Integration tests for result retrieval: polling, key recovery, and the
//! terminal failure paths

mod common;

use std::time::Duration;

use client::Error;

#[tokio::test]
async fn test_result_waits_out_pending_status() {
    let (cluster, auth) = common::admin_cluster_manual();
    let client = common::connect(&cluster, &auth).await;

    let task = client
        .submit_task(b"payload", "test.manual", None)
        .await
        .unwrap();

    // Complete the task while the client is already polling
    let driver = cluster.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.complete_task(&task, b"late result").unwrap();
    });

    let result = client.task_result(task).await.expect("result arrives");
    assert_eq!(result, b"late result");
}

#[tokio::test]
async fn test_recovers_task_key_from_server_share() {
    let (cluster, auth) = common::admin_cluster_with_worker(common::echo_worker());
    let client = common::connect(&cluster, &auth).await;

    let task = client.submit_task(b"payload", "test.echo", None).await.unwrap();

    // Lose the cached content key; the per-task keypair survives, so the
    // server-supplied wrapped copy is enough
    client.keys().forget_task_key(&task).unwrap();
    assert!(client.keys().task_key(&task).is_none());

    let result = client.task_result(task).await.expect("fallback decrypts");
    assert_eq!(result, b"payload");

    // The recovered key was written back for later polls
    assert!(client.keys().task_key(&task).is_some());
}

#[tokio::test]
async fn test_missing_key_material_fails() {
    let (cluster, auth) = common::admin_cluster_with_worker(common::echo_worker());
    let client = common::connect(&cluster, &auth).await;

    let task = client.submit_task(b"payload", "test.echo", None).await.unwrap();
    client.keys().forget(&task);

    let err = client
        .task_result(task)
        .await
        .expect_err("no key material left");

    assert!(matches!(err, Error::KeyMissing { task: t } if t == task));
}

#[tokio::test]
async fn test_failed_task_surfaces_error() {
    let (cluster, auth) = common::admin_cluster_manual();
    let client = common::connect(&cluster, &auth).await;

    let task = client
        .submit_task(b"payload", "test.manual", None)
        .await
        .unwrap();
    cluster.fail_task(&task).unwrap();

    let err = client.task_result(task).await.expect_err("task failed");
    assert!(matches!(err, Error::TaskFailed { task: t } if t == task));
}

#[tokio::test]
async fn test_deadline_bounds_retrieval() {
    let (cluster, auth) = common::admin_cluster_manual();
    let client = common::connect(&cluster, &auth).await;

    // Never completed
    let task = client
        .submit_task(b"payload", "test.manual", None)
        .await
        .unwrap();

    let err = client
        .task_result_with_deadline(task, Duration::from_millis(50))
        .await
        .expect_err("deadline elapses");

    assert!(matches!(err, Error::Deadline { task: t } if t == task));
}

#[tokio::test]
async fn test_unknown_task_is_a_transport_error() {
    let (cluster, auth) = common::admin_cluster_manual();
    let client = common::connect(&cluster, &auth).await;

    let err = client
        .task_result(uuid::Uuid::new_v4())
        .await
        .expect_err("cluster has no such task");

    assert!(matches!(err, Error::Transport { .. }));
}
