//! Concurrent submission and retrieval across many tasks
//!
//! The cache is the only shared mutable state in the client; these tests
//! hammer it from many tokio tasks at once.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future;

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_submissions_get_distinct_tasks() {
    let (cluster, auth) = common::admin_cluster_with_worker(common::echo_worker());
    let client = Arc::new(common::connect(&cluster, &auth).await);

    let mut handles = Vec::with_capacity(1000);
    for i in 0..1000 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let body = format!("payload-{}", i).into_bytes();
            let task = client
                .submit_task(&body, "test.echo", None)
                .await
                .expect("submit succeeds");
            (task, body)
        }));
    }

    let submitted: Vec<_> = future::join_all(handles)
        .await
        .into_iter()
        .map(|handle| handle.expect("submission task panicked"))
        .collect();

    let distinct: HashSet<_> = submitted.iter().map(|(task, _)| *task).collect();
    assert_eq!(distinct.len(), 1000);
    assert_eq!(client.keys().len(), 1000);

    // Every task's cache entry decrypts its own result, nobody else's
    let retrievals = submitted.into_iter().map(|(task, body)| {
        let client = client.clone();
        async move {
            let result = client.task_result(task).await.expect("result decrypts");
            assert_eq!(result, body);
        }
    });
    future::join_all(retrievals).await;
}
