//! Shared test utilities for client integration tests
#![allow(dead_code)]

use std::time::Duration;

use client::{Client, Config};
use common::auth::LocalAuthConfig;
use common::testkit::{TestCluster, Worker};

/// Initialize test logging from RUST_LOG; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A config with a short poll interval so tests don't sit in real sleeps
pub fn test_config() -> Config {
    Config {
        poll_interval: Duration::from_millis(10),
        result_deadline: None,
    }
}

/// Connect an admin-group client to the given cluster
pub async fn connect(cluster: &TestCluster, auth: &LocalAuthConfig) -> Client {
    init_tracing();
    Client::connect_with_config(cluster.service(), auth, test_config())
        .await
        .expect("client connects")
}

/// A cluster with the admin group registered and the given worker installed
pub fn admin_cluster_with_worker(worker: Worker) -> (TestCluster, LocalAuthConfig) {
    let auth = LocalAuthConfig::admin_group();
    let cluster = TestCluster::with_worker(worker);
    cluster.register_group(&auth.member_group);
    (cluster, auth)
}

/// A cluster with the admin group registered and no worker; tasks stay
/// pending until the test drives them
pub fn admin_cluster_manual() -> (TestCluster, LocalAuthConfig) {
    let auth = LocalAuthConfig::admin_group();
    let cluster = TestCluster::new();
    cluster.register_group(&auth.member_group);
    (cluster, auth)
}

/// The example addition worker: `{"First":a,"Second":b}` -> `{"Answer":a+b}`
pub fn addition_worker() -> Worker {
    Box::new(|kind, body| {
        anyhow::ensure!(kind == "com.taask.dummy", "unexpected task kind {}", kind);

        let v: serde_json::Value = serde_json::from_slice(body)?;
        let first = v["First"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing First"))?;
        let second = v["Second"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing Second"))?;

        Ok(serde_json::to_vec(
            &serde_json::json!({ "Answer": first + second }),
        )?)
    })
}

/// A worker that returns the decrypted body unchanged
pub fn echo_worker() -> Worker {
    Box::new(|_kind, body| Ok(body.to_vec()))
}
