/// Lightweight test harness standing in for a real errand cluster
///
/// This module provides an in-process `TaskService` implementation so the
/// client core can be integration-tested end-to-end without external
/// infrastructure. The cluster validates member handshakes against registered
/// groups, recovers master-wrapped task keys, and completes tasks either
/// through a caller-supplied worker function or manual drivers.
///
/// # Example
///
/// ```rust,ignore
/// use common::auth::LocalAuthConfig;
/// use common::testkit::TestCluster;
///
/// #[tokio::test]
/// async fn test_submit() -> anyhow::Result<()> {
///     let auth = LocalAuthConfig::admin_group();
///     let cluster = TestCluster::with_worker(Box::new(|_kind, body| {
///         Ok(body.to_vec()) // echo worker
///     }));
///     cluster.register_group(&auth.member_group);
///
///     let client = client::Client::connect(cluster.service(), &auth).await?;
///     // ...
///     Ok(())
/// }
/// ```
mod cluster;

pub use cluster::{TestCluster, Worker};
