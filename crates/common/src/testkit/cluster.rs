use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::auth::MemberGroup;
use crate::crypto::{KeyShare, PublicKey, SecretKey, TaskKey};
use crate::service::{
    AuthClientRequest, AuthClientResponse, AuthMemberRequest, AuthMemberResponse,
    CheckTaskRequest, CheckTaskResponse, CheckTaskStream, QueueResponse, TaskResult, TaskService,
};
use crate::task::{Task, TaskStatus};

/// A simulated worker: takes the task kind and decrypted body, returns the
/// result plaintext
pub type Worker = Box<dyn Fn(&str, &[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Cluster-side state for one queued task
struct TaskRecord {
    status: TaskStatus,
    /// The task key, recovered from the master-wrapped share at queue time
    task_key: TaskKey,
    /// The client's wrapped copy, echoed back on status checks
    client_enc_task_key: Option<KeyShare>,
    enc_result: Option<Vec<u8>>,
}

struct ClusterInner {
    master_keypair: SecretKey,
    groups: Mutex<HashMap<Uuid, MemberGroup>>,
    tasks: Mutex<HashMap<Uuid, TaskRecord>>,
    worker: Option<Worker>,
}

/// An in-memory errand cluster for integration tests
///
/// With a worker installed ([`TestCluster::with_worker`]) tasks complete as
/// soon as they are queued. Without one ([`TestCluster::new`]) tasks stay
/// pending until the test drives them with [`complete_task`](Self::complete_task)
/// or [`fail_task`](Self::fail_task).
#[derive(Clone)]
pub struct TestCluster {
    inner: Arc<ClusterInner>,
}

impl TestCluster {
    /// Create a cluster with no worker; tasks stay pending until driven
    /// manually
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a cluster that runs `worker` on every queued task
    pub fn with_worker(worker: Worker) -> Self {
        Self::build(Some(worker))
    }

    fn build(worker: Option<Worker>) -> Self {
        TestCluster {
            inner: Arc::new(ClusterInner {
                master_keypair: SecretKey::generate(),
                groups: Mutex::new(HashMap::new()),
                tasks: Mutex::new(HashMap::new()),
                worker,
            }),
        }
    }

    /// Make a group known to the cluster so its members can authenticate
    pub fn register_group(&self, group: &MemberGroup) {
        tracing::debug!(group = %group.uuid, name = %group.name, "registering group");
        self.inner.groups.lock().insert(group.uuid, group.clone());
    }

    /// The cluster's master runner public key
    pub fn master_pub_key(&self) -> PublicKey {
        self.inner.master_keypair.public()
    }

    /// The cluster's master runner keypair, for tests that assert on the
    /// master-wrapped key copy directly
    pub fn master_keypair(&self) -> SecretKey {
        self.inner.master_keypair.clone()
    }

    /// The cluster as a service handle for [`client::Client::connect`]
    pub fn service(&self) -> Arc<dyn TaskService> {
        Arc::new(self.clone())
    }

    /// Current status of a task, if it exists
    pub fn task_status(&self, uuid: &Uuid) -> Option<TaskStatus> {
        self.inner.tasks.lock().get(uuid).map(|r| r.status)
    }

    /// Complete a pending task with `result`, encrypting it under the task
    /// key the cluster recovered at queue time
    pub fn complete_task(&self, uuid: &Uuid, result: &[u8]) -> Result<()> {
        let mut tasks = self.inner.tasks.lock();
        let record = tasks.get_mut(uuid).ok_or_else(|| anyhow!("unknown task {}", uuid))?;
        record.enc_result = Some(record.task_key.encrypt(result)?);
        record.status = TaskStatus::Completed;
        tracing::debug!(task = %uuid, "task completed");
        Ok(())
    }

    /// Mark a pending task failed
    pub fn fail_task(&self, uuid: &Uuid) -> Result<()> {
        let mut tasks = self.inner.tasks.lock();
        let record = tasks.get_mut(uuid).ok_or_else(|| anyhow!("unknown task {}", uuid))?;
        record.status = TaskStatus::Failed;
        tracing::debug!(task = %uuid, "task failed");
        Ok(())
    }
}

impl Default for TestCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterInner {
    fn snapshot(&self, uuid: &Uuid) -> Result<CheckTaskResponse> {
        let tasks = self.tasks.lock();
        let record = tasks.get(uuid).ok_or_else(|| anyhow!("unknown task {}", uuid))?;
        Ok(CheckTaskResponse {
            status: record.status,
            enc_task_key: record.client_enc_task_key,
            result: record
                .enc_result
                .clone()
                .map(|enc_result| TaskResult { enc_result }),
        })
    }
}

#[async_trait]
impl TaskService for TestCluster {
    async fn auth_client(&self, _req: AuthClientRequest) -> Result<AuthClientResponse> {
        Ok(AuthClientResponse {
            master_runner_pub_key: self.master_pub_key(),
        })
    }

    async fn auth_member(&self, req: AuthMemberRequest) -> Result<AuthMemberResponse> {
        let group = self
            .inner
            .groups
            .lock()
            .get(&req.group_uuid)
            .cloned()
            .ok_or_else(|| anyhow!("unknown group {}", req.group_uuid))?;

        // The attempt signs the cluster's copy of the auth hash with the
        // timestamp nonce appended, exactly as the client constructs it.
        let mut payload = Vec::with_capacity(group.auth_hash.len() + 8);
        payload.extend_from_slice(&group.auth_hash);
        payload.extend_from_slice(&(req.timestamp as u64).to_le_bytes());

        req.pub_key
            .verify(&payload, &req.auth_hash_signature)
            .map_err(|_| anyhow!("auth hash signature rejected"))?;

        tracing::debug!(member = %req.uuid, group = %req.group_uuid, "member authenticated");

        let challenge = TaskKey::generate();
        let enc_challenge = KeyShare::seal(&challenge, &req.pub_key)?;

        Ok(AuthMemberResponse {
            enc_challenge,
            master_pub_key: self.master_pub_key(),
        })
    }

    async fn queue(&self, task: Task) -> Result<QueueResponse> {
        // The cluster must be able to recover the key on its own; a task it
        // cannot unwrap is undeliverable.
        let master_share = task
            .meta
            .master_enc_task_key
            .ok_or_else(|| anyhow!("task missing master key share"))?;
        let task_key = master_share.recover(&self.inner.master_keypair)?;

        let uuid = Uuid::new_v4();
        let mut record = TaskRecord {
            status: TaskStatus::Pending,
            task_key,
            client_enc_task_key: task.meta.client_enc_task_key,
            enc_result: None,
        };

        if let Some(worker) = &self.inner.worker {
            let body = record.task_key.decrypt(&task.enc_body)?;
            let result = worker(&task.kind, &body)?;
            record.enc_result = Some(record.task_key.encrypt(&result)?);
            record.status = TaskStatus::Completed;
        }

        tracing::debug!(task = %uuid, kind = %task.kind, status = %record.status, "task queued");
        self.inner.tasks.lock().insert(uuid, record);

        Ok(QueueResponse { uuid })
    }

    async fn check_task(&self, req: CheckTaskRequest) -> Result<CheckTaskStream> {
        let inner = self.inner.clone();
        let uuid = req.uuid;
        let stream = futures::stream::unfold(inner, move |inner| async move {
            let resp = inner.snapshot(&uuid);
            Some((resp, inner))
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::{group_auth_hash, LocalAuthConfig};

    fn signed_attempt(auth: &LocalAuthConfig) -> (SecretKey, AuthMemberRequest) {
        let keypair = SecretKey::generate();
        let timestamp = 1_700_000_000i64;

        let mut payload = Vec::new();
        payload.extend_from_slice(&auth.member_group.auth_hash);
        payload.extend_from_slice(&(timestamp as u64).to_le_bytes());

        let attempt = AuthMemberRequest {
            uuid: Uuid::new_v4(),
            group_uuid: auth.member_group.uuid,
            pub_key: keypair.public(),
            auth_hash_signature: keypair.sign(&payload),
            timestamp,
        };
        (keypair, attempt)
    }

    #[tokio::test]
    async fn test_auth_member_accepts_valid_attempt() -> Result<()> {
        let auth = LocalAuthConfig::admin_group();
        let cluster = TestCluster::new();
        cluster.register_group(&auth.member_group);

        let (keypair, attempt) = signed_attempt(&auth);
        let resp = cluster.auth_member(attempt).await?;

        // The challenge must be recoverable with the attempt's private key
        resp.enc_challenge.recover(&keypair)?;
        assert_eq!(resp.master_pub_key, cluster.master_pub_key());
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_member_rejects_wrong_secret() {
        let auth = LocalAuthConfig::admin_group();
        let cluster = TestCluster::new();
        cluster.register_group(&auth.member_group);

        // Sign with an auth hash derived from the wrong passphrase
        let mut forged = auth.clone();
        forged.member_group.auth_hash =
            group_auth_hash(&auth.member_group.join_code, "not the passphrase");
        let (_, attempt) = signed_attempt(&forged);

        assert!(cluster.auth_member(attempt).await.is_err());
    }

    #[tokio::test]
    async fn test_auth_member_rejects_unknown_group() {
        let auth = LocalAuthConfig::admin_group();
        let cluster = TestCluster::new();
        // group never registered

        let (_, attempt) = signed_attempt(&auth);
        assert!(cluster.auth_member(attempt).await.is_err());
    }

    #[tokio::test]
    async fn test_queue_requires_master_share() {
        let cluster = TestCluster::new();
        let task = Task {
            kind: "test".to_string(),
            meta: Default::default(),
            enc_body: vec![],
        };
        assert!(cluster.queue(task).await.is_err());
    }

    #[tokio::test]
    async fn test_manual_completion_flow() -> Result<()> {
        let cluster = TestCluster::new();

        let task_key = TaskKey::generate();
        let master_share = KeyShare::seal(&task_key, &cluster.master_pub_key())?;
        let task = Task {
            kind: "test".to_string(),
            meta: crate::task::TaskMeta {
                master_enc_task_key: Some(master_share),
                ..Default::default()
            },
            enc_body: task_key.encrypt(b"body")?,
        };

        let queued = cluster.queue(task).await?;
        assert_eq!(cluster.task_status(&queued.uuid), Some(TaskStatus::Pending));

        cluster.complete_task(&queued.uuid, b"done")?;
        assert_eq!(
            cluster.task_status(&queued.uuid),
            Some(TaskStatus::Completed)
        );

        // The streamed snapshot carries the encrypted result
        let mut stream = cluster
            .check_task(CheckTaskRequest { uuid: queued.uuid })
            .await?;
        let resp = stream.next().await.expect("stream yields")?;
        let enc_result = resp.result.expect("result present").enc_result;
        assert_eq!(task_key.decrypt(&enc_result)?, b"done");
        Ok(())
    }
}
