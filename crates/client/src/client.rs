use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use uuid::Uuid;

use common::auth::LocalAuthConfig;
use common::crypto::{KeyShare, PublicKey, SecretKey, TaskKey};
use common::service::{CheckTaskRequest, CheckTaskResponse, TaskService};
use common::task::{Task, TaskMeta, TaskStatus};

use crate::cache::KeyCache;
use crate::config::Config;
use crate::error::Error;
use crate::handshake::{self, ActiveSession};

/// A client connection to an errand cluster
///
/// Connecting runs the bootstrap call and the member handshake, so a `Client`
/// in hand is always authenticated. Submission and retrieval may then be
/// invoked concurrently from as many tasks as the embedding likes; the only
/// shared mutable state is the key cache, and session state is immutable
/// after connect.
///
/// # Example
///
/// ```ignore
/// let auth = LocalAuthConfig::admin_group();
/// let client = Client::connect(service, &auth).await?;
///
/// let task = client.submit_task(payload, "com.taask.dummy", None).await?;
/// let result = client.task_result(task).await?;
/// ```
pub struct Client {
    service: Arc<dyn TaskService>,
    config: Config,
    /// Master key learned from the bootstrap call; every task key is wrapped
    /// under it at submission
    master_runner_pub_key: PublicKey,
    session: ActiveSession,
    keys: KeyCache,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("master_runner_pub_key", &self.master_runner_pub_key)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connect with default [`Config`]
    pub async fn connect(
        service: Arc<dyn TaskService>,
        auth: &LocalAuthConfig,
    ) -> Result<Self, Error> {
        Self::connect_with_config(service, auth, Config::default()).await
    }

    /// Connect, authenticate, and return a ready client
    ///
    /// # Errors
    ///
    /// Returns an error if the bootstrap call or any handshake step fails;
    /// there is no partial client state to clean up, so the caller may simply
    /// call `connect` again.
    pub async fn connect_with_config(
        service: Arc<dyn TaskService>,
        auth: &LocalAuthConfig,
        config: Config,
    ) -> Result<Self, Error> {
        let master_runner_pub_key = handshake::bootstrap(service.as_ref()).await?;
        let session = handshake::authenticate(service.as_ref(), auth).await?;

        tracing::info!(
            member = %session.session.member_uuid,
            group = %session.session.group_uuid,
            "client connected"
        );

        Ok(Client {
            service,
            config,
            master_runner_pub_key,
            session,
            keys: KeyCache::default(),
        })
    }

    /// The authenticated session this client holds
    pub fn session(&self) -> &ActiveSession {
        &self.session
    }

    /// The per-task key cache
    ///
    /// Exposed so embeddings can evict entries for tasks they no longer care
    /// about.
    pub fn keys(&self) -> &KeyCache {
        &self.keys
    }

    /// Submit a task under envelope encryption
    ///
    /// Generates a fresh per-task keypair and content key, wraps the content
    /// key once for the keypair and once for the master runner, encrypts the
    /// payload, and queues the task. The key material is recorded in the
    /// cache under the returned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation, wrapping, encryption, or the queue
    /// call fails; nothing is retried and no cache entry is left behind.
    pub async fn submit_task(
        &self,
        body: &[u8],
        kind: &str,
        meta: Option<TaskMeta>,
    ) -> Result<Uuid, Error> {
        let task_keypair = SecretKey::generate();
        let task_key = TaskKey::generate();

        let client_enc_task_key = KeyShare::seal(&task_key, &task_keypair.public())
            .map_err(|e| Error::crypto("seal client task key", e))?;
        let master_enc_task_key = KeyShare::seal(&task_key, &self.master_runner_pub_key)
            .map_err(|e| Error::crypto("seal master task key", e))?;

        let enc_body = task_key
            .encrypt(body)
            .map_err(|e| Error::crypto("encrypt task body", e))?;

        let mut meta = meta.unwrap_or_default();
        meta.client_enc_task_key = Some(client_enc_task_key);
        meta.master_enc_task_key = Some(master_enc_task_key);

        let task = Task {
            kind: kind.to_string(),
            meta,
            enc_body,
        };

        let resp = self
            .service
            .queue(task)
            .await
            .map_err(|e| Error::transport("Queue", e))?;

        self.keys.record(resp.uuid, task_keypair, task_key);

        tracing::debug!(task = %resp.uuid, kind = %kind, "task submitted");

        Ok(resp.uuid)
    }

    /// Block until the task reaches a terminal status and return the
    /// decrypted result
    ///
    /// Polls the task's status stream, sleeping
    /// [`Config::poll_interval`](crate::Config) between observations. With no
    /// [`Config::result_deadline`](crate::Config) configured the loop polls
    /// indefinitely; dropping the returned future cancels it.
    pub async fn task_result(&self, task: Uuid) -> Result<Vec<u8>, Error> {
        match self.config.result_deadline {
            Some(deadline) => self.task_result_with_deadline(task, deadline).await,
            None => self.poll_result(task).await,
        }
    }

    /// Like [`task_result`](Self::task_result), but gives up with
    /// [`Error::Deadline`] once `deadline` elapses
    pub async fn task_result_with_deadline(
        &self,
        task: Uuid,
        deadline: Duration,
    ) -> Result<Vec<u8>, Error> {
        tokio::time::timeout(deadline, self.poll_result(task))
            .await
            .map_err(|_| Error::Deadline { task })?
    }

    async fn poll_result(&self, task: Uuid) -> Result<Vec<u8>, Error> {
        let mut stream = self
            .service
            .check_task(CheckTaskRequest { uuid: task })
            .await
            .map_err(|e| Error::transport("CheckTask", e))?;

        loop {
            let resp = match stream.next().await {
                Some(Ok(resp)) => resp,
                Some(Err(e)) => return Err(Error::transport("CheckTask recv", e)),
                None => {
                    return Err(Error::transport(
                        "CheckTask recv",
                        anyhow::anyhow!("status stream ended before a terminal status"),
                    ))
                }
            };

            tracing::debug!(task = %task, status = %resp.status, "task status");

            match resp.status {
                TaskStatus::Completed => return self.decrypt_result(task, &resp),
                TaskStatus::Failed => return Err(Error::TaskFailed { task }),
                TaskStatus::Pending => tokio::time::sleep(self.config.poll_interval).await,
            }
        }
    }

    /// Decrypt a completed task's result
    ///
    /// Prefers the cached task key; a task submitted by another session can
    /// still be read by recovering the key from the server-supplied wrapped
    /// copy with the cached per-task keypair. A recovered key is written back
    /// to the cache so repeated polls skip the unwrap.
    fn decrypt_result(&self, task: Uuid, resp: &CheckTaskResponse) -> Result<Vec<u8>, Error> {
        let task_key = match self.keys.task_key(&task) {
            Some(key) => key,
            None => {
                let keypair = self
                    .keys
                    .task_keypair(&task)
                    .ok_or(Error::KeyMissing { task })?;
                let share = resp.enc_task_key.ok_or(Error::KeyMissing { task })?;
                let key = share
                    .recover(&keypair)
                    .map_err(|e| Error::crypto("recover task key", e))?;
                self.keys.store_task_key(task, key.clone());
                key
            }
        };

        let result = resp.result.as_ref().ok_or_else(|| {
            Error::transport(
                "CheckTask recv",
                anyhow::anyhow!("completed task carried no result"),
            )
        })?;

        let plaintext = task_key
            .decrypt(&result.enc_result)
            .map_err(|e| Error::crypto("decrypt task result", e))?;

        Ok(plaintext)
    }
}
