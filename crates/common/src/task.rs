//! Task model shared between the client and the service contract

use serde::{Deserialize, Serialize};

use crate::crypto::KeyShare;

/// Lifecycle state of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Queued or running; not yet terminal
    Pending,
    /// A worker finished and the encrypted result is available
    Completed,
    /// The cluster gave up on the task
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Task metadata travelling alongside the encrypted payload
///
/// The two key shares are the envelope: the same task key wrapped once for the
/// submitting client's per-task keypair and once for the cluster's master
/// runner keypair, so either party can recover it independently. Callers may
/// supply a `TaskMeta` to set `timeout_seconds`; the client fills in the
/// shares at submission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskMeta {
    /// Server-side expiry for the task; 0 means the cluster default
    pub timeout_seconds: u64,
    /// The task key wrapped for the submitting client's per-task keypair
    pub client_enc_task_key: Option<KeyShare>,
    /// The task key wrapped for the cluster's master runner keypair
    pub master_enc_task_key: Option<KeyShare>,
}

/// An envelope-encrypted task bound for the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Application-level task kind, e.g. "com.taask.dummy". Opaque to the
    /// client core; routes the task to a worker that understands the body.
    pub kind: String,
    pub meta: TaskMeta,
    /// The payload encrypted under the task key
    pub enc_body: Vec<u8>,
}
