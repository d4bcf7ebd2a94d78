use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::KeyShare;
use crate::task::TaskStatus;

/// Response to queueing a task: the server-assigned identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub uuid: Uuid,
}

/// Request to observe a task's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTaskRequest {
    pub uuid: Uuid,
}

/// A worker's encrypted output for a completed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// The result encrypted under the task key
    pub enc_result: Vec<u8>,
}

/// One observation of a task's state
///
/// `enc_task_key` is the client's wrapped copy of the task key, echoed back so
/// a client that lost its cached key (but kept the per-task keypair) can still
/// recover it. `result` is present once the status is [`TaskStatus::Completed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTaskResponse {
    pub status: TaskStatus,
    pub enc_task_key: Option<KeyShare>,
    pub result: Option<TaskResult>,
}
