//! The task queue service contract
//!
//! The four calls the client core makes against a cluster. How they travel —
//! gRPC, QUIC streams, an in-process queue — is the embedding's choice; the
//! client only holds a `dyn TaskService`. Transport failures surface as
//! `anyhow::Error` and are tagged by the client as transport errors with the
//! failing operation attached.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::task::Task;

pub mod messages;

pub use messages::{
    AuthClientRequest, AuthClientResponse, AuthMemberRequest, AuthMemberResponse,
    CheckTaskRequest, CheckTaskResponse, QueueResponse, TaskResult,
};

/// Stream of task status observations returned by [`TaskService::check_task`]
///
/// Implementations may push updates or let the consumer pace the polling; the
/// client sleeps between items either way.
pub type CheckTaskStream = BoxStream<'static, anyhow::Result<CheckTaskResponse>>;

/// The calls the client core makes against a task-execution cluster
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Learn the cluster's master runner public key before any
    /// group-authenticated handshake
    async fn auth_client(&self, req: AuthClientRequest) -> anyhow::Result<AuthClientResponse>;

    /// Authenticate a member against its group's shared secret
    async fn auth_member(&self, req: AuthMemberRequest) -> anyhow::Result<AuthMemberResponse>;

    /// Submit an encrypted task, receiving its server-assigned identifier
    async fn queue(&self, task: Task) -> anyhow::Result<QueueResponse>;

    /// Observe a task's status until it reaches a terminal state
    async fn check_task(&self, req: CheckTaskRequest) -> anyhow::Result<CheckTaskStream>;
}
