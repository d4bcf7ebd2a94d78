mod auth;
mod task;

pub use auth::{AuthClientRequest, AuthClientResponse, AuthMemberRequest, AuthMemberResponse};
pub use task::{CheckTaskRequest, CheckTaskResponse, QueueResponse, TaskResult};
