/**
 * Group membership and handshake material.
 *  Join codes, auth-hash derivation, and the
 *  well-known admin/default member groups.
 */
pub mod auth;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - Per-task content keys
 *  - Key-to-key key wrapping
 */
pub mod crypto;
/**
 * The task queue service contract.
 *  Describes the calls the client core makes
 *  against a cluster and the messages they
 *  exchange. The wire transport is left to
 *  the embedding.
 */
pub mod service;
/**
 * Task model shared between the client and
 *  the service contract. Represents a task's
 *  envelope-encrypted payload and metadata.
 */
pub mod task;
/**
 * In-memory cluster used by integration tests
 *  in place of a real errand deployment.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::auth::{LocalAuthConfig, MemberGroup, Session};
    pub use crate::crypto::{KeyShare, PublicKey, SecretKey, TaskKey};
    pub use crate::service::TaskService;
    pub use crate::task::{Task, TaskMeta, TaskStatus};
}
