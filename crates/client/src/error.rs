use uuid::Uuid;

/// Errors surfaced by the client core
///
/// Each variant tags the kind of failure, and transport/crypto failures carry
/// the operation that failed, so callers can tell a dead connection from a
/// corrupt key share without parsing message strings. No operation retries
/// internally; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service collaborator failed to carry a call
    #[error("transport error in {op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A cryptographic operation failed
    #[error("crypto error in {op}: {source}")]
    Crypto {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Neither the task key nor the per-task keypair is available for the task
    #[error("no key material available for task {task}")]
    KeyMissing { task: Uuid },

    /// The cluster reported the task failed
    #[error("task {task} failed on the cluster")]
    TaskFailed { task: Uuid },

    /// The deadline elapsed before the task reached a terminal status
    #[error("deadline elapsed waiting for task {task}")]
    Deadline { task: Uuid },
}

impl Error {
    pub(crate) fn transport(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::Transport {
            op,
            source: source.into(),
        }
    }

    pub(crate) fn crypto(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::Crypto {
            op,
            source: source.into(),
        }
    }
}
