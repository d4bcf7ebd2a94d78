/**
 * Per-task key material cache.
 *  Owned by the client instance; maps task
 *  identifiers to the keypair and content key
 *  recorded at submission.
 */
pub mod cache;
/**
 * The client itself: connect, submit tasks
 *  under envelope encryption, retrieve and
 *  decrypt results.
 */
pub mod client;
/**
 * Client tunables: poll cadence and the
 *  optional retrieval deadline.
 */
pub mod config;
/**
 * Tagged error kinds for everything the
 *  client core can fail at.
 */
pub mod error;
/**
 * Challenge-response authentication against
 *  the cluster, producing an active session.
 */
pub mod handshake;

pub use client::Client;
pub use config::Config;
pub use error::Error;

pub mod prelude {
    pub use crate::cache::KeyCache;
    pub use crate::handshake::ActiveSession;
    pub use crate::{Client, Config, Error};
}
