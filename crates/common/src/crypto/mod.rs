//! Cryptographic primitives for Errand
//!
//! This module provides the cryptographic foundation for the client's security model:
//!
//! - **Identity & Authentication**: Ed25519 keypairs for member and per-task identity
//! - **Content Encryption**: ChaCha20-Poly1305 task keys for payload encryption
//! - **Key Wrapping**: ECDH-based key wrapping using X25519 curve conversion
//!
//! # Security Model
//!
//! ## Identity
//! A client generates a fresh Ed25519 keypair (`SecretKey`/`PublicKey`) for each
//! connection, and another for each submitted task. The connection keypair signs
//! handshake material; the task keypair receives the client's wrapped copy of the
//! task's content key.
//!
//! ## Content Encryption
//! Every task has its own ChaCha20-Poly1305 `TaskKey`. The payload and the result
//! are both encrypted under it, so compromising one task's key exposes nothing
//! about any other task.
//!
//! ## Key Wrapping Protocol
//! To hand a `TaskKey` to a recipient (the submitting client's task keypair, or
//! the cluster's master runner keypair):
//! 1. Generate an ephemeral Ed25519 keypair
//! 2. Convert both sides' Ed25519 keys to X25519 (Montgomery curve)
//! 3. Perform ECDH to derive a shared secret
//! 4. Use AES-KW (key wrap) to encrypt the task key with the shared secret
//! 5. Package as a `KeyShare` (ephemeral_pubkey || wrapped_key)
//!
//! The recipient recovers the key by extracting the ephemeral public key,
//! performing the same ECDH with their private key, and unwrapping.

mod key_share;
mod keys;
mod task_key;

pub use ed25519_dalek::Signature;
pub use key_share::{KeyShare, KeyShareError, KEY_SHARE_SIZE};
pub use keys::{KeyError, PublicKey, SecretKey};
pub use task_key::{TaskKey, TaskKeyError, TASK_KEY_SIZE};
