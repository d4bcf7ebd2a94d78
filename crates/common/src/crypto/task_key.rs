//! Per-task content encryption using ChaCha20-Poly1305
//!
//! Every submitted task gets its own `TaskKey`. The task payload is encrypted
//! under it on the way out, and the worker's result is encrypted under the same
//! key on the way back. The key itself only ever travels wrapped inside a
//! [`KeyShare`](super::KeyShare).

use std::ops::Deref;

use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of a task key in bytes (256 bits)
pub const TASK_KEY_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum TaskKeyError {
    #[error("task key error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A 256-bit symmetric content key, generated fresh per task
///
/// Encryption is ChaCha20-Poly1305 AEAD with the output framed as
/// `nonce (12 bytes) || ciphertext || tag (16 bytes)`. A random nonce is
/// generated for each encryption operation.
///
/// The handshake also uses this type for its challenge secret: the cluster
/// seals a fresh 32-byte value to the client, which proves possession of its
/// private key by recovering and signing it.
///
/// # Examples
///
/// ```ignore
/// let key = TaskKey::generate();
///
/// let ciphertext = key.encrypt(b"task payload")?;
/// let recovered = key.decrypt(&ciphertext)?;
/// assert_eq!(b"task payload", &recovered[..]);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TaskKey([u8; TASK_KEY_SIZE]);

impl Default for TaskKey {
    fn default() -> Self {
        TaskKey([0; TASK_KEY_SIZE])
    }
}

impl Deref for TaskKey {
    type Target = [u8; TASK_KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; TASK_KEY_SIZE]> for TaskKey {
    fn from(bytes: [u8; TASK_KEY_SIZE]) -> Self {
        TaskKey(bytes)
    }
}

impl TaskKey {
    /// Generate a new random task key using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; TASK_KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a task key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `TASK_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, TaskKeyError> {
        if data.len() != TASK_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid task key size, expected {}, got {}",
                TASK_KEY_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; TASK_KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// The output format is: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails (should be rare, only on system RNG
    /// failure).
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, TaskKeyError> {
        let key = Key::from_slice(self.bytes());
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// Expects input in the format: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Data is too short to contain a nonce
    /// - Authentication tag verification fails (data was tampered with or wrong key)
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, TaskKeyError> {
        if data.len() < NONCE_SIZE {
            return Err(anyhow::anyhow!("data too short for nonce").into());
        }

        let key = Key::from_slice(self.bytes());
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);
        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;

        Ok(plaintext)
    }
}
