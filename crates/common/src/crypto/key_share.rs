//! Key wrapping using ECDH + AES Key Wrap
//!
//! A task's content key has to reach two independent parties: the submitting
//! client (so it can decrypt the result later) and the cluster's master runner
//! (so a worker can decrypt the payload). Each copy is a `KeyShare` sealed to
//! that party's public key; the key itself never crosses the wire in cleartext.
//!
//! # Protocol Overview
//!
//! To wrap a key for a recipient:
//! 1. **Generate ephemeral keypair**: Create a temporary Ed25519 keypair
//! 2. **Perform ECDH**: Convert keys to X25519 and compute a shared secret
//! 3. **Wrap key**: Use AES-KW (RFC 3394) to encrypt the task key with the
//!    shared secret
//! 4. **Package**: Concatenate the ephemeral public key and the wrapped key
//!
//! The recipient recovers the key by:
//! 1. **Extract ephemeral key**: Read the ephemeral public key from the share
//! 2. **Perform ECDH**: Use their private key to compute the same shared secret
//! 3. **Unwrap key**: Use AES-KW to decrypt the task key
//!
//! # Security Properties
//!
//! - **Forward Secrecy**: Ephemeral keys are not stored, so past wraps cannot
//!   be recomputed
//! - **Authentication**: The recipient's public key must be known in advance
//! - **Integrity**: AES-KW authenticates the wrapped key

use std::convert::TryFrom;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::task_key::{TaskKey, TaskKeyError, TASK_KEY_SIZE};

/// Size of AES Key Wrap padding in bytes
pub const KW_PAD_SIZE: usize = 8;
/// Total size of a KeyShare in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_key (40) = 72 bytes
/// Note: AES-KW adds 8 bytes of padding to the 32-byte key, resulting in 40 bytes
pub const KEY_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + TASK_KEY_SIZE + KW_PAD_SIZE;

/// Errors that can occur during share creation or recovery
#[derive(Debug, thiserror::Error)]
pub enum KeyShareError {
    #[error("key share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("task key error: {0}")]
    TaskKey(#[from] TaskKeyError),
}

/// A task key wrapped for a specific recipient
///
/// A `KeyShare` contains an ephemeral public key and an AES-KW wrapped task
/// key. Only the intended recipient (whose public key was used when sealing)
/// can recover the key.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_key: 40 bytes ]
/// ```
///
/// # Examples
///
/// ```ignore
/// // Wrap a task key for the master runner
/// let task_key = TaskKey::generate();
/// let share = KeyShare::seal(&task_key, &master_pub_key)?;
///
/// // The master runner recovers it with its private key
/// let recovered = share.recover(&master_secret_key)?;
/// assert_eq!(task_key, recovered);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct KeyShare(pub(crate) [u8; KEY_SHARE_SIZE]);

impl Serialize for KeyShare {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for KeyShare {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct ShareVisitor;

        impl<'de> Visitor<'de> for ShareVisitor {
            type Value = KeyShare;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte array or sequence of KEY_SHARE_SIZE")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                if v.len() != KEY_SHARE_SIZE {
                    return Err(E::invalid_length(
                        v.len(),
                        &format!("expected {} bytes", KEY_SHARE_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; KEY_SHARE_SIZE];
                array.copy_from_slice(v);
                Ok(KeyShare(array))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                if bytes.len() != KEY_SHARE_SIZE {
                    return Err(A::Error::invalid_length(
                        bytes.len(),
                        &format!("expected {} bytes", KEY_SHARE_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; KEY_SHARE_SIZE];
                array.copy_from_slice(&bytes);
                Ok(KeyShare(array))
            }
        }

        // Try bytes first (for bincode), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(ShareVisitor)
    }
}

impl Default for KeyShare {
    fn default() -> Self {
        KeyShare([0; KEY_SHARE_SIZE])
    }
}

impl From<[u8; KEY_SHARE_SIZE]> for KeyShare {
    fn from(bytes: [u8; KEY_SHARE_SIZE]) -> Self {
        KeyShare(bytes)
    }
}

impl From<KeyShare> for [u8; KEY_SHARE_SIZE] {
    fn from(share: KeyShare) -> Self {
        share.0
    }
}

impl TryFrom<&[u8]> for KeyShare {
    type Error = KeyShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != KEY_SHARE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid share size, expected {}, got {}",
                KEY_SHARE_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut share = KeyShare::default();
        share.0.copy_from_slice(bytes);
        Ok(share)
    }
}

impl KeyShare {
    /// Parse a share from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyShareError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; KEY_SHARE_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(KeyShare::from(buff))
    }

    /// Convert share to hexadecimal string
    #[allow(clippy::wrong_self_convention)]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Seal a task key for a specific recipient
    ///
    /// 1. Generates an ephemeral Ed25519 keypair
    /// 2. Converts both keys to X25519 for ECDH
    /// 3. Performs ECDH to derive a shared secret
    /// 4. Uses AES-KW to wrap the task key with the shared secret
    /// 5. Returns a share containing [ephemeral_pubkey || wrapped_key]
    ///
    /// # Arguments
    ///
    /// * `key` - The task key to wrap
    /// * `recipient` - The public key of the intended recipient
    ///
    /// # Errors
    ///
    /// Returns an error if key conversion or wrapping fails.
    pub fn seal(key: &TaskKey, recipient: &PublicKey) -> Result<Self, KeyShareError> {
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        // Convert both keys to X25519 for ECDH
        let ephemeral_x25519_private = ephemeral_private.to_x25519();
        let recipient_x25519_public = recipient.to_x25519()?;

        let shared_secret = ephemeral_x25519_private.diffie_hellman(&recipient_x25519_public);

        // Use the shared secret as KEK for AES-KW
        let mut shared_secret_bytes = [0; TASK_KEY_SIZE];
        shared_secret_bytes.copy_from_slice(shared_secret.as_bytes());
        let kek = Kek::from(shared_secret_bytes);
        let wrapped = kek
            .wrap_vec(key.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        // Build share: ephemeral_public_key || wrapped_key
        let mut share = KeyShare::default();
        let ephemeral_bytes = ephemeral_public.to_bytes();

        // sanity check we're producing `KEY_SHARE_SIZE` bytes here
        if ephemeral_bytes.len() + wrapped.len() != KEY_SHARE_SIZE {
            return Err(anyhow::anyhow!("expected share size is incorrect").into());
        };

        share.0[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_bytes);
        share.0[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + wrapped.len()].copy_from_slice(&wrapped);

        Ok(share)
    }

    /// Recover the wrapped task key using the recipient's private key
    ///
    /// This reverses the sealing process:
    /// 1. Extracts the ephemeral public key from the share
    /// 2. Converts keys to X25519 for ECDH
    /// 3. Performs ECDH to derive the same shared secret
    /// 4. Uses AES-KW to unwrap the task key
    ///
    /// # Arguments
    ///
    /// * `recipient_secret` - The recipient's private key (must match the
    ///   public key used in `seal`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Key conversion fails
    /// - AES-KW unwrapping fails (wrong key or corrupted data)
    /// - The unwrapped key has an incorrect size
    ///
    /// # Security Note
    ///
    /// If this function returns an error, it means either the share was sealed
    /// for a different recipient, the data was corrupted, or an attacker
    /// tampered with it.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<TaskKey, KeyShareError> {
        let ephemeral_public_bytes = &self.0[..PUBLIC_KEY_SIZE];
        let ephemeral_public = PublicKey::try_from(ephemeral_public_bytes)?;

        // Convert keys to X25519 for ECDH
        let recipient_x25519_private = recipient_secret.to_x25519();
        let ephemeral_x25519_public = ephemeral_public.to_x25519()?;

        let shared_secret = recipient_x25519_private.diffie_hellman(&ephemeral_x25519_public);

        // Use the shared secret as KEK for AES-KW unwrapping
        let shared_secret_bytes = *shared_secret.as_bytes();
        let kek = Kek::from(shared_secret_bytes);
        let wrapped_data = &self.0[PUBLIC_KEY_SIZE..];

        let unwrapped = kek
            .unwrap_vec(wrapped_data)
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        if unwrapped.len() != TASK_KEY_SIZE {
            return Err(anyhow::anyhow!("unwrapped key has wrong size").into());
        }

        let mut key_bytes = [0; TASK_KEY_SIZE];
        key_bytes.copy_from_slice(&unwrapped);
        Ok(TaskKey::from(key_bytes))
    }

    /// Get a reference to the raw share bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
