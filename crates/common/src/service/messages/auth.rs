use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{KeyShare, PublicKey, Signature};

/// Bootstrap request to learn the cluster's master runner public key
///
/// Carries no fields today; kept as a struct so the contract can grow
/// without breaking the call signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthClientRequest {}

/// Response to a bootstrap request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClientResponse {
    pub master_runner_pub_key: PublicKey,
}

/// A group/member authentication attempt
///
/// The signature covers `auth_hash || timestamp_le_bytes`, proving possession
/// of the group secret without sending it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMemberRequest {
    /// Fresh member identifier for this session
    pub uuid: Uuid,
    pub group_uuid: Uuid,
    /// The member's connection public key
    pub pub_key: PublicKey,
    pub auth_hash_signature: Signature,
    /// Unix timestamp used as the signature nonce
    pub timestamp: i64,
}

/// Response to a member authentication attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMemberResponse {
    /// A 32-byte challenge secret sealed to the member's public key
    pub enc_challenge: KeyShare,
    pub master_pub_key: PublicKey,
}
