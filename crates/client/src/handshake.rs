//! Challenge-response authentication against the cluster
//!
//! The handshake proves two things without moving any secret over the wire:
//! that the member holds the group secret (by signing the group's auth hash
//! with a timestamp nonce) and that it holds the private half of the keypair
//! it presented (by recovering and signing a challenge sealed to that key).
//!
//! The flow is one bootstrap call plus one authentication round trip:
//! 1. Generate a fresh connection keypair
//! 2. Sign `auth_hash || timestamp_le` with it
//! 3. Send the attempt: member uuid, group uuid, public key, signature,
//!    timestamp
//! 4. Receive a sealed 32-byte challenge and the master runner public key
//! 5. Recover the challenge, sign it, and keep both with the session
//!
//! There is no further round trip confirming the challenge signature; the
//! session is considered established once step 5 completes. Failures abort
//! the handshake and the caller retries it whole.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use common::auth::{LocalAuthConfig, Session};
use common::crypto::{PublicKey, SecretKey};
use common::service::{AuthClientRequest, AuthMemberRequest, TaskService};

use crate::error::Error;

/// An authenticated session paired with its key material
///
/// Written once when the client connects and read-only thereafter.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session: Session,
    /// The connection keypair the handshake was signed with
    pub keypair: SecretKey,
    /// The cluster's master runner public key, as returned by the handshake
    pub master_runner_pub_key: PublicKey,
}

/// Learn the cluster's master runner public key
///
/// Runs before any group-authenticated handshake; task keys are wrapped under
/// the returned key at submission time.
pub(crate) async fn bootstrap(service: &dyn TaskService) -> Result<PublicKey, Error> {
    let resp = service
        .auth_client(AuthClientRequest::default())
        .await
        .map_err(|e| Error::transport("AuthClient", e))?;

    Ok(resp.master_runner_pub_key)
}

/// Authenticate a member against its group and establish a session
pub(crate) async fn authenticate(
    service: &dyn TaskService,
    auth: &LocalAuthConfig,
) -> Result<ActiveSession, Error> {
    let member_uuid = Uuid::new_v4();
    let keypair = SecretKey::generate();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64;

    // The signed payload is auth_hash || timestamp_le, reconstructed
    // verbatim by the cluster from its own copy of the hash
    let nonce = (timestamp as u64).to_le_bytes();
    let mut hash_with_nonce =
        Vec::with_capacity(auth.member_group.auth_hash.len() + nonce.len());
    hash_with_nonce.extend_from_slice(&auth.member_group.auth_hash);
    hash_with_nonce.extend_from_slice(&nonce);

    let auth_hash_sig = keypair.sign(&hash_with_nonce);

    let attempt = AuthMemberRequest {
        uuid: member_uuid,
        group_uuid: auth.member_group.uuid,
        pub_key: keypair.public(),
        auth_hash_signature: auth_hash_sig,
        timestamp,
    };

    tracing::debug!(member = %member_uuid, group = %attempt.group_uuid, "authenticating member");

    let resp = service
        .auth_member(attempt)
        .await
        .map_err(|e| Error::transport("AuthMember", e))?;

    let challenge = resp
        .enc_challenge
        .recover(&keypair)
        .map_err(|e| Error::crypto("recover session challenge", e))?;

    let challenge_sig = keypair.sign(challenge.bytes());

    tracing::debug!(member = %member_uuid, "session established");

    Ok(ActiveSession {
        session: Session {
            member_uuid,
            group_uuid: auth.member_group.uuid,
            challenge_sig,
        },
        keypair,
        master_runner_pub_key: resp.master_pub_key,
    })
}
