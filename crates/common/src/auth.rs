//! Group membership and handshake material
//!
//! A member group is a shared-secret namespace: every member holds the group's
//! join code and passphrase, and proves membership by signing the auth hash
//! derived from them. The hash is a one-way derivation, so the group secret
//! itself never crosses the wire in cleartext.
//!
//! Two groups are provisioned out of the box: `admin` (a generated passphrase)
//! and `default` (an empty passphrase, for runner bootstrap). Both use
//! well-known UUIDs the cluster recognizes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::crypto::Signature;

/// Well-known UUID of the admin member group
pub const ADMIN_GROUP_UUID: Uuid = Uuid::from_u128(0x5c44_a3ed_91f2_4d6e_b0aa_7d2f_08c1_93e4);
/// Well-known UUID of the default runner group
pub const DEFAULT_GROUP_UUID: Uuid = Uuid::from_u128(0x2b71_fd08_36c9_4e41_8a55_c90b_12d7_6f02);

/// Size of a derived auth hash in bytes
pub const AUTH_HASH_SIZE: usize = 32;
/// Entropy of a generated join code in bytes (hex encoded on the wire)
pub const JOIN_CODE_SIZE: usize = 16;

/// Generate a random join code
///
/// Join codes are 16 bytes of CSPRNG output, hex encoded. The same generator
/// is used for admin passphrases at provisioning time.
pub fn generate_join_code() -> String {
    let mut bytes = [0u8; JOIN_CODE_SIZE];
    getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
    hex::encode(bytes)
}

/// Derive a group's auth hash from its join code and passphrase
///
/// The derivation is deterministic: equal inputs always produce equal hashes.
/// SHA-256 over `join_code || passphrase`.
pub fn group_auth_hash(join_code: &str, passphrase: &str) -> [u8; AUTH_HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(join_code.as_bytes());
    hasher.update(passphrase.as_bytes());
    hasher.finalize().into()
}

/// A shared-secret namespace members authenticate against
///
/// Created once when a group is provisioned; immutable thereafter. The
/// cluster holds its own copy and validates member signatures against
/// `auth_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGroup {
    pub uuid: Uuid,
    pub name: String,
    pub join_code: String,
    pub auth_hash: [u8; AUTH_HASH_SIZE],
}

impl MemberGroup {
    /// Provision a new group with a generated join code
    pub fn provision(name: impl Into<String>, uuid: Uuid, passphrase: &str) -> Self {
        let join_code = generate_join_code();
        let auth_hash = group_auth_hash(&join_code, passphrase);

        MemberGroup {
            uuid,
            name: name.into(),
            join_code,
            auth_hash,
        }
    }
}

/// Locally held authentication material for one group membership
///
/// Pairs the group record with the passphrase the member knows. This is what
/// a client needs on disk (or in memory) to run the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAuthConfig {
    pub member_group: MemberGroup,
    pub passphrase: String,
}

impl LocalAuthConfig {
    /// Provision the admin group with a generated passphrase
    // TODO: allow the operator to choose the admin passphrase
    pub fn admin_group() -> Self {
        let passphrase = generate_join_code();
        let member_group = MemberGroup::provision("admin", ADMIN_GROUP_UUID, &passphrase);

        LocalAuthConfig {
            member_group,
            passphrase,
        }
    }

    /// Provision the default runner group (empty passphrase)
    pub fn default_runner_group() -> Self {
        let member_group = MemberGroup::provision("default", DEFAULT_GROUP_UUID, "");

        LocalAuthConfig {
            member_group,
            passphrase: String::new(),
        }
    }
}

/// The identity binding produced by a successful handshake
///
/// Holds the member and group identity plus the signature over the decrypted
/// session challenge. Lives for the duration of the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub member_uuid: Uuid,
    pub group_uuid: Uuid,
    pub challenge_sig: Signature,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_auth_hash_deterministic() {
        let a = group_auth_hash("join-code", "passphrase");
        let b = group_auth_hash("join-code", "passphrase");
        assert_eq!(a, b);
    }

    #[test]
    fn test_auth_hash_input_sensitivity() {
        let base = group_auth_hash("join-code", "passphrase");
        assert_ne!(base, group_auth_hash("join-code", "other"));
        assert_ne!(base, group_auth_hash("other", "passphrase"));
        assert_ne!(base, group_auth_hash("", ""));
    }

    #[test]
    fn test_provision_derives_hash_from_join_code() {
        let group = MemberGroup::provision("test", Uuid::new_v4(), "secret");
        assert_eq!(
            group.auth_hash,
            group_auth_hash(&group.join_code, "secret")
        );
    }

    #[test]
    fn test_join_codes_are_unique() {
        assert_ne!(generate_join_code(), generate_join_code());
    }

    #[test]
    fn test_wellknown_groups() {
        let admin = LocalAuthConfig::admin_group();
        assert_eq!(admin.member_group.uuid, ADMIN_GROUP_UUID);
        assert_eq!(admin.member_group.name, "admin");
        assert!(!admin.passphrase.is_empty());

        let default = LocalAuthConfig::default_runner_group();
        assert_eq!(default.member_group.uuid, DEFAULT_GROUP_UUID);
        assert!(default.passphrase.is_empty());
    }
}
