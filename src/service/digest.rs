//! Key digests for at-rest storage.
//!
//! The reference service never keeps a submitted key; it keeps a digest
//! bound to the identity and compares digests at verification time.

use blake3::Hasher as Blake3Hasher;
use sha2::{Digest, Sha256};

/// Domain separator for stored key digests.
const KEY_DIGEST_DOMAIN: &[u8] = b"facekey-stored-key-v1";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyDigest {
    /// BLAKE3 - fast, secure, recommended default.
    #[default]
    Blake3,
    /// SHA-256 - widely deployed, conservative choice.
    Sha256,
}

impl KeyDigest {
    /// Digests `key` for `identity`.
    ///
    /// Input framing: domain, identity length (u64 LE), identity, key.
    pub fn digest(self, identity: &str, key: &[u8]) -> [u8; 32] {
        let id_len = (identity.len() as u64).to_le_bytes();
        match self {
            KeyDigest::Blake3 => {
                let mut hasher = Blake3Hasher::new();
                hasher.update(KEY_DIGEST_DOMAIN);
                hasher.update(&id_len);
                hasher.update(identity.as_bytes());
                hasher.update(key);
                *hasher.finalize().as_bytes()
            }
            KeyDigest::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(KEY_DIGEST_DOMAIN);
                hasher.update(id_len);
                hasher.update(identity.as_bytes());
                hasher.update(key);
                let result = hasher.finalize();
                let mut data = [0u8; 32];
                data.copy_from_slice(&result);
                data
            }
        }
    }
}

/// Equality over digests without an early exit.
pub(crate) fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
