//! Password hashing seam.
//!
//! The work-order core treats password cryptography as an external
//! collaborator, so hashing sits behind a trait. The default implementation
//! is a salted BLAKE3 digest, enough to keep the workspace self-contained;
//! a deployment swaps in a hardened KDF at this seam without touching the
//! registries.

use rand::RngCore;

/// Hashes and verifies user passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted BLAKE3 password hasher. Stored form is `hex(salt)$hex(digest)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3PasswordHasher;

impl Blake3PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &[u8], password: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize()
    }
}

impl PasswordHasher for Blake3PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest(&salt, password);
        format!("{}${}", hex::encode(salt), digest.to_hex())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        Self::digest(&salt, password).to_hex().as_str() == digest_hex
    }
}
