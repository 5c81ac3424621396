//! Salted password credentials
//!
//! PBKDF2-HMAC-SHA256 with a per-user random salt. The stored form is
//! `derived_key || salt`, hex encoded for the write-through user map.
//! Verification re-derives with the stored salt and compares the keys in
//! constant time.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{Result, WardenError};

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the random salt in bytes
pub const SALT_LEN: usize = 32;

/// A salted password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCredential {
    /// `KEY_LEN` bytes of derived key followed by `SALT_LEN` bytes of salt
    key_and_salt: Vec<u8>,
}

impl PasswordCredential {
    /// Derive a credential from a cleartext password with a fresh salt.
    pub fn derive(password: &str, iterations: u32) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

        let mut key_and_salt = Vec::with_capacity(KEY_LEN + SALT_LEN);
        key_and_salt.extend_from_slice(&key);
        key_and_salt.extend_from_slice(&salt);

        Self { key_and_salt }
    }

    /// Verify a cleartext password against this credential.
    ///
    /// Re-derives with the stored salt; the comparison is constant time so
    /// verification cost does not depend on where the keys diverge.
    pub fn verify(&self, password: &str, iterations: u32) -> bool {
        let stored_key = &self.key_and_salt[..KEY_LEN];
        let salt = &self.key_and_salt[KEY_LEN..];

        let mut candidate = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut candidate);

        constant_time_eq(stored_key, &candidate)
    }

    /// Hex encoding of `key || salt` for persistence.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.key_and_salt)
    }

    /// Decode a credential from its persisted hex form.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let key_and_salt = hex::decode(encoded)
            .map_err(|e| WardenError::Serialization(format!("bad credential hex: {e}")))?;
        if key_and_salt.len() != KEY_LEN + SALT_LEN {
            return Err(WardenError::Serialization(format!(
                "bad credential length: {} bytes",
                key_and_salt.len()
            )));
        }
        Ok(Self { key_and_salt })
    }
}

/// Compare two equal-length byte slices without early exit.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
