//! Key derivation: PBKDF2-HMAC-SHA256 password → master key

use filelock_core::config::DEFAULT_PBKDF2_ITERATIONS;
use filelock_core::{VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit master key derived from a password via PBKDF2.
///
/// Never persisted. Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters for the master key KDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// HMAC-SHA256 iterations (default: 600000)
    pub pbkdf2_iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Generate a fresh random vault salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    crate::random_array()
}

/// Derive a 256-bit master key from a password and vault salt.
///
/// Deliberately slow: with default params this takes hundreds of
/// milliseconds. Async callers should run it on a blocking thread.
pub fn derive_master_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> VaultResult<MasterKey> {
    if params.pbkdf2_iterations == 0 {
        return Err(VaultError::InvalidConfig(
            "PBKDF2 iteration count must be at least 1".into(),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        salt,
        params.pbkdf2_iterations,
        &mut key,
    );

    Ok(MasterKey::from_bytes(key))
}
