//! Key hierarchy: master key → per-object keys

use filelock_core::{VaultError, VaultResult};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::kdf::MasterKey;
use crate::{KEY_SIZE, OBJECT_ID_SIZE};

/// A per-object 256-bit encryption key. Zeroized on drop.
pub struct ObjectKey {
    bytes: [u8; KEY_SIZE],
}

impl ObjectKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ObjectKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 128-bit object identifier.
pub fn generate_object_id() -> [u8; OBJECT_ID_SIZE] {
    crate::random_array()
}

/// Derive the key for one object from the master key via HKDF-SHA256.
///
/// The object id is the HKDF salt and the info string is empty, so every
/// object gets an independent key even though GCM nonces are only 96 bits.
pub fn derive_object_key(
    master: &MasterKey,
    object_id: &[u8; OBJECT_ID_SIZE],
) -> VaultResult<ObjectKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(object_id), master.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(&[], &mut okm)
        .map_err(|e| VaultError::Crypto(format!("HKDF expand failed: {e}")))?;
    Ok(ObjectKey { bytes: okm })
}
