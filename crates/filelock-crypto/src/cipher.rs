//! Detached AES-256-GCM sealing shared by the verifier and object codec.
//!
//! The tag is kept apart from the ciphertext because both on-disk formats
//! store it in its own field ahead of the ciphertext.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use filelock_core::{VaultError, VaultResult};

use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Encrypt `buffer` in place and return the authentication tag.
pub(crate) fn seal_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    buffer: &mut [u8],
) -> VaultResult<[u8; TAG_SIZE]> {
    let cipher = Aes256Gcm::new(key.into());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer)
        .map_err(|e| VaultError::Crypto(format!("AES-GCM encryption failed: {e}")))?;

    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Decrypt `buffer` in place after checking `tag`.
///
/// On failure the buffer contents are unspecified and must be discarded.
pub(crate) fn open_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    tag: &[u8; TAG_SIZE],
    buffer: &mut [u8],
) -> VaultResult<()> {
    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer, Tag::from_slice(tag))
        .map_err(|_| VaultError::AuthenticationFailure)
}
