//! Password verifier
//!
//! A tiny AES-256-GCM ciphertext of a known token, sealed directly under the
//! master key and stored in vault.config. Opening it is one cheap AEAD check,
//! so a wrong password is rejected before any object is read.

use filelock_core::{VaultError, VaultResult};

use crate::cipher::{open_in_place, seal_in_place};
use crate::kdf::MasterKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Plaintext sealed inside every verifier.
pub const VERIFIER_TOKEN: &[u8] = b"VALID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verifier {
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub cipher: Vec<u8>,
}

/// Seal [`VERIFIER_TOKEN`] under the master key with a fresh nonce.
pub fn create_verifier(master: &MasterKey) -> VaultResult<Verifier> {
    let nonce: [u8; NONCE_SIZE] = crate::random_array();
    let mut cipher = VERIFIER_TOKEN.to_vec();
    let tag = seal_in_place(master.as_bytes(), &nonce, &mut cipher)?;
    Ok(Verifier { nonce, tag, cipher })
}

/// Check that `master` opens the verifier.
///
/// Fails with [`VaultError::AuthenticationFailure`] on a tag mismatch, which
/// is the wrong-password signal.
pub fn validate_verifier(master: &MasterKey, verifier: &Verifier) -> VaultResult<()> {
    let mut plain = verifier.cipher.clone();
    open_in_place(master.as_bytes(), &verifier.nonce, &verifier.tag, &mut plain)?;

    if plain != VERIFIER_TOKEN {
        return Err(VaultError::AuthenticationFailure);
    }
    Ok(())
}
