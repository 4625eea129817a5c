//! filelock-crypto: cryptographic building blocks of a filelock vault
//!
//! Key hierarchy:
//! ```text
//! Password + vault salt (32B)
//!   └── Master Key (256-bit, PBKDF2-HMAC-SHA256, 600k iterations by default)
//!         ├── Verifier: AES-256-GCM("VALID") under the master key
//!         └── Object Key (per object, HKDF-SHA256, salt = object id)
//!               └── Object AEAD: AES-256-GCM (key=object_key, nonce=random_96bit)
//! ```
//!
//! Object format (binary):
//! ```text
//! [16 bytes: object id][12 bytes: nonce][16 bytes: GCM tag][N bytes: ciphertext]
//! payload = path_len (4 bytes, little-endian) || path (UTF-8) || file content
//! ```

mod cipher;
pub mod kdf;
pub mod keys;
pub mod object;
pub mod verifier;

pub use kdf::{derive_master_key, generate_salt, KdfParams, MasterKey};
pub use keys::{derive_object_key, generate_object_id, ObjectKey};
pub use object::{
    decode_object, encode_object, object_file_name, parse_object_file_name, DecodedObject,
    EncodedObject, OBJECT_EXTENSION,
};
pub use verifier::{create_verifier, validate_verifier, Verifier, VERIFIER_TOKEN};

/// Size of a master or object key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the per-vault PBKDF2 salt
pub const SALT_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of an AES-GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a random object identifier (128-bit)
pub const OBJECT_ID_SIZE: usize = 16;

/// Fixed object header: id || nonce || tag
pub const HEADER_SIZE: usize = OBJECT_ID_SIZE + NONCE_SIZE + TAG_SIZE;

/// Fill a fixed-size array from the operating system CSPRNG.
pub(crate) fn random_array<const N: usize>() -> [u8; N] {
    use rand::RngCore;

    let mut bytes = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}
