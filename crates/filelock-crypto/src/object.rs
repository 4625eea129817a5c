//! Object codec: one source file ⇄ one authenticated, obfuscated object
//!
//! The relative path travels inside the encrypted payload; the only token
//! visible on disk is the random object id, used as the file name.

use filelock_core::{VaultError, VaultResult};
use tracing::trace;
use zeroize::Zeroize;

use crate::cipher::{open_in_place, seal_in_place};
use crate::kdf::MasterKey;
use crate::keys::{derive_object_key, generate_object_id};
use crate::{HEADER_SIZE, NONCE_SIZE, OBJECT_ID_SIZE, TAG_SIZE};

/// File extension of object files in a vault.
pub const OBJECT_EXTENSION: &str = "enc";

const PATH_LEN_SIZE: usize = 4;

const NONCE_OFFSET: usize = OBJECT_ID_SIZE;
const TAG_OFFSET: usize = NONCE_OFFSET + NONCE_SIZE;

/// An encoded object, ready to be written as `<hex id>.enc`.
#[derive(Debug, Clone)]
pub struct EncodedObject {
    pub id: [u8; OBJECT_ID_SIZE],
    pub bytes: Vec<u8>,
}

impl EncodedObject {
    pub fn file_name(&self) -> String {
        object_file_name(&self.id)
    }
}

/// A decoded object: the original relative path (`/`-separated) and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedObject {
    pub relative_path: String,
    pub content: Vec<u8>,
}

/// `<32 lowercase hex chars>.enc`
pub fn object_file_name(id: &[u8; OBJECT_ID_SIZE]) -> String {
    format!("{}.{OBJECT_EXTENSION}", hex::encode(id))
}

/// Inverse of [`object_file_name`]. Returns `None` for anything that is not
/// exactly a lowercase-hex object name.
pub fn parse_object_file_name(name: &str) -> Option<[u8; OBJECT_ID_SIZE]> {
    let stem = name.strip_suffix(OBJECT_EXTENSION)?.strip_suffix('.')?;
    if stem.len() != OBJECT_ID_SIZE * 2 || stem.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let mut id = [0u8; OBJECT_ID_SIZE];
    hex::decode_to_slice(stem, &mut id).ok()?;
    Some(id)
}

/// Encrypt one file into an object.
///
/// Returns: `[16-byte id][12-byte nonce][16-byte tag][ciphertext]`
pub fn encode_object(
    relative_path: &str,
    content: &[u8],
    master: &MasterKey,
) -> VaultResult<EncodedObject> {
    let path_bytes = relative_path.as_bytes();
    let path_len = u32::try_from(path_bytes.len())
        .map_err(|_| VaultError::InvalidPath(format!("path too long: {} bytes", path_bytes.len())))?;

    let id = generate_object_id();
    let nonce: [u8; NONCE_SIZE] = crate::random_array();
    let key = derive_object_key(master, &id)?;

    // Lay out header and payload in one buffer, then encrypt the payload in place.
    let payload_len = PATH_LEN_SIZE + path_bytes.len() + content.len();
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload_len);
    bytes.extend_from_slice(&id);
    bytes.extend_from_slice(&nonce);
    bytes.extend_from_slice(&[0u8; TAG_SIZE]);
    bytes.extend_from_slice(&path_len.to_le_bytes());
    bytes.extend_from_slice(path_bytes);
    bytes.extend_from_slice(content);

    let tag = seal_in_place(key.as_bytes(), &nonce, &mut bytes[HEADER_SIZE..])?;
    bytes[TAG_OFFSET..HEADER_SIZE].copy_from_slice(&tag);

    trace!(object = %hex::encode(id), size = bytes.len(), "encoded object");
    Ok(EncodedObject { id, bytes })
}

/// Decrypt an object produced by [`encode_object`].
///
/// Nothing from the payload is trusted until the GCM tag verifies.
pub fn decode_object(bytes: &[u8], master: &MasterKey) -> VaultResult<DecodedObject> {
    if bytes.len() < HEADER_SIZE {
        return Err(VaultError::HeaderError {
            len: bytes.len(),
            min: HEADER_SIZE,
        });
    }

    let (header, ciphertext) = bytes.split_at(HEADER_SIZE);
    let mut id = [0u8; OBJECT_ID_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    let mut tag = [0u8; TAG_SIZE];
    id.copy_from_slice(&header[..NONCE_OFFSET]);
    nonce.copy_from_slice(&header[NONCE_OFFSET..TAG_OFFSET]);
    tag.copy_from_slice(&header[TAG_OFFSET..]);

    let key = derive_object_key(master, &id)?;
    let mut payload = ciphertext.to_vec();
    if let Err(e) = open_in_place(key.as_bytes(), &nonce, &tag, &mut payload) {
        payload.zeroize();
        return Err(e);
    }

    split_payload(payload)
}

fn split_payload(mut payload: Vec<u8>) -> VaultResult<DecodedObject> {
    if payload.len() < PATH_LEN_SIZE {
        return Err(VaultError::CorruptedMetadata(format!(
            "payload too short for path length: {} bytes",
            payload.len()
        )));
    }

    let mut len_bytes = [0u8; PATH_LEN_SIZE];
    len_bytes.copy_from_slice(&payload[..PATH_LEN_SIZE]);
    let path_len = u32::from_le_bytes(len_bytes) as usize;

    if path_len > payload.len() - PATH_LEN_SIZE {
        return Err(VaultError::CorruptedMetadata(format!(
            "path length {path_len} exceeds payload of {} bytes",
            payload.len()
        )));
    }

    let content = payload.split_off(PATH_LEN_SIZE + path_len);
    let relative_path = String::from_utf8(payload.split_off(PATH_LEN_SIZE))
        .map_err(|_| VaultError::CorruptedMetadata("path is not valid UTF-8".into()))?;

    Ok(DecodedObject {
        relative_path,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use proptest::prelude::*;

    fn test_master_key() -> MasterKey {
        MasterKey::from_bytes([42u8; KEY_SIZE])
    }

    /// Build an object around an arbitrary (already laid out) payload.
    fn seal_raw_payload(master: &MasterKey, payload: &[u8]) -> Vec<u8> {
        let id = [0x5Au8; OBJECT_ID_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let key = derive_object_key(master, &id).unwrap();
        let mut ct = payload.to_vec();
        let tag = seal_in_place(key.as_bytes(), &nonce, &mut ct).unwrap();

        let mut out = Vec::new();
        out.extend_from_slice(&id);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&tag);
        out.extend_from_slice(&ct);
        out
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let master = test_master_key();
        let encoded = encode_object("sub/b.txt", b"world", &master).unwrap();
        let decoded = decode_object(&encoded.bytes, &master).unwrap();

        assert_eq!(decoded.relative_path, "sub/b.txt");
        assert_eq!(decoded.content, b"world");
    }

    #[test]
    fn test_encoded_layout() {
        let master = test_master_key();
        let encoded = encode_object("a.txt", b"hello", &master).unwrap();

        // header (44) + path_len (4) + path (5) + content (5)
        assert_eq!(encoded.bytes.len(), HEADER_SIZE + 4 + 5 + 5);
        assert_eq!(&encoded.bytes[..OBJECT_ID_SIZE], &encoded.id);
    }

    #[test]
    fn test_file_name_is_hex_id() {
        let master = test_master_key();
        let encoded = encode_object("a.txt", b"hello", &master).unwrap();
        let name = encoded.file_name();

        assert_eq!(name.len(), 32 + 4);
        assert!(name.ends_with(".enc"));
        assert_eq!(parse_object_file_name(&name), Some(encoded.id));
    }

    #[test]
    fn test_parse_object_file_name_rejects_others() {
        assert_eq!(parse_object_file_name("vault.config"), None);
        assert_eq!(parse_object_file_name("abc.enc"), None);
        assert_eq!(parse_object_file_name("00112233445566778899AABBCCDDEEFF.enc"), None);
        assert_eq!(parse_object_file_name("00112233445566778899aabbccddeeff.txt"), None);
        assert_eq!(parse_object_file_name("00112233445566778899aabbccddeegg.enc"), None);
        assert!(parse_object_file_name("00112233445566778899aabbccddeeff.enc").is_some());
    }

    #[test]
    fn test_no_plaintext_on_disk() {
        let master = test_master_key();
        let encoded = encode_object("secret-report.txt", b"confidential body", &master).unwrap();

        let haystack = &encoded.bytes;
        for needle in [&b"secret-report"[..], b"report.txt", b"confidential"] {
            assert!(
                !haystack.windows(needle.len()).any(|w| w == needle),
                "plaintext leaked into object bytes"
            );
        }
        assert!(!encoded.file_name().contains("secret"));
    }

    #[test]
    fn test_empty_file_and_path() {
        let master = test_master_key();
        let encoded = encode_object("", b"", &master).unwrap();
        assert_eq!(encoded.bytes.len(), HEADER_SIZE + 4);

        let decoded = decode_object(&encoded.bytes, &master).unwrap();
        assert_eq!(decoded.relative_path, "");
        assert!(decoded.content.is_empty());
    }

    #[test]
    fn test_decode_truncated_header() {
        let master = test_master_key();
        let encoded = encode_object("a.txt", b"hello", &master).unwrap();

        let err = decode_object(&encoded.bytes[..10], &master).unwrap_err();
        assert!(matches!(err, VaultError::HeaderError { len: 10, min: 44 }));

        let err = decode_object(&encoded.bytes[..HEADER_SIZE - 1], &master).unwrap_err();
        assert!(matches!(err, VaultError::HeaderError { .. }));
    }

    #[test]
    fn test_decode_header_only_fails_auth() {
        let master = test_master_key();
        let encoded = encode_object("a.txt", b"hello", &master).unwrap();

        // Exactly a header: passes the length check, but the tag can't verify.
        let err = decode_object(&encoded.bytes[..HEADER_SIZE], &master).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailure));
    }

    #[test]
    fn test_decode_wrong_key() {
        let encoded = encode_object("a.txt", b"hello", &MasterKey::from_bytes([1u8; KEY_SIZE])).unwrap();
        let err = decode_object(&encoded.bytes, &MasterKey::from_bytes([2u8; KEY_SIZE])).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailure));
    }

    #[test]
    fn test_tampered_fields() {
        let master = test_master_key();
        let encoded = encode_object("a.txt", b"hello", &master).unwrap();

        // id, nonce, tag, ciphertext: any flipped byte must fail authentication
        for offset in [0, NONCE_OFFSET, TAG_OFFSET, HEADER_SIZE] {
            let mut bytes = encoded.bytes.clone();
            bytes[offset] ^= 0xFF;
            let err = decode_object(&bytes, &master).unwrap_err();
            assert!(
                matches!(err, VaultError::AuthenticationFailure),
                "tampering at offset {offset} must fail"
            );
        }
    }

    #[test]
    fn test_corrupted_path_length() {
        let master = test_master_key();
        let mut payload = 100u32.to_le_bytes().to_vec();
        payload.extend_from_slice(b"short");

        let object = seal_raw_payload(&master, &payload);
        let err = decode_object(&object, &master).unwrap_err();
        assert!(matches!(err, VaultError::CorruptedMetadata(_)));
    }

    #[test]
    fn test_payload_shorter_than_length_prefix() {
        let master = test_master_key();
        let object = seal_raw_payload(&master, &[1, 0]);
        let err = decode_object(&object, &master).unwrap_err();
        assert!(matches!(err, VaultError::CorruptedMetadata(_)));
    }

    #[test]
    fn test_negative_legacy_path_length() {
        // A negative i32 read as u32 is huge and must be rejected.
        let master = test_master_key();
        let mut payload = (-1i32).to_le_bytes().to_vec();
        payload.extend_from_slice(b"data");

        let object = seal_raw_payload(&master, &payload);
        let err = decode_object(&object, &master).unwrap_err();
        assert!(matches!(err, VaultError::CorruptedMetadata(_)));
    }

    #[test]
    fn test_non_utf8_path() {
        let master = test_master_key();
        let mut payload = 2u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0xFF, 0xFE]);
        payload.extend_from_slice(b"content");

        let object = seal_raw_payload(&master, &payload);
        let err = decode_object(&object, &master).unwrap_err();
        assert!(matches!(err, VaultError::CorruptedMetadata(_)));
    }

    #[test]
    fn test_same_input_different_objects() {
        let master = test_master_key();
        let a = encode_object("a.txt", b"hello", &master).unwrap();
        let b = encode_object("a.txt", b"hello", &master).unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.bytes, b.bytes);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_any_path_and_content_decode(
            path in "\\PC{0,64}",
            content in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let master = test_master_key();
            let encoded = encode_object(&path, &content, &master).unwrap();
            prop_assert_eq!(encoded.bytes.len(), HEADER_SIZE + 4 + path.len() + content.len());

            let decoded = decode_object(&encoded.bytes, &master).unwrap();
            prop_assert_eq!(decoded.relative_path, path);
            prop_assert_eq!(decoded.content, content);
        }
    }
}
