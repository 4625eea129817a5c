//! vault.config: vault salt and password verifier
//!
//! Stored as JSON with base64 binary fields. Keys are PascalCase so configs
//! written by earlier FileLock releases load unchanged; those lack
//! `Pbkdf2Iterations` and get the default work factor.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use filelock_core::config::DEFAULT_PBKDF2_ITERATIONS;
use filelock_core::{VaultError, VaultResult};
use filelock_crypto::{KdfParams, Verifier, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use serde::{Deserialize, Serialize};

/// Fixed name of the config file inside a vault root.
pub const CONFIG_FILE_NAME: &str = "vault.config";

/// Decoded contents of vault.config. Immutable once the vault exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub salt: [u8; SALT_SIZE],
    pub verifier: Verifier,
    pub kdf: KdfParams,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVaultConfig {
    vault_salt_base64: String,
    verifier_nonce_base64: String,
    verifier_tag_base64: String,
    verifier_cipher_base64: String,
    #[serde(default = "default_iterations")]
    pbkdf2_iterations: u32,
}

fn default_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

impl VaultConfig {
    pub fn to_json(&self) -> VaultResult<String> {
        let raw = RawVaultConfig {
            vault_salt_base64: STANDARD.encode(self.salt),
            verifier_nonce_base64: STANDARD.encode(self.verifier.nonce),
            verifier_tag_base64: STANDARD.encode(self.verifier.tag),
            verifier_cipher_base64: STANDARD.encode(&self.verifier.cipher),
            pbkdf2_iterations: self.kdf.pbkdf2_iterations,
        };
        serde_json::to_string_pretty(&raw)
            .map_err(|e| VaultError::InvalidConfig(format!("serializing vault config: {e}")))
    }

    pub fn from_json(json: &str) -> VaultResult<Self> {
        let raw: RawVaultConfig = serde_json::from_str(json)
            .map_err(|e| VaultError::InvalidConfig(format!("parsing vault config: {e}")))?;

        if raw.pbkdf2_iterations == 0 {
            return Err(VaultError::InvalidConfig(
                "Pbkdf2Iterations must be at least 1".into(),
            ));
        }

        Ok(Self {
            salt: decode_fixed::<SALT_SIZE>("VaultSaltBase64", &raw.vault_salt_base64)?,
            verifier: Verifier {
                nonce: decode_fixed::<NONCE_SIZE>("VerifierNonceBase64", &raw.verifier_nonce_base64)?,
                tag: decode_fixed::<TAG_SIZE>("VerifierTagBase64", &raw.verifier_tag_base64)?,
                cipher: decode_field("VerifierCipherBase64", &raw.verifier_cipher_base64)?,
            },
            kdf: KdfParams {
                pbkdf2_iterations: raw.pbkdf2_iterations,
            },
        })
    }
}

fn decode_field(field: &str, value: &str) -> VaultResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| VaultError::InvalidConfig(format!("{field}: base64 decode: {e}")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> VaultResult<[u8; N]> {
    let bytes = decode_field(field, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        VaultError::InvalidConfig(format!("{field}: expected {N} bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> VaultConfig {
        VaultConfig {
            salt: [7u8; SALT_SIZE],
            verifier: Verifier {
                nonce: [1u8; NONCE_SIZE],
                tag: [2u8; TAG_SIZE],
                cipher: b"\x10\x20\x30\x40\x50".to_vec(),
            },
            kdf: KdfParams {
                pbkdf2_iterations: 1_000,
            },
        }
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = sample_config();
        let json = config.to_json().unwrap();
        let restored = VaultConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_config_field_names() {
        let json = sample_config().to_json().unwrap();
        for key in [
            "\"VaultSaltBase64\"",
            "\"VerifierNonceBase64\"",
            "\"VerifierTagBase64\"",
            "\"VerifierCipherBase64\"",
            "\"Pbkdf2Iterations\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_legacy_config_without_iterations() {
        let json = format!(
            r#"{{
  "VaultSaltBase64": "{}",
  "VerifierNonceBase64": "{}",
  "VerifierTagBase64": "{}",
  "VerifierCipherBase64": "{}"
}}"#,
            STANDARD.encode([9u8; SALT_SIZE]),
            STANDARD.encode([3u8; NONCE_SIZE]),
            STANDARD.encode([4u8; TAG_SIZE]),
            STANDARD.encode(b"abcde"),
        );

        let config = VaultConfig::from_json(&json).unwrap();
        assert_eq!(config.salt, [9u8; SALT_SIZE]);
        assert_eq!(config.verifier.cipher, b"abcde");
        assert_eq!(config.kdf.pbkdf2_iterations, 600_000);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_config().to_json().unwrap()).unwrap();
        value["Comment"] = serde_json::Value::String("hand-edited".into());

        let config = VaultConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(config, sample_config());
    }

    #[test]
    fn test_wrong_salt_length() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_config().to_json().unwrap()).unwrap();
        value["VaultSaltBase64"] = serde_json::Value::String(STANDARD.encode([0u8; 16]));

        let err = VaultConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(msg) if msg.contains("VaultSaltBase64")));
    }

    #[test]
    fn test_invalid_base64() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_config().to_json().unwrap()).unwrap();
        value["VerifierTagBase64"] = serde_json::Value::String("not base64!!".into());

        let err = VaultConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = VaultConfig::from_json("{ this is not json").unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_config().to_json().unwrap()).unwrap();
        value["Pbkdf2Iterations"] = serde_json::Value::from(0);

        let err = VaultConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));
    }
}
