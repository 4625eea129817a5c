//! Vault config store: create or open a vault and produce its master key
//!
//! A vault root is clean when it holds nothing but `vault.config` and
//! `<32 hex>.enc` object files. Only the top level is inspected and hidden
//! entries count like any other.

use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use filelock_core::{VaultError, VaultResult};
use filelock_crypto::{
    create_verifier, derive_master_key, generate_salt, parse_object_file_name,
    validate_verifier, KdfParams, MasterKey, SALT_SIZE,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{VaultConfig, CONFIG_FILE_NAME};

/// Open the vault at `root` and return its master key.
///
/// - config present: derive with the stored salt and check the verifier
///   (`AuthenticationFailure` on mismatch). With `allow_create`, the root must
///   also contain nothing but vault artifacts.
/// - config absent, `allow_create`: the root must be absent or empty; a new
///   salt and verifier are generated with `kdf` and written out.
/// - config absent otherwise: `VaultNotFound`, and nothing is created.
pub async fn open_vault(
    root: &Path,
    passphrase: &SecretString,
    allow_create: bool,
    kdf: &KdfParams,
) -> VaultResult<MasterKey> {
    if is_vault(root).await? {
        let config = load_config(root).await?;
        if allow_create {
            ensure_only_vault_entries(root).await?;
        }

        let master = derive_off_thread(passphrase, &config.salt, config.kdf).await?;
        validate_verifier(&master, &config.verifier).inspect_err(|_| {
            warn!(vault = %root.display(), "password verification failed");
        })?;
        debug!(vault = %root.display(), "password verified");
        return Ok(master);
    }

    if !allow_create {
        return Err(VaultError::VaultNotFound(root.to_path_buf()));
    }

    if !is_empty_or_absent(root).await? {
        warn!(vault = %root.display(), "refusing to create vault in non-empty directory");
        return Err(VaultError::DirtyDestination(root.to_path_buf()));
    }

    create_vault(root, passphrase, kdf).await
}

/// Read and decode `<root>/vault.config`.
pub async fn load_config(root: &Path) -> VaultResult<VaultConfig> {
    let path = root.join(CONFIG_FILE_NAME);
    let json = match tokio::fs::read_to_string(&path).await {
        Ok(json) => json,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(VaultError::VaultNotFound(root.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    VaultConfig::from_json(&json)
}

/// Whether `root` holds a vault config. A missing root is not a vault;
/// any other I/O failure is returned.
pub async fn is_vault(root: &Path) -> VaultResult<bool> {
    match tokio::fs::metadata(root.join(CONFIG_FILE_NAME)).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn create_vault(
    root: &Path,
    passphrase: &SecretString,
    kdf: &KdfParams,
) -> VaultResult<MasterKey> {
    tokio::fs::create_dir_all(root).await?;

    let salt = generate_salt();
    let master = derive_off_thread(passphrase, &salt, *kdf).await?;
    let config = VaultConfig {
        salt,
        verifier: create_verifier(&master)?,
        kdf: *kdf,
    };

    write_new_file(&root.join(CONFIG_FILE_NAME), config.to_json()?.as_bytes()).await?;
    info!(
        vault = %root.display(),
        iterations = kdf.pbkdf2_iterations,
        "created vault"
    );
    Ok(master)
}

/// Run the (deliberately slow) KDF on the blocking pool.
async fn derive_off_thread(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    kdf: KdfParams,
) -> VaultResult<MasterKey> {
    let passphrase = SecretString::from(passphrase.expose_secret().to_owned());
    let salt = *salt;
    tokio::task::spawn_blocking(move || derive_master_key(&passphrase, &salt, &kdf))
        .await
        .map_err(|e| VaultError::Crypto(format!("key derivation task failed: {e}")))?
}

async fn ensure_only_vault_entries(root: &Path) -> VaultResult<()> {
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == CONFIG_FILE_NAME {
            continue;
        }
        let is_object =
            entry.file_type().await?.is_file() && parse_object_file_name(&name).is_some();
        if !is_object {
            warn!(vault = %root.display(), entry = %name, "foreign entry in vault");
            return Err(VaultError::DirtyDestination(root.to_path_buf()));
        }
    }
    Ok(())
}

/// True when `path` does not exist, or is a directory with no entries.
/// An existing non-directory counts as occupied.
pub(crate) async fn is_empty_or_absent(path: &Path) -> VaultResult<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if !meta.is_dir() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    }
    let mut entries = tokio::fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_none())
}

/// Write a file that must not already exist.
pub(crate) async fn write_new_file(path: &Path, bytes: &[u8]) -> VaultResult<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}
