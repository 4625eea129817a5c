//! Vault engine
//!
//! - `encrypt_tree`: walk a directory tree, write one object per file
//! - `decrypt_vault`: verify the password, restore every object under an output root
//! - `verify_password`: the cheap verifier check on its own
//!
//! Files are processed strictly one at a time, in sorted order.

use std::path::{Path, PathBuf};

use filelock_core::{VaultError, VaultResult};
use filelock_crypto::{decode_object, encode_object, KdfParams, OBJECT_EXTENSION};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::paths::{relative_path_string, resolve_output_path};
use crate::store::{is_empty_or_absent, open_vault, write_new_file};

/// Progress callback: `(current, total, label)`, with `current` counting from 1.
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Tunables for vault operations. `Default` gives production settings.
#[derive(Debug, Clone, Default)]
pub struct VaultOptions {
    /// KDF parameters used when a new vault is created
    pub kdf: KdfParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptSummary {
    pub files: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Encrypt every regular file under `source_root` into the vault at
/// `vault_root`, creating the vault if the root is absent or empty.
pub async fn encrypt_tree(
    source_root: &Path,
    vault_root: &Path,
    passphrase: &SecretString,
    options: &VaultOptions,
    progress: Option<&ProgressFn>,
) -> VaultResult<EncryptSummary> {
    match tokio::fs::metadata(source_root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(VaultError::SourceNotFound(source_root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::SourceNotFound(source_root.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    }

    // Resolve every relative path before the vault is touched, so a bad
    // file name fails the run without leaving a half-written vault behind.
    let files = collect_files(source_root)?
        .into_iter()
        .map(|path| {
            let rel = relative_path_string(source_root, &path)?;
            Ok((path, rel))
        })
        .collect::<VaultResult<Vec<_>>>()?;

    let master = open_vault(vault_root, passphrase, true, &options.kdf).await?;

    let total = files.len();
    info!(
        source = %source_root.display(),
        vault = %vault_root.display(),
        files = total,
        "encrypting tree"
    );

    let mut summary = EncryptSummary::default();
    for (i, (path, rel)) in files.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i as u64 + 1, total as u64, rel);
        }

        let content = tokio::fs::read(path).await?;
        let object = encode_object(rel, &content, &master)?;
        let name = object.file_name();
        write_new_file(&vault_root.join(&name), &object.bytes).await?;

        debug!(object = %name, size = object.bytes.len(), "wrote object");
        summary.files += 1;
        summary.bytes += content.len() as u64;
    }

    info!(files = summary.files, bytes = summary.bytes, "encrypt complete");
    Ok(summary)
}

/// Restore every object in the vault at `vault_root` under `output_root`.
///
/// The password is verified before any object is read. The first failing
/// object aborts the run; files restored before it stay on disk.
pub async fn decrypt_vault(
    vault_root: &Path,
    output_root: &Path,
    passphrase: &SecretString,
    progress: Option<&ProgressFn>,
) -> VaultResult<DecryptSummary> {
    let master = open_vault(vault_root, passphrase, false, &KdfParams::default()).await?;

    if !is_empty_or_absent(output_root).await? {
        warn!(output = %output_root.display(), "refusing to restore into non-empty directory");
        return Err(VaultError::DirtyDestination(output_root.to_path_buf()));
    }
    tokio::fs::create_dir_all(output_root).await?;

    let objects = list_objects(vault_root).await?;
    let total = objects.len();
    info!(
        vault = %vault_root.display(),
        output = %output_root.display(),
        objects = total,
        "decrypting vault"
    );

    let mut summary = DecryptSummary::default();
    for (i, path) in objects.iter().enumerate() {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(cb) = progress {
            cb(i as u64 + 1, total as u64, &label);
        }

        let bytes = tokio::fs::read(path).await?;
        let decoded = decode_object(&bytes, &master)
            .inspect_err(|e| warn!(object = %label, "failed to decrypt object: {e}"))?;
        // The error carries the decoded path; keep it out of warn-level logs.
        let dest = resolve_output_path(output_root, &decoded.relative_path).inspect_err(|e| {
            warn!(object = %label, "object path escapes the output root");
            debug!(object = %label, "{e}");
        })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &decoded.content).await?;

        debug!(object = %label, size = decoded.content.len(), "restored object");
        summary.files += 1;
        summary.bytes += decoded.content.len() as u64;
    }

    info!(files = summary.files, bytes = summary.bytes, "decrypt complete");
    Ok(summary)
}

/// Check `passphrase` against the vault's verifier without reading objects.
pub async fn verify_password(vault_root: &Path, passphrase: &SecretString) -> VaultResult<()> {
    open_vault(vault_root, passphrase, false, &KdfParams::default()).await?;
    Ok(())
}

/// Collect all regular files under `root` recursively, sorted.
/// Symlinks are not followed.
fn collect_files(root: &Path) -> VaultResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_inner(root, &mut files)?;
    files.sort(); // deterministic order
    Ok(files)
}

fn collect_files_inner(dir: &Path, out: &mut Vec<PathBuf>) -> VaultResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files_inner(&entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(entry.path());
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }
    Ok(())
}

/// Object files directly under the vault root (never nested), sorted by name.
async fn list_objects(vault_root: &Path) -> VaultResult<Vec<PathBuf>> {
    let mut objects = Vec::new();
    let mut entries = tokio::fs::read_dir(vault_root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_object = path.extension().is_some_and(|ext| ext == OBJECT_EXTENSION);
        if is_object && entry.file_type().await?.is_file() {
            objects.push(path);
        }
    }
    objects.sort();
    Ok(objects)
}
