//! Shared helpers for vault integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use filelock_crypto::KdfParams;
use filelock_vault::VaultOptions;
use secrecy::SecretString;

/// Low work factor so tests don't spend seconds in PBKDF2.
pub fn fast_options() -> VaultOptions {
    VaultOptions {
        kdf: KdfParams {
            pbkdf2_iterations: 1_000,
        },
    }
}

pub fn password(s: &str) -> SecretString {
    SecretString::from(s)
}

/// Write `content` at `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(&path, content).expect("write test file");
}

/// All regular files under `root` as sorted (`/`-joined relative path, content).
pub fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    if root.exists() {
        read_tree_inner(root, root, &mut out);
    }
    out.sort();
    out
}

fn read_tree_inner(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
    for entry in std::fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            read_tree_inner(root, &path, out);
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push((rel, std::fs::read(&path).expect("read file")));
        }
    }
}

/// Object files in a vault, sorted by name.
pub fn object_files(vault: &Path) -> Vec<PathBuf> {
    let mut objects: Vec<PathBuf> = std::fs::read_dir(vault)
        .expect("read vault")
        .map(|e| e.expect("dir entry").path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "enc"))
        .collect();
    objects.sort();
    objects
}

pub fn dir_entry_count(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir).expect("read dir").count()
}
