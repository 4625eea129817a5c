//! Relative path handling
//!
//! Paths inside objects always use `/` so a vault written on one OS restores
//! on another. Decoded paths are untrusted input until they pass
//! [`resolve_output_path`].

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use filelock_core::{VaultError, VaultResult};

/// Express `path` relative to `root` with `/` separators.
pub fn relative_path_string(root: &Path, path: &Path) -> VaultResult<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        VaultError::InvalidPath(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    VaultError::InvalidPath(format!("not valid UTF-8: {}", path.display()))
                })?;
                parts.push(name);
            }
            _ => {
                return Err(VaultError::InvalidPath(format!(
                    "unexpected component in {}",
                    rel.display()
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(VaultError::InvalidPath(format!(
            "empty relative path for {}",
            path.display()
        )));
    }
    Ok(parts.join("/"))
}

/// Join a decoded `/`-separated relative path onto `root`, refusing anything
/// that could land outside it.
///
/// Every segment must be a single plain file name: no empty segments (which
/// also rules out absolute paths), no `.` or `..`, and nothing the host OS
/// would read as a separator or drive prefix.
pub fn resolve_output_path(root: &Path, relative: &str) -> VaultResult<PathBuf> {
    let mut out = root.to_path_buf();
    for segment in relative.split('/') {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == OsStr::new(segment) => {
                out.push(name);
            }
            _ => {
                return Err(VaultError::CorruptedMetadata(format!(
                    "unsafe relative path in object: {relative:?}"
                )))
            }
        }
    }
    Ok(out)
}
