use std::path::PathBuf;

use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("vault not found: {}", .0.display())]
    VaultNotFound(PathBuf),

    #[error("destination is not empty: {}", .0.display())]
    DirtyDestination(PathBuf),

    #[error("authentication failed: wrong password or corrupted data")]
    AuthenticationFailure,

    #[error("header error: object is {len} bytes (minimum {min})")]
    HeaderError { len: usize, min: usize },

    #[error("corrupted metadata: {0}")]
    CorruptedMetadata(String),

    #[error("invalid vault config: {0}")]
    InvalidConfig(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`VaultError`], for callers that branch on the
/// kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceNotFound,
    VaultNotFound,
    DirtyDestination,
    AuthenticationFailure,
    HeaderError,
    CorruptedMetadata,
    InvalidConfig,
    InvalidPath,
    Crypto,
    Io,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound(_) => ErrorKind::SourceNotFound,
            Self::VaultNotFound(_) => ErrorKind::VaultNotFound,
            Self::DirtyDestination(_) => ErrorKind::DirtyDestination,
            Self::AuthenticationFailure => ErrorKind::AuthenticationFailure,
            Self::HeaderError { .. } => ErrorKind::HeaderError,
            Self::CorruptedMetadata(_) => ErrorKind::CorruptedMetadata,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}
