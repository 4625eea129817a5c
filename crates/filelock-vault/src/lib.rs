//! filelock-vault: encrypt a directory tree into a vault and restore it
//!
//! Vault layout:
//! ```text
//! <vault>/vault.config        salt + password verifier (JSON)
//! <vault>/<32 hex chars>.enc  one object per source file
//! ```
//!
//! Operations run sequentially, one file at a time. Nothing guards against
//! two operations on the same vault at once; callers must serialize them.

pub mod config;
pub mod engine;
pub mod paths;
pub mod store;

pub use config::{VaultConfig, CONFIG_FILE_NAME};
pub use engine::{
    decrypt_vault, encrypt_tree, verify_password, DecryptSummary, EncryptSummary, ProgressFn,
    VaultOptions,
};
pub use store::{is_vault, load_config, open_vault};
