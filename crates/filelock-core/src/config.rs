use serde::{Deserialize, Serialize};

/// PBKDF2-HMAC-SHA256 work factor used when a vault is created.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// CLI configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilelockConfig {
    pub crypto: CryptoConfig,
    pub log: LogConfig,
}

/// Key derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iterations for newly created vaults (default: 600000).
    /// Existing vaults always use the value recorded in their vault.config.
    pub pbkdf2_iterations: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}
