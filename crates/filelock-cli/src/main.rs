//! filelock: zero-trust folder encryption
//!
//! Commands:
//!   encrypt -i <src> -o <vault>   - encrypt a folder into a vault (created on first use)
//!   decrypt -i <vault> -o <out>   - restore a vault into an empty folder
//!   verify -i <vault>             - check a password without decrypting anything
//!   config show                   - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use filelock_core::config::FilelockConfig;
use filelock_core::{ErrorKind, VaultError};
use filelock_crypto::KdfParams;
use filelock_vault::{ProgressFn, VaultOptions};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "filelock",
    version,
    about = "Zero-trust folder encryption",
    long_about = "filelock: encrypt a folder into a vault of obfuscated, authenticated objects, and restore it"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "FILELOCK_CONFIG",
        default_value = "~/.config/filelock/config.toml",
        global = true
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "FILELOCK_LOG", global = true)]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "FILELOCK_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Verbose logging (same as --log debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a folder into a secure vault
    Encrypt {
        /// Source folder path to encrypt
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Destination folder for the encrypted vault
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Master password; asked interactively (twice) if not set
        #[arg(long, short = 'p', env = "FILELOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Decrypt a secure vault to a folder
    Decrypt {
        /// Encrypted vault path
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Destination folder for restored files (must be empty or absent)
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Master password; asked interactively if not set
        #[arg(long, short = 'p', env = "FILELOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check a password against a vault without decrypting any files
    Verify {
        /// Encrypted vault path
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Master password; asked interactively if not set
        #[arg(long, short = 'p', env = "FILELOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = vault_error_kind(&e);
            if kind == Some(ErrorKind::AuthenticationFailure) {
                eprintln!("\n[Access Denied] Invalid password!");
            }
            eprintln!("\n[Error] {e:#}");
            ExitCode::from(exit_code_for(kind))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = expand_tilde(&cli.config);
    let config = load_config(&config_path).await?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        cli.log.clone().unwrap_or_else(|| config.log.level.clone())
    };
    let format = match cli.log_format {
        Some(format) => format,
        None => <LogFormat as ValueEnum>::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("log.format in {}: {e}", config_path.display()))?,
    };
    init_logging(&level, &format);
    debug!(config = %config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Encrypt { input, output, password } => {
            cmd_encrypt(&config, &input, &output, password).await
        }
        Commands::Decrypt { input, output, password } => {
            cmd_decrypt(&input, &output, password).await
        }
        Commands::Verify { input, password } => cmd_verify(&input, password).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<FilelockConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(FilelockConfig::default())
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{}/{}", home, &s[2..]))
    } else {
        path.to_path_buf()
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so they never interleave with command output.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Password entry ────────────────────────────────────────────────────────────

/// Use the password from the flag/env if given, otherwise prompt without echo.
fn resolve_password(given: Option<String>, prompt: &str, confirm: bool) -> Result<SecretString> {
    if let Some(password) = given.filter(|p| !p.trim().is_empty()) {
        return Ok(SecretString::from(password));
    }

    let password = rpassword::prompt_password(prompt).context("reading password")?;
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    if confirm {
        let again = rpassword::prompt_password("Confirm password: ").context("reading password")?;
        if password != again {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(SecretString::from(password))
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Spinner while the key is derived, switching to a bar once files flow.
fn progress_for(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done, total, label| {
        if pb.length() != Some(total) {
            pb.set_style(bar_style());
            pb.set_length(total);
        }
        pb.set_position(done);
        pb.set_message(label.to_string());
    })
}

// ── `filelock encrypt` ────────────────────────────────────────────────────────

async fn cmd_encrypt(
    config: &FilelockConfig,
    input: &Path,
    output: &Path,
    password: Option<String>,
) -> Result<()> {
    let passphrase = resolve_password(password, "Please set a master password: ", true)?;
    let options = VaultOptions {
        kdf: KdfParams {
            pbkdf2_iterations: config.crypto.pbkdf2_iterations,
        },
    };

    println!("Encrypting {} → {}", input.display(), output.display());

    let pb = make_spinner("encrypt");
    pb.set_message("deriving key...");
    let progress = progress_for(&pb);

    let result =
        filelock_vault::encrypt_tree(input, output, &passphrase, &options, Some(&progress)).await;
    pb.finish_and_clear();
    let summary = result.with_context(|| format!("encrypting {}", input.display()))?;

    println!("[Success] Encrypted vault created at: {}", output.display());
    println!("  files:  {}", summary.files);
    println!("  bytes:  {}", fmt_bytes(summary.bytes));
    Ok(())
}

// ── `filelock decrypt` ────────────────────────────────────────────────────────

async fn cmd_decrypt(input: &Path, output: &Path, password: Option<String>) -> Result<()> {
    let passphrase = resolve_password(
        password,
        &format!("Enter password to unlock vault at '{}': ", input.display()),
        false,
    )?;

    println!("Unlocking vault {}...", input.display());

    let pb = make_spinner("decrypt");
    pb.set_message("deriving key...");
    let progress = progress_for(&pb);

    let result = filelock_vault::decrypt_vault(input, output, &passphrase, Some(&progress)).await;
    pb.finish_and_clear();
    let summary = result.with_context(|| format!("decrypting {}", input.display()))?;

    println!("[Success] Files restored to: {}", output.display());
    println!("  files:  {}", summary.files);
    println!("  bytes:  {}", fmt_bytes(summary.bytes));
    Ok(())
}

// ── `filelock verify` ─────────────────────────────────────────────────────────

async fn cmd_verify(input: &Path, password: Option<String>) -> Result<()> {
    let passphrase = resolve_password(
        password,
        &format!("Enter password for vault at '{}': ", input.display()),
        false,
    )?;

    let pb = make_spinner("verify");
    pb.set_message("deriving key...");
    let result = filelock_vault::verify_password(input, &passphrase).await;
    pb.finish_and_clear();
    result.with_context(|| format!("verifying {}", input.display()))?;

    println!("[Success] Password is valid for {}", input.display());
    Ok(())
}

// ── `filelock config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &FilelockConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Exit codes ────────────────────────────────────────────────────────────────

fn vault_error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<VaultError>())
        .map(VaultError::kind)
}

fn exit_code_for(kind: Option<ErrorKind>) -> u8 {
    match kind {
        Some(ErrorKind::AuthenticationFailure) => 2,
        Some(ErrorKind::SourceNotFound | ErrorKind::VaultNotFound) => 3,
        Some(ErrorKind::DirtyDestination) => 4,
        Some(ErrorKind::HeaderError | ErrorKind::CorruptedMetadata | ErrorKind::InvalidConfig) => 5,
        _ => 1,
    }
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
