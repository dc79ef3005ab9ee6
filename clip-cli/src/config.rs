//! Configuration management for netclipper.
//!
//! Settings come from an optional TOML file with command-line flags
//! layered on top:
//!
//! ```toml
//! debug = false
//! key_file = "/home/me/.netclip"
//!
//! [network]
//! connect = "192.168.1.20:7777"   # or: listen = "0.0.0.0:7777"
//!
//! [clipboard]
//! poll_interval_ms = 250
//! ```

use anyhow::{Context, Result};
use clip_core::{encode_key, parse_key, KeyMaterial};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Key file name in the home directory.
pub const DEFAULT_KEY_FILE: &str = ".netclip";

fn default_poll_interval_ms() -> u64 {
    250
}

/// Settings errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// Neither side of the connection was given.
    #[error("No peer address: pass --connect <ADDR> or --listen <ADDR>, or set [network] in the config file")]
    MissingAddress,

    /// The config file names both sides.
    #[error("Config file sets both [network] connect and listen; pick one")]
    ConflictingAddresses,

    /// A zero poll interval would spin.
    #[error("poll_interval_ms must be greater than zero")]
    InvalidPollInterval,
}

/// The TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Print a line for every send and receive attempt.
    pub debug: bool,
    /// Path to the shared key file.
    pub key_file: Option<PathBuf>,
    /// Which peer to talk to.
    pub network: NetworkSection,
    /// Clipboard polling.
    pub clipboard: ClipboardSection,
}

/// `[network]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    /// Dial this `host:port`.
    pub connect: Option<String>,
    /// Accept one peer on this `host:port`.
    pub listen: Option<String>,
}

/// `[clipboard]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipboardSection {
    /// How often the clipboard is read, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ClipboardSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl FileConfig {
    /// Parse config file contents.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid config file")
    }

    /// Load the config file at `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents)
    }
}

/// Values given on the command line. `None` defers to the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    /// `--key-file`
    pub key_file: Option<PathBuf>,
    /// `--debug`
    pub debug: bool,
    /// `--connect`
    pub connect: Option<String>,
    /// `--listen`
    pub listen: Option<String>,
    /// `--poll-interval-ms`
    pub poll_interval_ms: Option<u64>,
}

/// Which end of the connection this process is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    /// Dial the peer.
    Connect(String),
    /// Wait for the peer.
    Listen(String),
}

/// Final settings for a sync session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path to the shared key file.
    pub key_file: PathBuf,
    /// Print a line for every send and receive attempt.
    pub debug: bool,
    /// Peer address and role.
    pub network: Network,
    /// Clipboard polling interval.
    pub poll_interval: Duration,
}

impl Settings {
    /// Layer command-line values over the config file.
    ///
    /// A network flag replaces the file's `[network]` table entirely.
    pub fn resolve(
        file: FileConfig,
        flags: Overrides,
        default_key_file: PathBuf,
    ) -> Result<Self, SettingsError> {
        let network = match (flags.connect, flags.listen) {
            (Some(addr), _) => Network::Connect(addr),
            (None, Some(addr)) => Network::Listen(addr),
            (None, None) => match (file.network.connect, file.network.listen) {
                (Some(_), Some(_)) => return Err(SettingsError::ConflictingAddresses),
                (Some(addr), None) => Network::Connect(addr),
                (None, Some(addr)) => Network::Listen(addr),
                (None, None) => return Err(SettingsError::MissingAddress),
            },
        };

        let poll_interval_ms = flags
            .poll_interval_ms
            .unwrap_or(file.clipboard.poll_interval_ms);
        if poll_interval_ms == 0 {
            return Err(SettingsError::InvalidPollInterval);
        }

        Ok(Self {
            key_file: flags.key_file.or(file.key_file).unwrap_or(default_key_file),
            debug: flags.debug || file.debug,
            network,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

/// `~/.netclip`
pub fn default_key_file() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().context("Could not determine home directory")?;
    Ok(dirs.home_dir().join(DEFAULT_KEY_FILE))
}

/// Read and validate the shared key.
///
/// Any failure, missing file or bad contents, is reported the same way.
pub async fn load_key(path: &Path) -> Result<KeyMaterial> {
    let no_key = || format!("No valid key found in {}", path.display());

    let contents = tokio::fs::read_to_string(path).await.with_context(no_key)?;
    parse_key(&contents).with_context(no_key)
}

/// Write a key file readable only by its owner.
pub async fn save_key(path: &Path, key: &KeyMaterial) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create key directory")?;
    }

    let mut contents = encode_key(key);
    contents.push('\n');
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write key file {}", path.display()))?;
    set_file_permissions_0600(path).await?;
    Ok(())
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn default_key() -> PathBuf {
        PathBuf::from("/home/test/.netclip")
    }

    // ===========================================
    // Config File Tests
    // ===========================================

    #[test]
    fn empty_file_uses_defaults() {
        let file = FileConfig::parse("").unwrap();
        assert!(!file.debug);
        assert!(file.key_file.is_none());
        assert!(file.network.connect.is_none());
        assert_eq!(file.clipboard.poll_interval_ms, 250);
    }

    #[test]
    fn full_file_parses() {
        let file = FileConfig::parse(
            r#"
            debug = true
            key_file = "/etc/netclip.key"

            [network]
            listen = "0.0.0.0:7777"

            [clipboard]
            poll_interval_ms = 100
            "#,
        )
        .unwrap();

        assert!(file.debug);
        assert_eq!(file.key_file, Some(PathBuf::from("/etc/netclip.key")));
        assert_eq!(file.network.listen.as_deref(), Some("0.0.0.0:7777"));
        assert_eq!(file.clipboard.poll_interval_ms, 100);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[network]\nrelay = \"x\"").is_err());
    }

    #[tokio::test]
    async fn missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::load(&dir.path().join("nope.toml")).await;
        assert!(result.is_err());
    }

    // ===========================================
    // Settings Resolution Tests
    // ===========================================

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse(
            r#"
            key_file = "/from/file"
            [network]
            connect = "file-host:1"
            [clipboard]
            poll_interval_ms = 900
            "#,
        )
        .unwrap();
        let flags = Overrides {
            key_file: Some(PathBuf::from("/from/flag")),
            listen: Some("0.0.0.0:2".into()),
            poll_interval_ms: Some(50),
            ..Overrides::default()
        };

        let settings = Settings::resolve(file, flags, default_key()).unwrap();

        assert_eq!(settings.key_file, PathBuf::from("/from/flag"));
        assert_eq!(settings.network, Network::Listen("0.0.0.0:2".into()));
        assert_eq!(settings.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn file_fills_in_missing_flags() {
        let file = FileConfig::parse("debug = true\n[network]\nconnect = \"peer:7777\"").unwrap();

        let settings = Settings::resolve(file, Overrides::default(), default_key()).unwrap();

        assert!(settings.debug);
        assert_eq!(settings.key_file, default_key());
        assert_eq!(settings.network, Network::Connect("peer:7777".into()));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn debug_flag_turns_debug_on() {
        let flags = Overrides {
            debug: true,
            connect: Some("peer:1".into()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(FileConfig::default(), flags, default_key()).unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn no_address_anywhere_is_an_error() {
        let result = Settings::resolve(FileConfig::default(), Overrides::default(), default_key());
        assert_eq!(result, Err(SettingsError::MissingAddress));
    }

    #[test]
    fn file_with_both_addresses_is_an_error() {
        let file =
            FileConfig::parse("[network]\nconnect = \"a:1\"\nlisten = \"b:2\"").unwrap();
        let result = Settings::resolve(file, Overrides::default(), default_key());
        assert_eq!(result, Err(SettingsError::ConflictingAddresses));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let flags = Overrides {
            connect: Some("peer:1".into()),
            poll_interval_ms: Some(0),
            ..Overrides::default()
        };
        let result = Settings::resolve(FileConfig::default(), flags, default_key());
        assert_eq!(result, Err(SettingsError::InvalidPollInterval));
    }

    // ===========================================
    // Key File Tests
    // ===========================================

    #[tokio::test]
    async fn saved_key_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        let key = KeyMaterial::from_bytes([0x5a; 32]);

        save_key(&path, &key).await.unwrap();
        let loaded = load_key(&path).await.unwrap();

        assert_eq!(loaded.as_bytes(), key.as_bytes());
    }

    #[tokio::test]
    async fn key_with_surrounding_whitespace_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        tokio::fs::write(&path, format!("  \n{}\r\n\t", "ab".repeat(32)))
            .await
            .unwrap();

        let loaded = load_key(&path).await.unwrap();
        assert_eq!(loaded.as_bytes(), &[0xab; 32]);
    }

    #[tokio::test]
    async fn missing_key_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        let err = load_key(&path).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("No valid key found in {}", path.display())
        );
    }

    #[tokio::test]
    async fn short_key_is_not_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        tokio::fs::write(&path, "abcd").await.unwrap();

        let err = load_key(&path).await.unwrap_err();
        assert!(err.to_string().starts_with("No valid key found in"));
    }

    #[tokio::test]
    async fn non_hex_key_is_not_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        tokio::fs::write(&path, "zz".repeat(32)).await.unwrap();

        assert!(load_key(&path).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        save_key(&path, &KeyMaterial::from_bytes([1; 32])).await.unwrap();

        let perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "file should be 0600");
    }
}
