//! Configuration Vault – reads/writes `~/.robovac/config.toml`.

use robovac_runtime::PollerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// One configured vacuum, as entered in the setup wizard.
#[derive(Clone, Serialize, Deserialize)]
pub struct VacuumConfig {
    /// Vendor device id.
    pub id: String,

    /// Display name, also accepted wherever the REPL takes a vacuum.
    pub name: String,

    /// Model code, e.g. `T2250`.  Drives capability resolution.
    pub model: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mac: String,

    /// Local IP address.  Empty until the user sets it; such a vacuum is
    /// never polled.
    #[serde(default)]
    pub ip_address: String,

    /// Device local key (stored as plain text – the file is owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
}

impl VacuumConfig {
    pub fn is_reachable(&self) -> bool {
        !self.ip_address.trim().is_empty()
    }
}

impl std::fmt::Debug for VacuumConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VacuumConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("description", &self.description)
            .field("mac", &self.mac)
            .field("ip_address", &self.ip_address)
            .field(
                "access_token",
                if self.access_token.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .finish()
    }
}

/// Persisted user configuration stored in `~/.robovac/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between background polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Milliseconds to wait after a command before re-polling.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub vacuums: Vec<VacuumConfig>,
}

fn default_poll_interval_secs() -> u64 {
    20
}
fn default_settle_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            vacuums: Vec::new(),
        }
    }
}

impl Config {
    /// Poller timing.  The poller raises a zero interval to its minimum.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
        .clamped()
    }
}

/// Return the path to `~/.robovac/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".robovac").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROBOVAC_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROBOVAC_POLL_INTERVAL_SECS` | `poll_interval_secs` |
/// | `ROBOVAC_SETTLE_DELAY_MS` | `settle_delay_ms` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ROBOVAC_POLL_INTERVAL_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.poll_interval_secs = secs;
    }
    if let Ok(v) = std::env::var("ROBOVAC_SETTLE_DELAY_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.settle_delay_ms = ms;
    }
}

/// Save the config to disk, creating `~/.robovac/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Access tokens live in this file: owner read/write only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
