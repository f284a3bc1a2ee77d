use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Network authentication mode for the link driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    Open,
    #[default]
    WpaPsk,
    Wep,
}

/// Credentials and auth mode handed to the link driver on (re)connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    /// Network name to join.
    pub ssid: String,
    /// Authentication mode; defaults to WPA-PSK.
    #[serde(default)]
    pub auth: AuthMode,
    /// Pre-shared key (ignored for open networks).
    #[serde(default)]
    pub psk: String,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "DEMO_AP".to_string(),
            auth: AuthMode::WpaPsk,
            psk: "12345678".to_string(),
        }
    }
}

/// Supervisor timing knobs, in seconds.
///
/// The first arming of the stall timer uses `initial_stall_secs`; every
/// re-arm after it fires uses `recurring_stall_secs`. The asymmetry gives the
/// first attempt a shorter grace period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_initial_stall_secs")]
    pub initial_stall_secs: u64,
    #[serde(default = "default_recurring_stall_secs")]
    pub recurring_stall_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

fn default_initial_stall_secs() -> u64 {
    40
}

fn default_recurring_stall_secs() -> u64 {
    60
}

fn default_heartbeat_secs() -> u64 {
    1
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            initial_stall_secs: default_initial_stall_secs(),
            recurring_stall_secs: default_recurring_stall_secs(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

/// Global configuration loaded from `~/.config/hfd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfdConfig {
    /// HTTP URL of the file to download.
    pub url: String,
    /// Bodies at or below this size arrive inline with the response headers
    /// instead of as separate chunks.
    #[serde(default = "default_receive_buffer_threshold")]
    pub receive_buffer_threshold: usize,
    /// Where the file lands; current directory when absent.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Link credentials.
    #[serde(default)]
    pub wifi: WifiConfig,
    /// Heartbeat and stall/redownload timer durations.
    #[serde(default)]
    pub timers: TimerConfig,
}

fn default_receive_buffer_threshold() -> usize {
    4096
}

impl Default for HfdConfig {
    fn default() -> Self {
        Self {
            url: "http://example.com/download.bin".to_string(),
            receive_buffer_threshold: default_receive_buffer_threshold(),
            download_dir: None,
            wifi: WifiConfig::default(),
            timers: TimerConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hfd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HfdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HfdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HfdConfig = toml::from_str(&data)?;
    Ok(cfg)
}
