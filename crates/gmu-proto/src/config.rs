use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform;
use crate::protocol::WireFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Address of the Gmu remote-control socket.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Fixed delay before each reconnect attempt.  No backoff.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Outbound wire format; must match what the server build expects.
    #[serde(default)]
    pub wire_format: WireFormat,
}

/// Geometry of the playlist viewport.  Stands in for the DOM measurements
/// the original frontend took from the rendered table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            wire_format: WireFormat::default(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
            viewport_height: default_viewport_height(),
        }
    }
}

fn default_endpoint() -> String {
    platform::default_endpoint()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_row_height() -> u32 {
    20
}

fn default_viewport_height() -> u32 {
    400
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            playlist: PlaylistConfig::default(),
        }
    }
}
