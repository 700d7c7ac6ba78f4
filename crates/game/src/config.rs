//! Game configuration. Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Relay server address for multiplayer sessions.
    #[serde(default = "default_relay_addr")]
    pub relay_addr: String,
    /// Connect to the relay at startup.
    #[serde(default)]
    pub enable_net: bool,
    /// Simulation rate in Hz.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    /// Villagers to spawn into the demo world.
    #[serde(default = "default_villagers")]
    pub villagers: usize,
    /// Map document path.
    #[serde(default = "default_map_path")]
    pub map_path: String,
    /// Simulation speed multiplier (0.5 = slow-mo, 2.0 = fast).
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
}

fn default_relay_addr() -> String {
    "127.0.0.1:7777".to_string()
}
fn default_tick_hz() -> f64 {
    30.0
}
fn default_villagers() -> usize {
    12
}
fn default_map_path() -> String {
    "map.json".to_string()
}
fn default_time_scale() -> f32 {
    1.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            relay_addr: default_relay_addr(),
            enable_net: false,
            tick_hz: default_tick_hz(),
            villagers: default_villagers(),
            map_path: default_map_path(),
            time_scale: default_time_scale(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid,
    /// returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("config.ron")
}
