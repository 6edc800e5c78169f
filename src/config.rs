//! Runtime configuration
//!
//! Only timing and logging knobs live here. Macro settings are never written
//! to disk; they reset on every start.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "raymacro";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub status: StatusConfig,
    pub logging: LoggingConfig,
    pub wizard: WizardConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Time between sampling ticks (one display frame at 60 Hz by default)
    pub frame_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    /// How long Stopped lasts before falling back to Ready
    pub stop_cooldown_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            stop_cooldown_ms: 1000,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct WizardConfig {
    /// Start the (stub) macro right after both buttons are bound
    pub auto_start: bool,
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Loads the config file, falling back to defaults when it does not exist.
    pub async fn load() -> Result<Self> {
        let path = Self::path();
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse config file: {}", e))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.sampler.frame_interval_ms.max(1))
    }

    pub fn stop_cooldown(&self) -> Duration {
        Duration::from_millis(self.status.stop_cooldown_ms.max(1))
    }
}
