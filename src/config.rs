use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_ASK_PATH: &str = "/ask";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_ask_path")]
    pub ask_path: String,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_ask_path() -> String {
    DEFAULT_ASK_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: default_server_url(),
            ask_path: default_ask_path(),
        }
    }

    /// Load from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        let loaded = Self::get_config_path().and_then(|path| Self::load_from(&path));
        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "could not read config, using defaults");
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_server(mut self, server_url: Option<String>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        self
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("askchat").join("config.json"))
    }
}
