use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::{Lifetime, MAX_ACCESSES};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// API base URL including the version prefix
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// UI base URL used to build share links
    #[serde(default = "default_ui_url")]
    pub ui_url: String,

    /// Lifetime used when `create` is given none (5m ... 168h)
    #[serde(default)]
    pub default_lifetime: Lifetime,

    /// Accesses used when `create` is given none; -1 for unlimited
    #[serde(default = "default_accesses")]
    pub default_accesses: i64,
}

fn default_api_url() -> String {
    "http://localhost:8318/v1".to_string()
}

fn default_ui_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_accesses() -> i64 {
    -1
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".whisper").join("config.toml"))
}

impl Config {
    /// Load config from ~/.whisper/config.toml, returning defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to ~/.whisper/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Environment wins over the file: WHISPER_ENDPOINT (or WHISPER_URL) and WHISPER_UI_URL.
    pub fn apply_env(mut self) -> Self {
        let endpoint = std::env::var("WHISPER_ENDPOINT")
            .or_else(|_| std::env::var("WHISPER_URL"))
            .ok()
            .filter(|v| !v.trim().is_empty());
        if let Some(url) = endpoint {
            self.api_url = url;
        }
        if let Some(url) = std::env::var("WHISPER_UI_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.ui_url = url;
        }
        self
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" | "endpoint" | "url" => {
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "ui_url" => {
                self.ui_url = value.trim_end_matches('/').to_string();
            }
            "default_lifetime" | "lifetime" => {
                self.default_lifetime = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            }
            "default_accesses" | "accesses" => {
                let accesses: i64 = value.parse().map_err(|_| {
                    anyhow::anyhow!("invalid accesses: must be -1 or 1..={MAX_ACCESSES}")
                })?;
                if accesses != -1 && !(1..=MAX_ACCESSES).contains(&accesses) {
                    bail!("invalid accesses: must be -1 or 1..={MAX_ACCESSES}");
                }
                self.default_accesses = accesses;
            }
            _ => {
                bail!("unknown config key: {key}");
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ui_url: default_ui_url(),
            default_lifetime: Lifetime::default(),
            default_accesses: default_accesses(),
        }
    }
}
