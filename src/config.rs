use crate::ranking::scheduler::DEFAULT_REFRESH_INTERVAL;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub listen: ListenConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub compilation: CompilationConfig,
}

#[derive(Debug, Deserialize)]
pub struct ListenConfig {
    pub ranking: String,
}

#[derive(Debug, Deserialize)]
pub struct DataConfig {
    pub contest: String,
}

#[derive(Debug, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CompilationConfig {
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
    /// Names of the built-in languages to enable; all of them if absent.
    pub languages: Option<Vec<String>>,
    /// Programs that compilation steps may invoke; unrestricted if absent.
    pub allowed_toolchains: Option<Vec<String>>,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_step_timeout_secs() -> u64 {
    10
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for CompilationConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
            languages: None,
            allowed_toolchains: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&config).context("Config is invalid")
    }
}
