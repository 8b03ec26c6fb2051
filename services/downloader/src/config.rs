//! Configuration loading for helio-fetch.
//!
//! An optional YAML file sets mirror hosts and download behaviour. Every
//! field has a default, so an empty file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dataretriever::XrsClientConfig;
use serde::Deserialize;
use tracing::debug;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchConfig {
    /// Archive hosts for the XRS client.
    #[serde(default)]
    pub mirrors: XrsClientConfig,
    #[serde(default)]
    pub download: DownloadSettings,
}

/// Download behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay; doubles on each retry.
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Local path template, relative to `output_dir`.
    #[serde(default = "default_path_template")]
    pub path_template: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_retry_delay_ms() -> u64 {
    2_000
}

fn default_max_retry_delay_ms() -> u64 {
    120_000
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_max_concurrent() -> usize {
    4
}

fn default_path_template() -> String {
    "{instrument}/{file}".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            path_template: default_path_template(),
            output_dir: default_output_dir(),
        }
    }
}

impl DownloadSettings {
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FetchConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: FetchConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded fetch config");
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
