/*
[INPUT]:  Optional YAML file plus TASKPAD_* environment variables
[OUTPUT]: Layered CLI configuration and the derived ClientConfig
[POS]:    Configuration layer - connection and credential defaults
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use taskpad_client::ClientConfig;

pub const ENV_PREFIX: &str = "TASKPAD";

/// Settings for the `taskpad` binary.
///
/// Every key is optional; anything absent falls back to the client defaults
/// or to an interactive prompt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Backend base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Stored password; prompted for when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Display name used by `register`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,
}

impl CliConfig {
    /// `<config_dir>/taskpad/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskpad").join("config.yaml"))
    }

    /// Layer the YAML file (if it exists) under `TASKPAD_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(false));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parse YAML configuration")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serialize configuration to YAML")
    }

    /// Client settings, with unset keys left at their defaults
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = self.api_url.as_deref().filter(|url| !url.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.refresh_interval_secs {
            config = config.with_refresh_interval(Duration::from_secs(secs));
        }
        config
    }
}
