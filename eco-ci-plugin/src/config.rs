use serde::Deserialize;
use std::fs;

use green_coding_client::GreenCodingApi;

use crate::pipeline::{ConfigParams, OutputMapping};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    GreenCodingApi::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for the `eco-ci` binary.
///
/// `plugin` is handed to the plugin untouched; dates in it should be
/// quoted strings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    pub plugin: ConfigParams,
    #[serde(default)]
    pub output_mapping: Option<OutputMapping>,
}

impl AppConfig {
    /// Read the file named by `ECO_CI_CONFIG`, or `./eco-ci.toml`.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ECO_CI_CONFIG").unwrap_or_else(|_| "eco-ci.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
