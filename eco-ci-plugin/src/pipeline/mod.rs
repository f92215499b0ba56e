//! Types exchanged with the host pipeline that invokes the plugin.

use std::collections::BTreeMap;

use green_coding_client::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One observation window, with whatever extra fields the host attached.
pub type PluginParams = Map<String, Value>;

/// Untyped plugin configuration as handed over by the host.
pub type ConfigParams = Map<String, Value>;

/// Renames output keys: `{ canonical name => output name }`.
pub type OutputMapping = BTreeMap<String, String>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("config error: {0}")]
    Config(String),
    #[error("input validation error in input[{index}]: {message}")]
    InputValidation { index: usize, message: String },
    #[error("remote data error: {0}")]
    RemoteData(String),
}

impl From<ApiError> for PluginError {
    fn from(e: ApiError) -> Self {
        PluginError::RemoteData(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationMethod {
    pub time: String,
    pub component: String,
}

impl AggregationMethod {
    pub fn sum() -> Self {
        Self {
            time: "sum".to_string(),
            component: "sum".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub description: String,
    pub unit: String,
    #[serde(rename = "aggregation-method")]
    pub aggregation_method: AggregationMethod,
}

/// Caller-supplied overrides for declared inputs/outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginParametersMetadata {
    #[serde(default)]
    pub inputs: BTreeMap<String, ParameterMetadata>,
    #[serde(default)]
    pub outputs: BTreeMap<String, ParameterMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub kind: String,
    pub inputs: BTreeMap<String, ParameterMetadata>,
    pub outputs: BTreeMap<String, ParameterMetadata>,
}

/// A plugin the host can run over an ordered list of observations.
#[async_trait::async_trait]
pub trait ExecutePlugin: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    /// Returns exactly one output per input, in input order.
    async fn execute(
        &self,
        inputs: Vec<PluginParams>,
        config: Option<&ConfigParams>,
        output_mapping: Option<&OutputMapping>,
    ) -> Result<Vec<PluginParams>, PluginError>;
}
