use std::collections::BTreeMap;

use green_coding_client::{MetricsApi, RemoteMetricsClient};
use serde_json::Value;

use crate::aggregate::{aggregate, AggregatedMetrics, Window};
use crate::pipeline::{
    AggregationMethod, ConfigParams, ExecutePlugin, OutputMapping, ParameterMetadata, PluginError,
    PluginMetadata, PluginParametersMetadata, PluginParams,
};
use crate::range;
use crate::validation::{validate_config, validate_input};

pub const ENERGY: &str = "energy";
pub const CARBON: &str = "carbon";

/// Annotates each observation window with the energy and carbon the CI
/// workflow used during it.
#[derive(Debug)]
pub struct EcoCi<A> {
    client: RemoteMetricsClient<A>,
    metadata: PluginMetadata,
}

impl<A: MetricsApi> EcoCi<A> {
    pub fn new(api: A, parameters_metadata: Option<PluginParametersMetadata>) -> Self {
        Self {
            client: RemoteMetricsClient::new(api),
            metadata: build_metadata(parameters_metadata),
        }
    }

    pub fn api(&self) -> &A {
        self.client.api()
    }

    /// Validate, fetch once, then aggregate per input.
    ///
    /// Nothing is fetched unless config and every input validate.
    pub async fn run(
        &self,
        inputs: Vec<PluginParams>,
        config: Option<&ConfigParams>,
        output_mapping: Option<&OutputMapping>,
    ) -> Result<Vec<PluginParams>, PluginError> {
        let config = validate_config(config)?;

        let observations = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| validate_input(input, index))
            .collect::<Result<Vec<_>, _>>()?;

        let resolved = range::resolve(&config, &observations)?;
        if observations.is_empty() {
            return Ok(Vec::new());
        }

        let query = range::query_for(&config, &resolved);
        let rows = self.client.fetch(&query).await?;

        tracing::info!(
            repo = %config.repo,
            branch = %config.branch,
            inputs = inputs.len(),
            rows = rows.len(),
            "fetched ci measurements"
        );

        let energy_key = output_key(output_mapping, ENERGY);
        let carbon_key = output_key(output_mapping, CARBON);

        inputs
            .into_iter()
            .zip(&observations)
            .enumerate()
            .map(|(index, (mut output, observation))| -> Result<PluginParams, PluginError> {
                let window = Window::for_input(&config, observation, index)?;
                let AggregatedMetrics { energy, carbon } = aggregate(&rows, &window);

                output.insert(energy_key.to_string(), Value::from(energy));
                output.insert(carbon_key.to_string(), Value::from(carbon));
                Ok(output)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<A: MetricsApi> ExecutePlugin for EcoCi<A> {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn execute(
        &self,
        inputs: Vec<PluginParams>,
        config: Option<&ConfigParams>,
        output_mapping: Option<&OutputMapping>,
    ) -> Result<Vec<PluginParams>, PluginError> {
        self.run(inputs, config, output_mapping).await
    }
}

fn output_key<'a>(mapping: Option<&'a OutputMapping>, canonical: &'a str) -> &'a str {
    mapping
        .and_then(|m| m.get(canonical))
        .map_or(canonical, String::as_str)
}

fn build_metadata(parameters_metadata: Option<PluginParametersMetadata>) -> PluginMetadata {
    let PluginParametersMetadata { inputs, outputs } = parameters_metadata.unwrap_or_default();

    let outputs = if outputs.is_empty() {
        default_outputs()
    } else {
        outputs
    };

    PluginMetadata {
        kind: "execute".to_string(),
        inputs,
        outputs,
    }
}

fn default_outputs() -> BTreeMap<String, ParameterMetadata> {
    BTreeMap::from([
        (
            CARBON.to_string(),
            ParameterMetadata {
                description: "the used carbon in running the workflow".to_string(),
                unit: "gCO2eq".to_string(),
                aggregation_method: AggregationMethod::sum(),
            },
        ),
        (
            ENERGY.to_string(),
            ParameterMetadata {
                description: "the used energy in running the workflow".to_string(),
                unit: "kWh".to_string(),
                aggregation_method: AggregationMethod::sum(),
            },
        ),
    ])
}
