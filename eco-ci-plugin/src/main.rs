use anyhow::{bail, Context, Result};
use eco_ci_plugin::{config::AppConfig, observability, pipeline::PluginParams, EcoCi, ExecutePlugin};
use green_coding_client::GreenCodingApi;
use std::{env, fs, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: eco-ci <inputs_json_path>");
    }
    let inputs_path = &args[1];

    let cfg = AppConfig::load()?;

    let contents =
        fs::read_to_string(inputs_path).with_context(|| format!("failed to read inputs from {inputs_path}"))?;
    let inputs: Vec<PluginParams> =
        serde_json::from_str(&contents).with_context(|| format!("{inputs_path} is not a JSON array of objects"))?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.api.timeout_secs))
        .build()?;
    let api = GreenCodingApi::new(http, &cfg.api.base_url)?;
    let plugin = EcoCi::new(api, None);

    let outputs = plugin
        .execute(inputs, Some(&cfg.plugin), cfg.output_mapping.as_ref())
        .await?;

    println!("{}", serde_json::to_string_pretty(&outputs)?);

    Ok(())
}
