pub mod aggregate;
pub mod config;
pub mod observability;
pub mod pipeline;
pub mod plugin;
pub mod range;
pub mod validation;

pub use pipeline::{ConfigParams, ExecutePlugin, OutputMapping, PluginError, PluginParams};
pub use plugin::EcoCi;
