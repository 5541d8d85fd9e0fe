use std::collections::BTreeMap;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::export::ExportConfig;
use super::logging::LoggingConfig;
use crate::utils::value::value_to_string;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "RESTICPROFILE_METRICS_CONFIG";
/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "RESTICPROFILE_METRICS_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: profile identity, extra labels and export targets.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(deserialize_with = "scalar_string")]
    pub profile: String,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub group: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub restic_version: String,
    /// Extra labels attached to every series. Scalar values are stringified.
    #[serde(default)]
    pub labels: BTreeMap<String, Value>,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Numbers and booleans from YAML or the environment are taken as their text.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

fn optional_scalar_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.map(|value| value_to_string(&value)))
}

/// Builds the figment used to load the configuration: the YAML file first,
/// then prefixed environment variables on top (`__` separates nested keys).
pub fn build_figment(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
}

/// Extract a versioned config from a figment.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from the file named by `RESTICPROFILE_METRICS_CONFIG`,
/// or "config.yaml" in the current directory.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    match extract_config(&build_figment(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
