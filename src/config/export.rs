use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the metrics go once all commands have run. Both sinks may be set.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct ExportConfig {
    /// Text file picked up by the node exporter textfile collector.
    pub save_to_file: Option<PathBuf>,
    pub push: Option<PushConfig>,
}

/// Push gateway settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PushConfig {
    pub url: String,
    /// Job name used as grouping key; defaults to the profile name.
    pub job: Option<String>,
    #[serde(default)]
    pub format: PushFormat,
    #[serde(default)]
    pub method: PushMethod,
    /// Request timeout; 0 waits without limit.
    #[serde(default = "default_push_timeout")]
    pub timeout_in_ms: u64,
}

fn default_push_timeout() -> u64 {
    30_000
}

/// Exposition format of the pushed body.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PushFormat {
    #[default]
    Text,
    Protobuf,
}

/// How the pushed snapshot is combined with what the gateway already holds.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PushMethod {
    /// POST: replaces only the metrics with the same names in the group.
    #[default]
    Add,
    /// PUT: replaces every metric in the group.
    Replace,
}
