//! Run orchestration: build the publisher, record results, export.

use std::fs::File;
use std::io::{self, BufReader};

use tracing::warn;

use crate::config::{ConfigV1, ExportConfig};
use crate::error::{MetricsError, Result};
use crate::metrics::{Identity, Metrics, Pusher, ResultsRecorder};
use crate::models::CommandResult;
use crate::utils::value::value_to_string;

/// Identity of this run: configured profile, group and labels, with the
/// version of this build.
pub fn identity_from_config(config: &ConfigV1) -> Identity {
    Identity {
        profile: config.profile.clone(),
        group: config.group.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        restic_version: config.restic_version.clone(),
        labels: config
            .labels
            .iter()
            .map(|(name, value)| (name.clone(), value_to_string(value)))
            .collect(),
    }
}

/// Reads a JSON array of command results from `path`, or stdin for `-`.
pub fn read_report(path: &str) -> Result<Vec<CommandResult>> {
    let parsed = if path == "-" {
        serde_json::from_reader(io::stdin().lock())
    } else {
        let file = File::open(path)
            .map_err(|e| MetricsError::Report(format!("cannot open {}: {}", path, e)))?;
        serde_json::from_reader(BufReader::new(file))
    };
    parsed.map_err(|e| MetricsError::Report(e.to_string()))
}

/// Replays `results` in order into `recorder`.
pub fn record_all<R: ResultsRecorder>(recorder: &R, results: &[CommandResult]) {
    for result in results {
        recorder.results(&result.command, result.status, &result.summary);
    }
}

/// Sends the snapshot to every configured sink.
///
/// A failing sink does not prevent the other from running; the first
/// error is returned.
pub async fn export(metrics: &Metrics, export: &ExportConfig, default_job: &str) -> Result<()> {
    if export.save_to_file.is_none() && export.push.is_none() {
        warn!(
            event_name = "metrics.export.none",
            event_domain = "metrics",
            "no export configured, metrics are discarded"
        );
        return Ok(());
    }

    let mut first_error = None;
    if let Some(path) = &export.save_to_file {
        if let Err(e) = metrics.save_to(path) {
            first_error.get_or_insert(e);
        }
    }
    if let Some(push) = &export.push {
        let pushed = match Pusher::new(push, default_job) {
            Ok(pusher) => metrics.push(&pusher).await,
            Err(e) => Err(e),
        };
        if let Err(e) = pushed {
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Records `results` in order, then exports.
///
/// # Errors
///
/// Returns an error if the configured labels are invalid or an export fails.
pub async fn run(config: &ConfigV1, results: &[CommandResult]) -> Result<Metrics> {
    let metrics = Metrics::new(&identity_from_config(config))?;
    record_all(&metrics, results);
    export(&metrics, &config.export, &config.profile).await?;
    Ok(metrics)
}
