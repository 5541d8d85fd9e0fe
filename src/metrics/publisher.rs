//! Gauge registration and export for resticprofile runs.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::{debug, error, info};

use super::backup::BackupMetrics;
use super::labels::{
    merge_labels, validate_label_names, Labels, COMMAND_LABEL, RUST_VERSION_LABEL, VERSION_LABEL,
};
use super::push::Pusher;
use crate::error::{MetricsError, Result};
use crate::models::{Status, Summary};

pub const NAMESPACE: &str = "resticprofile";
const COMMAND_SUBSYSTEM: &str = "command";
/// The only command whose summary feeds the backup gauges.
pub const BACKUP_COMMAND: &str = "backup";

/// Toolchain version recorded in the build info gauge.
const RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

/// Static identity of a publisher, fixed for the whole process run.
#[derive(Debug, Clone)]
pub struct Identity {
    pub profile: String,
    pub group: Option<String>,
    /// resticprofile version.
    pub version: String,
    pub restic_version: String,
    /// Extra labels from the configuration; they override profile and group.
    pub labels: Labels,
}

/// Trait for recording the outcome of executed commands.
pub trait ResultsRecorder {
    /// Records status, duration and completion time of `command`,
    /// plus the backup counters when `command` is a backup.
    fn results(&self, command: &str, status: Status, summary: &Summary);
}

/// Gauges of one profile run, held in a registry of their own.
#[derive(Clone)]
pub struct Metrics {
    labels: Labels,
    registry: Arc<Registry>,

    command_duration: GaugeVec,
    command_status: GaugeVec,
    command_time: GaugeVec,

    backup: BackupMetrics,
}

pub(crate) fn label_map(labels: &Labels) -> HashMap<&str, &str> {
    labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

fn label_names<'a>(keys: &[&'a str], extra: &[&'a str]) -> Vec<&'a str> {
    keys.iter().chain(extra).copied().collect()
}

/// Declares a gauge vector and registers it.
///
/// A descriptor the registry already knows is a programming error, so
/// registration failures abort instead of being returned.
pub(crate) fn register_gauge(
    registry: &Registry,
    opts: Opts,
    label_names: &[&str],
) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(opts, label_names)?;
    if let Err(e) = registry.register(Box::new(gauge.clone())) {
        panic!("Failed to register gauge: {}", e);
    }
    Ok(gauge)
}

impl Metrics {
    /// Creates the registry, declares every gauge and sets the build info
    /// gauges right away.
    pub fn new(identity: &Identity) -> Result<Self> {
        let labels = super::labels::identity_labels(
            &identity.profile,
            identity.group.as_deref(),
            &identity.labels,
        );
        validate_label_names(&labels)?;
        let keys: Vec<&str> = labels.keys().map(String::as_str).collect();

        let registry = Registry::new();

        let info = register_gauge(
            &registry,
            Opts::new("build_info", "resticprofile build information.").namespace(NAMESPACE),
            &label_names(&keys, &[RUST_VERSION_LABEL, VERSION_LABEL]),
        )?;
        info.with(&label_map(&merge_labels(
            labels.clone(),
            [
                (RUST_VERSION_LABEL, RUST_VERSION),
                (VERSION_LABEL, identity.version.as_str()),
            ],
        )))
        .set(1.0);

        let restic_info = register_gauge(
            &registry,
            Opts::new("restic_build_info", "restic build information."),
            &label_names(&keys, &[VERSION_LABEL]),
        )?;
        restic_info
            .with(&label_map(&merge_labels(
                labels.clone(),
                [(VERSION_LABEL, identity.restic_version.as_str())],
            )))
            .set(1.0);

        let backup = BackupMetrics::new(&registry, &keys)?;

        let command_opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(NAMESPACE)
                .subsystem(COMMAND_SUBSYSTEM)
        };
        let command_labels = label_names(&keys, &[COMMAND_LABEL]);
        let command_duration = register_gauge(
            &registry,
            command_opts("duration_seconds", "Command execute duration (in seconds)."),
            &command_labels,
        )?;
        let command_status = register_gauge(
            &registry,
            command_opts(
                "status",
                "Command execute status: 0=fail, 1=warning, 2=success.",
            ),
            &command_labels,
        )?;
        let command_time = register_gauge(
            &registry,
            command_opts("time_seconds", "Last command run timestamp (unixtime)."),
            &command_labels,
        )?;

        info!(
            event_name = "metrics.publisher.created",
            event_domain = "metrics",
            profile = identity.profile.as_str(),
            labels = ?labels,
            "metrics publisher ready"
        );

        Ok(Metrics {
            labels,
            registry: Arc::new(registry),
            command_duration,
            command_status,
            command_time,
            backup,
        })
    }

    /// Labels attached to every series.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Same as [`ResultsRecorder::results`] with an explicit completion time.
    pub fn results_at(&self, command: &str, status: Status, summary: &Summary, unix_time: i64) {
        let labels = merge_labels(self.labels.clone(), [(COMMAND_LABEL, command)]);
        let labels = label_map(&labels);

        self.command_duration
            .with(&labels)
            .set(summary.duration.as_secs_f64());
        self.command_status
            .with(&labels)
            .set(f64::from(status.ordinal()));
        self.command_time.with(&labels).set(unix_time as f64);

        if command == BACKUP_COMMAND {
            self.backup.set(&self.labels, summary);
        }

        debug!(
            event_name = "metrics.results.recorded",
            event_domain = "metrics",
            command,
            status = status.ordinal(),
            duration_seconds = summary.duration.as_secs_f64(),
            "command results recorded"
        );
    }

    /// Renders the current snapshot in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            MetricsError::Prometheus(prometheus::Error::Msg(format!(
                "metrics encoding produced invalid UTF-8: {}",
                e
            )))
        })
    }

    /// Writes the snapshot to `path`, for the node exporter textfile collector.
    ///
    /// The file is written next to its destination and renamed over it,
    /// so a collector never reads a half-written file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let result = self.render().and_then(|text| write_atomically(path, text.as_bytes()));
        match &result {
            Ok(()) => info!(
                event_name = "metrics.export.file",
                event_domain = "metrics",
                path = %path.display(),
                "metrics saved to file"
            ),
            Err(e) => error!(
                event_name = "metrics.export.file.failed",
                event_domain = "metrics",
                path = %path.display(),
                error = %e,
                "cannot save metrics to file"
            ),
        }
        result
    }

    /// Sends the snapshot to the push gateway configured in `pusher`.
    pub async fn push(&self, pusher: &Pusher) -> Result<()> {
        let result = pusher.push(&self.registry.gather()).await;
        match &result {
            Ok(()) => info!(
                event_name = "metrics.export.push",
                event_domain = "metrics",
                url = pusher.url(),
                "metrics pushed to gateway"
            ),
            Err(e) => error!(
                event_name = "metrics.export.push.failed",
                event_domain = "metrics",
                url = pusher.url(),
                error = %e,
                "cannot push metrics to gateway"
            ),
        }
        result
    }
}

impl ResultsRecorder for Metrics {
    fn results(&self, command: &str, status: Status, summary: &Summary) {
        self.results_at(command, status, summary, Utc::now().timestamp());
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let io_error = |source| MetricsError::Io {
        path: path.to_path_buf(),
        source,
    };
    let tmp = temporary_path(path);

    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(content)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(e));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)) {
            let _ = fs::remove_file(&tmp);
            return Err(io_error(e));
        }
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error(e)
    })
}
