//! Gauges fed by the summary of a `backup` command.

use prometheus::{GaugeVec, Opts, Registry};

use super::publisher::{label_map, register_gauge, NAMESPACE};
use super::labels::Labels;
use crate::error::Result;
use crate::models::Summary;

const SUBSYSTEM: &str = "backup";

#[derive(Clone)]
pub struct BackupMetrics {
    files_new: GaugeVec,
    files_changed: GaugeVec,
    files_unmodified: GaugeVec,
    dir_new: GaugeVec,
    dir_changed: GaugeVec,
    dir_unmodified: GaugeVec,
    files_total: GaugeVec,
    bytes_added: GaugeVec,
    bytes_added_packed: GaugeVec,
    bytes_total: GaugeVec,
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(SUBSYSTEM)
}

impl BackupMetrics {
    pub fn new(registry: &Registry, label_names: &[&str]) -> Result<Self> {
        let gauge = |name: &str, help: &str| register_gauge(registry, opts(name, help), label_names);

        Ok(BackupMetrics {
            files_new: gauge("files_new", "Number of new files added to the backup.")?,
            files_changed: gauge("files_changed", "Number of files with changes.")?,
            files_unmodified: gauge(
                "files_unmodified",
                "Number of files unmodified since last backup.",
            )?,
            dir_new: gauge("dir_new", "Number of new directories added to the backup.")?,
            dir_changed: gauge("dir_changed", "Number of directories with changes.")?,
            dir_unmodified: gauge(
                "dir_unmodified",
                "Number of directories unmodified since last backup.",
            )?,
            files_total: gauge(
                "files_processed",
                "Total number of files scanned by the backup for changes.",
            )?,
            bytes_added: gauge(
                "added_bytes",
                "Total number of bytes added to the repository.",
            )?,
            bytes_added_packed: gauge(
                "added_bytes_packed",
                "Total number of bytes added to the repository after compression.",
            )?,
            bytes_total: gauge("processed_bytes", "Total number of bytes scanned for changes.")?,
        })
    }

    /// Overwrites every backup gauge of the `labels` series with `summary`.
    pub fn set(&self, labels: &Labels, summary: &Summary) {
        let labels = label_map(labels);

        self.files_new.with(&labels).set(summary.files_new as f64);
        self.files_changed.with(&labels).set(summary.files_changed as f64);
        self.files_unmodified
            .with(&labels)
            .set(summary.files_unmodified as f64);

        self.dir_new.with(&labels).set(summary.dirs_new as f64);
        self.dir_changed.with(&labels).set(summary.dirs_changed as f64);
        self.dir_unmodified
            .with(&labels)
            .set(summary.dirs_unmodified as f64);

        self.files_total.with(&labels).set(summary.files_total as f64);
        self.bytes_added.with(&labels).set(summary.bytes_added as f64);
        self.bytes_added_packed
            .with(&labels)
            .set(summary.bytes_added_packed as f64);
        self.bytes_total.with(&labels).set(summary.bytes_total as f64);
    }
}
