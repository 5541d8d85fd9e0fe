use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building or exporting metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid label name '{0}'")]
    InvalidLabelName(String),

    #[error("label '{0}' is reserved by the metrics publisher")]
    ReservedLabel(String),

    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("cannot write metrics to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid push gateway url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("error pushing metrics to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("push gateway {url} answered with status {status}: {body}")]
    PushRejected { url: String, status: u16, body: String },

    #[error("pushed metric {metric} already contains grouping label {label}")]
    GroupingLabelCollision { metric: String, label: String },

    #[error("cannot read run report: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
