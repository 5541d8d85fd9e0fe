//! Prometheus metrics for resticprofile runs.
//!
//! Gauges live in a registry owned by each [`Metrics`] instance and are
//! exported either to a text file or to a push gateway.

pub mod backup;
pub mod labels;
pub mod publisher;
pub mod push;

pub use labels::{identity_labels, merge_labels, Labels};
pub use publisher::{Identity, Metrics, ResultsRecorder};
pub use push::Pusher;
