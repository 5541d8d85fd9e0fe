//! Library exports for resticprofile-metrics, shared between the binary and tests.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod startup;
pub mod utils;
