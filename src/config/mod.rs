// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod export;
pub mod logging;
pub mod types;

pub use export::*;
pub use logging::*;
pub use types::*;
