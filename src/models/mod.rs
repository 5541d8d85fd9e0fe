// Domain inputs handed over by the backup engine.
pub mod report;
pub mod status;
pub mod summary;

pub use report::*;
pub use status::*;
pub use summary::*;
