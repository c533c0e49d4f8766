//! Logging setup and run summaries.

mod logging;
mod summary;

pub use logging::setup_logging;
pub use summary::RunSummary;
