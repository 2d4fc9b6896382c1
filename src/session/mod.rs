//! The camera interface.
//!
//! A [`Session`] owns the connections to every camerad host serving one
//! camera, a local mirror of the settings it has requested, and counters
//! for the metrics exporter. Commands go to all hosts at once and the
//! replies must agree.

mod error;
mod interface;
mod operations;
mod options;
mod report;
mod stats;

pub use error::SessionError;
pub use interface::Session;
pub use operations::{expand_path, image_name};
pub use options::{LoadOptions, OpenOptions};
pub use report::SettingsReport;
pub use stats::SessionStats;
