//! Camera host table and client configuration.
//!
//! A logical camera may be served by several camerad processes, typically
//! one per CCD controller. This module describes where they live and how
//! long the client waits on them.

mod config;
mod table;

pub use config::{ClientConfig, ConfigError, FileConfig};
pub use table::{HostEntry, HostSelection, HostTable, DEFAULT_PORT};
