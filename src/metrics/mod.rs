//! Prometheus metrics for camerad traffic.
//!
//! # Metrics Exposed
//!
//! - `camerad_client_commands_total` - Commands sent
//! - `camerad_client_command_failures_total` - Commands not completed by every host
//! - `camerad_client_divergent_replies_total` - Commands whose hosts disagreed
//! - `camerad_client_reply_timeouts_total` - Host replies that timed out
//! - `camerad_client_connected_hosts` - Hosts currently connected
//! - `camerad_client_lost_hosts` - Hosts dropped after a missing reply
//! - `camerad_client_last_command_latency_seconds` - Latest round-trip time
//!
//! # Example
//!
//! ```no_run
//! use camerad_client::metrics::{MetricsRegistry, MetricsSnapshot};
//! use camerad_client::session::SessionStats;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot::from_stats(&SessionStats::default()));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{
    router, serve, HealthReport, HealthStatus, MetricsServerConfig, MetricsState, ServerError,
    SharedMetrics, DEFAULT_METRICS_PORT,
};
