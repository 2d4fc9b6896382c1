//! Command counters.

use std::time::Duration;

/// Running totals for one session, fed to the metrics exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands sent (each counted once regardless of host count).
    pub commands_sent: u64,
    /// Commands that did not complete on every host.
    pub command_failures: u64,
    /// Commands whose hosts returned different values.
    pub divergent_replies: u64,
    /// Individual host replies that timed out.
    pub reply_timeouts: u64,
    /// Hosts currently connected.
    pub connected_hosts: usize,
    /// Hosts dropped after a missing reply and not yet reconnected.
    pub lost_hosts: usize,
    /// Round-trip time of the most recent command.
    pub last_command_latency: Option<Duration>,
}
