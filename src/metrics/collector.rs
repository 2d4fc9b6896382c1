//! Metrics collection and registry.

use crate::session::SessionStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric creation or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Total commands sent.
    pub commands_sent: u64,
    /// Total commands that failed on at least one host.
    pub command_failures: u64,
    /// Total commands whose hosts disagreed.
    pub divergent_replies: u64,
    /// Total host replies that timed out.
    pub reply_timeouts: u64,
    /// Hosts currently connected.
    pub connected_hosts: usize,
    /// Hosts dropped after a missing reply.
    pub lost_hosts: usize,
    /// Latency of the latest command in seconds.
    pub last_latency_secs: Option<f64>,
}

/// Prometheus metrics registry for camerad traffic.
pub struct MetricsRegistry {
    registry: Registry,

    commands_total: IntCounter,
    command_failures_total: IntCounter,
    divergent_replies_total: IntCounter,
    reply_timeouts_total: IntCounter,

    connected_hosts: IntGauge,
    lost_hosts: IntGauge,
    last_command_latency: Gauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all client metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let commands_total = IntCounter::new(
            "camerad_client_commands_total",
            "Total number of commands sent to camerad",
        )?;
        let command_failures_total = IntCounter::new(
            "camerad_client_command_failures_total",
            "Commands not completed by every connected host",
        )?;
        let divergent_replies_total = IntCounter::new(
            "camerad_client_divergent_replies_total",
            "Commands whose hosts returned different values",
        )?;
        let reply_timeouts_total = IntCounter::new(
            "camerad_client_reply_timeouts_total",
            "Host replies that timed out",
        )?;
        let connected_hosts = IntGauge::new(
            "camerad_client_connected_hosts",
            "Number of camerad hosts currently connected",
        )?;
        let lost_hosts = IntGauge::new(
            "camerad_client_lost_hosts",
            "Hosts dropped after a missing reply, awaiting reconnect",
        )?;
        let last_command_latency = Gauge::new(
            "camerad_client_last_command_latency_seconds",
            "Round-trip time of the most recent command",
        )?;

        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(command_failures_total.clone()))?;
        registry.register(Box::new(divergent_replies_total.clone()))?;
        registry.register(Box::new(reply_timeouts_total.clone()))?;
        registry.register(Box::new(connected_hosts.clone()))?;
        registry.register(Box::new(lost_hosts.clone()))?;
        registry.register(Box::new(last_command_latency.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            command_failures_total,
            divergent_replies_total,
            reply_timeouts_total,
            connected_hosts,
            lost_hosts,
            last_command_latency,
        })
    }

    /// Updates all metrics from a snapshot of session state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, so add the difference
        advance(&self.commands_total, snapshot.commands_sent);
        advance(&self.command_failures_total, snapshot.command_failures);
        advance(&self.divergent_replies_total, snapshot.divergent_replies);
        advance(&self.reply_timeouts_total, snapshot.reply_timeouts);

        self.connected_hosts.set(snapshot.connected_hosts as i64);
        self.lost_hosts.set(snapshot.lost_hosts as i64);
        if let Some(latency) = snapshot.last_latency_secs {
            self.last_command_latency.set(latency);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from session counters.
    pub fn from_stats(stats: &SessionStats) -> Self {
        Self {
            commands_sent: stats.commands_sent,
            command_failures: stats.command_failures,
            divergent_replies: stats.divergent_replies,
            reply_timeouts: stats.reply_timeouts,
            connected_hosts: stats.connected_hosts,
            lost_hosts: stats.lost_hosts,
            last_latency_secs: stats.last_command_latency.map(|d| d.as_secs_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let stats = SessionStats {
            commands_sent: 12,
            command_failures: 2,
            divergent_replies: 1,
            reply_timeouts: 1,
            connected_hosts: 4,
            lost_hosts: 1,
            last_command_latency: Some(Duration::from_millis(250)),
        };
        registry.update(&MetricsSnapshot::from_stats(&stats));

        let output = registry.encode().unwrap();
        assert!(output.contains("camerad_client_commands_total 12"));
        assert!(output.contains("camerad_client_command_failures_total 2"));
        assert!(output.contains("camerad_client_connected_hosts 4"));
        assert!(output.contains("camerad_client_lost_hosts 1"));
        assert!(output.contains("camerad_client_last_command_latency_seconds 0.25"));
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot {
            commands_sent: 5,
            ..Default::default()
        });
        // a fresh session starts counting from zero again
        registry.update(&MetricsSnapshot::default());

        let output = registry.encode().unwrap();
        assert!(output.contains("camerad_client_commands_total 5"));
        assert!(output.contains("camerad_client_connected_hosts 0"));
    }
}
