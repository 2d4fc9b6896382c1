//! HTTP endpoints for Prometheus scrapes and camera health.
//!
//! - `GET /metrics` serves the registry in Prometheus text format.
//! - `GET /health` serves a JSON summary of the session. It answers 503
//!   while no camerad host is connected or a host has been lost.

use super::{MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Port used when none is given.
pub const DEFAULT_METRICS_PORT: u16 = 9187;

/// Errors from running the HTTP endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is unavailable.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("metrics server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Where the endpoint listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Listens on every interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: (Ipv4Addr::UNSPECIFIED, port).into(),
        }
    }
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_METRICS_PORT)
    }
}

/// Overall session condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every host is connected and in sync.
    Ok,
    /// A host was dropped after a missing reply; commands fail until reconnect.
    Degraded,
    /// No camerad host is connected.
    Disconnected,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Overall condition.
    pub status: HealthStatus,
    /// Hosts with an open connection.
    pub connected_hosts: usize,
    /// Hosts dropped after a missing reply.
    pub lost_hosts: usize,
    /// Commands sent so far.
    pub commands_sent: u64,
    /// Commands that failed so far.
    pub command_failures: u64,
    /// Round-trip time of the latest command.
    pub last_latency_secs: Option<f64>,
}

impl HealthReport {
    /// Summarizes a snapshot.
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let status = if snapshot.lost_hosts > 0 {
            HealthStatus::Degraded
        } else if snapshot.connected_hosts == 0 {
            HealthStatus::Disconnected
        } else {
            HealthStatus::Ok
        };
        Self {
            status,
            connected_hosts: snapshot.connected_hosts,
            lost_hosts: snapshot.lost_hosts,
            commands_sent: snapshot.commands_sent,
            command_failures: snapshot.command_failures,
            last_latency_secs: snapshot.last_latency_secs,
        }
    }

    /// HTTP status for this report.
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Ok => StatusCode::OK,
            HealthStatus::Degraded | HealthStatus::Disconnected => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Registry plus the latest session snapshot.
pub struct MetricsState {
    registry: MetricsRegistry,
    snapshot: MetricsSnapshot,
}

impl MetricsState {
    /// Starts from an empty (disconnected) snapshot.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            snapshot: MetricsSnapshot::default(),
        }
    }

    /// Records the latest session counters.
    pub fn update(&mut self, snapshot: MetricsSnapshot) {
        self.registry.update(&snapshot);
        self.snapshot = snapshot;
    }

    /// Health summary of the latest snapshot.
    pub fn health(&self) -> HealthReport {
        HealthReport::from_snapshot(&self.snapshot)
    }
}

/// State shared between the shell loop and the HTTP handlers.
pub type SharedMetrics = Arc<RwLock<MetricsState>>;

/// Routes for `/metrics` and `/health`.
pub fn router(state: SharedMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until the task is dropped.
pub async fn serve(config: MetricsServerConfig, state: SharedMetrics) -> Result<(), ServerError> {
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(addr = %addr, "Serving metrics");
    axum::serve(listener, router(state))
        .await
        .map_err(ServerError::Serve)
}

async fn metrics_handler(State(state): State<SharedMetrics>) -> Response {
    match state.read().await.registry.encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_handler(State(state): State<SharedMetrics>) -> Response {
    let report = state.read().await.health();
    (report.status_code(), Json(report)).into_response()
}
