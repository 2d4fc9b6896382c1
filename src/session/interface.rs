//! Session state, connection lifecycle and command fan-out.

use super::{SessionError, SessionStats, SettingsReport};
use crate::connection::HostConnection;
use crate::hosts::{ClientConfig, FileConfig, HostEntry, HostSelection, HostTable};
use crate::protocol::{aggregate, Aggregate, Command, HostReply, ReplyOutcome};
use crate::settings::{CameraSettings, ExposureSettings};
use futures::future::{join_all, try_join_all};
use std::path::Path;
use std::time::Instant;

/// Client-side interface to one camera served by one or more camerad hosts.
pub struct Session {
    hosts: HostTable,
    config: ClientConfig,
    connections: Vec<HostConnection>,
    /// Hosts dropped after a lost reply, until the next connect.
    lost: Vec<String>,
    pub(super) camera: CameraSettings,
    pub(super) exposure: ExposureSettings,
    stats: SessionStats,
}

impl Session {
    /// Creates a disconnected session.
    pub fn new(hosts: HostTable, config: ClientConfig) -> Self {
        Self {
            hosts,
            config,
            connections: Vec::new(),
            lost: Vec::new(),
            camera: CameraSettings::default(),
            exposure: ExposureSettings::default(),
            stats: SessionStats::default(),
        }
    }

    /// Creates a disconnected session from a host configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let config = FileConfig::from_file(path)?;
        Ok(Self::new(config.host_table()?, config.client))
    }

    /// Enables or disables verbose logging of host traffic.
    pub fn set_verbosity(&mut self, verbose: bool) {
        self.config.verbose = verbose;
        for conn in &mut self.connections {
            conn.set_verbose(verbose);
        }
        if verbose {
            tracing::info!("Verbose is on");
        }
    }

    /// Returns true if at least one host is connected.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Hosts whose connection was dropped because a reply went missing.
    pub fn lost_hosts(&self) -> &[String] {
        &self.lost
    }

    /// The configured host table.
    pub fn hosts(&self) -> &HostTable {
        &self.hosts
    }

    /// Hosts with an open connection, in send order.
    pub fn connected_hosts(&self) -> Vec<&HostEntry> {
        self.connections.iter().map(HostConnection::entry).collect()
    }

    /// Current local camera settings.
    pub fn camera_settings(&self) -> &CameraSettings {
        &self.camera
    }

    /// Current local exposure settings.
    pub fn exposure_settings(&self) -> &ExposureSettings {
        &self.exposure
    }

    /// Snapshot of the observation settings for display.
    pub fn settings(&self) -> SettingsReport {
        SettingsReport {
            camera: self.camera.clone(),
            exposure: self.exposure.clone(),
        }
    }

    /// Command counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Opens sockets to the selected hosts, replacing any open ones.
    pub async fn connect(&mut self, selection: &HostSelection) -> Result<(), SessionError> {
        let entries = self.hosts.select(selection)?;
        self.disconnect().await;

        tracing::debug!(count = entries.len(), "Connecting to camerad hosts");
        let config = &self.config;
        self.connections =
            try_join_all(entries.iter().map(|entry| HostConnection::connect(entry, config))).await?;
        self.stats.connected_hosts = self.connections.len();
        Ok(())
    }

    /// Shuts down every open socket without sending anything.
    pub async fn disconnect(&mut self) {
        let connections = std::mem::take(&mut self.connections);
        join_all(connections.into_iter().map(HostConnection::shutdown)).await;
        self.lost.clear();
        self.stats.connected_hosts = 0;
        self.stats.lost_hosts = 0;
    }

    /// Drops the connections at `indices`.
    ///
    /// A late reply on one of these sockets would be read as the answer
    /// to the next command, so they are closed rather than reused.
    async fn drop_connections(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.connections)
            .into_iter()
            .enumerate()
            .partition(|(index, _)| indices.contains(index));
        self.connections = kept.into_iter().map(|(_, conn)| conn).collect();

        for (_, conn) in dropped {
            tracing::warn!(host = %conn.entry().name, "Dropping connection after lost reply");
            self.lost.push(conn.entry().name.clone());
            conn.shutdown().await;
        }
        self.stats.connected_hosts = self.connections.len();
        self.stats.lost_hosts = self.lost.len();
    }

    /// Sends a command to every connected host and combines the replies.
    ///
    /// Returns the common return value when every host completed with
    /// the same value.
    pub async fn send_command(&mut self, command: Command) -> Result<String, SessionError> {
        if command.is_empty() {
            return Err(SessionError::EmptyCommand);
        }
        if let Some(word) = command.line_break_word() {
            return Err(SessionError::LineBreak(word.to_string()));
        }
        if !self.lost.is_empty() {
            tracing::error!(command = %command, hosts = ?self.lost, "Hosts out of sync");
            return Err(SessionError::HostsLost {
                hosts: self.lost.clone(),
            });
        }
        if self.connections.is_empty() {
            tracing::error!(command = %command, "No connected sockets");
            return Err(SessionError::NotConnected);
        }

        let started = Instant::now();
        self.stats.commands_sent += 1;

        let results = join_all(self.connections.iter_mut().map(|conn| {
            let command = &command;
            async move {
                let host = conn.entry().name.clone();
                conn.transact(command).await.map(|reply| HostReply::new(host, reply))
            }
        }))
        .await;

        self.stats.last_command_latency = Some(started.elapsed());

        let mut replies = Vec::with_capacity(results.len());
        let mut stale = Vec::new();
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(reply) => {
                    match reply.reply.outcome() {
                        ReplyOutcome::TimedOut => {
                            self.stats.reply_timeouts += 1;
                            stale.push(index);
                        }
                        ReplyOutcome::Closed => stale.push(index),
                        ReplyOutcome::Complete | ReplyOutcome::Incomplete => {}
                    }
                    replies.push(reply);
                }
                Err(e) => {
                    stale.push(index);
                    first_error.get_or_insert(e);
                }
            }
        }
        self.drop_connections(&stale).await;

        if let Some(e) = first_error {
            self.stats.command_failures += 1;
            tracing::error!(command = %command, error = %e, "Error sending command");
            return Err(e.into());
        }

        match aggregate(&replies) {
            Aggregate::Agreed(value) => {
                for r in &replies {
                    tracing::debug!(host = %r.host, "Complete");
                }
                Ok(value)
            }
            Aggregate::Divergent(values) => {
                self.stats.command_failures += 1;
                self.stats.divergent_replies += 1;
                tracing::error!(command = %command, ?values, "Different return values");
                Err(SessionError::DivergentReplies {
                    command: command.to_string(),
                    values,
                })
            }
            Aggregate::Failed(hosts) => {
                self.stats.command_failures += 1;
                tracing::error!(command = %command, ?hosts, "Error sending command");
                Err(SessionError::CommandFailed {
                    command: command.to_string(),
                    hosts,
                })
            }
        }
    }

    /// Sends a raw command given as words.
    pub async fn send<I, T>(&mut self, words: I) -> Result<String, SessionError>
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        self.send_command(Command::from_words(words)).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("hosts", &self.hosts.len())
            .field("connected", &self.connections.len())
            .field("camera", &self.camera)
            .field("exposure", &self.exposure)
            .finish()
    }
}
