//! Session errors.

use crate::connection::ConnectionError;
use crate::hosts::ConfigError;
use crate::magicboard::BoardError;
use crate::settings::SettingsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by camera operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No host is connected.
    #[error("no connected sockets")]
    NotConnected,
    /// Nothing to send.
    #[error("empty command")]
    EmptyCommand,
    /// A command word contains `\r` or `\n`.
    #[error("line break in command word {0:?}")]
    LineBreak(String),
    /// Empty or all-whitespace basename.
    #[error("basename cannot be empty")]
    EmptyBasename,
    /// Basename with embedded whitespace.
    #[error("basename {0:?} contains whitespace")]
    InvalidBasename(String),
    /// Empty mode, or one with whitespace.
    #[error("mode {0:?} must be a single word")]
    InvalidMode(String),
    /// Connections were dropped after a missing reply.
    #[error("lost reply sync with {}; reconnect first", .hosts.join(", "))]
    HostsLost {
        /// Dropped hosts.
        hosts: Vec<String>,
    },
    /// Some hosts did not answer `DONE`.
    #[error("'{command}' not completed by: {}", .hosts.join(", "))]
    CommandFailed {
        /// The command as sent.
        command: String,
        /// Hosts that did not complete.
        hosts: Vec<String>,
    },
    /// Hosts returned different values.
    #[error("'{command}' returned different values: {}", format_values(.values))]
    DivergentReplies {
        /// The command as sent.
        command: String,
        /// Host name and returned value, per host.
        values: Vec<(String, String)>,
    },
    /// A path could not be made absolute.
    #[error("cannot resolve path {path}: {source}")]
    Path {
        /// The path after `~` expansion.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Host configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Network failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// Invalid setting.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Bad magic board input.
    #[error(transparent)]
    Board(#[from] BoardError),
}

fn format_values(values: &[(String, String)]) -> String {
    values
        .iter()
        .map(|(host, value)| format!("{host}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
