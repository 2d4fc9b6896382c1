//! A single camerad connection.

use crate::hosts::{ClientConfig, HostEntry};
use crate::protocol::{is_terminated, Command, Reply};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const READ_CHUNK: usize = 1024;

/// Errors that can occur on a host connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The TCP connect failed.
    #[error("failed to connect to {host}: {source}")]
    Connect {
        /// Host name.
        host: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// No connection within the connect timeout.
    #[error("timed out connecting to {host} after {after:?}")]
    ConnectTimeout {
        /// Host name.
        host: String,
        /// Timeout that expired.
        after: Duration,
    },
    /// Reading or writing an open connection failed.
    #[error("i/o error on {host}: {source}")]
    Io {
        /// Host name.
        host: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// An open command connection to one camerad host.
#[derive(Debug)]
pub struct HostConnection {
    entry: HostEntry,
    stream: TcpStream,
    reply_timeout: Duration,
    verbose: bool,
    /// Bytes received after the end of the previous reply.
    pending: Vec<u8>,
}

impl HostConnection {
    /// Opens a TCP connection to the host.
    pub async fn connect(entry: &HostEntry, config: &ClientConfig) -> Result<Self, ConnectionError> {
        let addr = entry.socket_addr();
        let after = config.connect_timeout();

        let stream = match timeout(after, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectionError::Connect {
                    host: entry.name.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ConnectionError::ConnectTimeout {
                    host: entry.name.clone(),
                    after,
                })
            }
        };
        // Commands are single short lines; don't let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(host = %entry.name, error = %e, "Could not disable Nagle");
        }

        tracing::info!(host = %entry.name, addr = %addr, "Connected to camerad");

        Ok(Self {
            entry: entry.clone(),
            stream,
            reply_timeout: config.reply_timeout(),
            verbose: config.verbose,
            pending: Vec::new(),
        })
    }

    /// The host this connection talks to.
    pub fn entry(&self) -> &HostEntry {
        &self.entry
    }

    /// Enables or disables info-level logging of traffic.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Writes one command line.
    pub async fn send(&mut self, command: &Command) -> Result<(), ConnectionError> {
        if self.verbose {
            tracing::info!(host = %self.entry.name, command = %command, "Sending");
        } else {
            tracing::debug!(host = %self.entry.name, command = %command, "Sending");
        }
        self.stream
            .write_all(command.to_line().as_bytes())
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Reads one reply.
    ///
    /// Each read waits at most the reply timeout. A timeout or hangup is
    /// reported through the reply's outcome, not as an error.
    pub async fn receive(&mut self) -> Result<Reply, ConnectionError> {
        let mut buf = std::mem::take(&mut self.pending);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            // A bare newline left over from the previous reply is not a reply.
            let start = buf
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .unwrap_or(buf.len());
            buf.drain(..start);

            if let Some(reply) = self.take_reply(&mut buf) {
                return Ok(reply);
            }

            match timeout(self.reply_timeout, self.stream.read(&mut chunk)).await {
                Err(_) => {
                    tracing::warn!(
                        host = %self.entry.name,
                        timeout = ?self.reply_timeout,
                        "Reply timeout"
                    );
                    return Ok(Reply::timed_out(String::from_utf8_lossy(&buf)));
                }
                Ok(Ok(0)) => {
                    tracing::warn!(host = %self.entry.name, "Connection closed by camerad");
                    return Ok(Reply::closed(String::from_utf8_lossy(&buf)));
                }
                Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
                Ok(Err(source)) => return Err(self.io_error(source)),
            }
        }
    }

    /// Sends a command and reads its reply.
    pub async fn transact(&mut self, command: &Command) -> Result<Reply, ConnectionError> {
        self.send(command).await?;
        self.receive().await
    }

    /// Closes the write half and drops the socket.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(host = %self.entry.name, error = %e, "Shutdown failed");
        }
        tracing::info!(host = %self.entry.name, "Closed connection");
    }

    /// Splits a complete reply off the front of `buf`, keeping the rest.
    fn take_reply(&mut self, buf: &mut Vec<u8>) -> Option<Reply> {
        let text = String::from_utf8_lossy(buf);
        if !is_terminated(&text) {
            return None;
        }
        let end = buf.iter().position(|&b| b == b'\n').map(|i| i + 1).unwrap_or(buf.len());
        self.pending = buf.split_off(end);

        let reply = Reply::from_text(String::from_utf8_lossy(buf));
        if self.verbose {
            tracing::info!(host = %self.entry.name, reply = %reply.raw().trim_end(), "Received");
        } else {
            tracing::debug!(host = %self.entry.name, reply = %reply.raw().trim_end(), "Received");
        }
        Some(reply)
    }

    fn io_error(&self, source: std::io::Error) -> ConnectionError {
        ConnectionError::Io {
            host: self.entry.name.clone(),
            source,
        }
    }
}
