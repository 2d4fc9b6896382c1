//! Host entries and host selection.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Port camerad listens on for blocking commands.
pub const DEFAULT_PORT: u16 = 3031;

/// A single camerad server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Numeric host identifier, unique within a table.
    pub id: u32,
    /// Human-readable camera name used in log output.
    pub name: String,
    /// Hostname or IP address on which camerad is running.
    pub address: String,
    /// TCP port of the camerad command interface.
    pub port: u16,
}

impl HostEntry {
    /// Creates a new host entry.
    pub fn new(id: u32, name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            port,
        }
    }

    /// The stock single-host setup: camerad on this machine.
    pub fn localhost() -> Self {
        Self::new(1, "localhost", "127.0.0.1", DEFAULT_PORT)
    }

    /// Returns true if this entry refers to the local machine.
    pub fn is_local(&self) -> bool {
        if self.name.eq_ignore_ascii_case("localhost") || self.address == "localhost" {
            return true;
        }
        self.address
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
    }

    /// Returns the `address:port` string used to connect.
    pub fn socket_addr(&self) -> String {
        match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.port),
            _ => format!("{}:{}", self.address, self.port),
        }
    }
}

impl fmt::Display for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.address, self.port)
    }
}

/// Which hosts of a table to connect to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostSelection {
    /// Every host in the table.
    #[default]
    All,
    /// Only hosts on the local machine.
    Local,
    /// Hosts with the given identifiers.
    Ids(Vec<u32>),
}

/// Ordered, validated set of camerad hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTable {
    entries: Vec<HostEntry>,
}

impl Default for HostTable {
    fn default() -> Self {
        Self {
            entries: vec![HostEntry::localhost()],
        }
    }
}

impl HostTable {
    /// Builds a table from entries, rejecting empty or inconsistent input.
    pub fn new(entries: Vec<HostEntry>) -> Result<Self, ConfigError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// Checks that the table is non-empty, ids are unique and ports are set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyHostTable);
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.port == 0 {
                return Err(ConfigError::InvalidPort(entry.name.clone()));
            }
            if self.entries[i + 1..].iter().any(|other| other.id == entry.id) {
                return Err(ConfigError::DuplicateHostId(entry.id));
            }
        }
        Ok(())
    }

    /// Returns all entries in table order.
    pub fn entries(&self) -> &[HostEntry] {
        &self.entries
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: u32) -> Option<&HostEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of hosts in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no hosts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a selection into the concrete entries to connect to.
    pub fn select(&self, selection: &HostSelection) -> Result<Vec<HostEntry>, ConfigError> {
        match selection {
            HostSelection::All => Ok(self.entries.clone()),
            HostSelection::Local => {
                let local: Vec<HostEntry> =
                    self.entries.iter().filter(|e| e.is_local()).cloned().collect();
                if local.is_empty() {
                    Ok(vec![HostEntry::localhost()])
                } else {
                    Ok(local)
                }
            }
            HostSelection::Ids(ids) => ids
                .iter()
                .map(|id| self.get(*id).cloned().ok_or(ConfigError::UnknownHostId(*id)))
                .collect(),
        }
    }
}
