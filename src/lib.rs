//! camerad Client Library
//!
//! A client interface to camerad, the camera-interface server that drives
//! astronomical CCD controllers (STA Archon, ARC). It carries forward the
//! procedural command set of CESL, the camera scripting layer used at the
//! Zwicky Transient Facility.
//!
//! # Architecture
//!
//! ```text
//! shell / CLI → session → connection × N → camerad × N
//!                  ↓            ↓
//!              settings     protocol (line codec, reply aggregation)
//!                  ↓
//!               metrics
//! ```
//!
//! One camera may be served by several camerad processes, one per
//! controller. Every command is sent to all of them and succeeds only if
//! every host reports `DONE` with the same return value.
//!
//! # Example
//!
//! ```no_run
//! use camerad_client::{HostSelection, OpenOptions, Session};
//!
//! # async fn demo() -> Result<(), camerad_client::SessionError> {
//! let mut cam = Session::from_config_file("hosts.toml")?;
//! cam.open(&HostSelection::All, OpenOptions::default()).await?;
//!
//! cam.set_basename("bias").await?;
//! cam.expose(0.0, 5).await?;
//! println!("gain = {}", cam.read_param("Gain").await?);
//!
//! cam.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod connection;
pub mod hosts;
pub mod magicboard;
pub mod metrics;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod shell;

// Re-export commonly used types at crate root
pub use connection::{ConnectionError, HostConnection};
pub use hosts::{ClientConfig, ConfigError, FileConfig, HostEntry, HostSelection, HostTable};
pub use protocol::{Command, Reply};
pub use session::{LoadOptions, OpenOptions, Session, SessionError};
pub use settings::{Compression, ImageType, PowerState};
pub use shell::{execute, parse_line, CameraCommand, ShellAction};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
