//! Camera commands and their dispatch onto a [`Session`].

use crate::hosts::HostSelection;
use crate::magicboard::{self, Identifier, MagicboardRun, RunOptions};
use crate::session::{LoadOptions, OpenOptions, Session, SessionError};
use crate::settings::{Compression, ImageType, PowerState, SettingsError};
use clap::{builder::BoolishValueParser, ArgAction, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// One camera operation, as typed on the command line or in the shell.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum CameraCommand {
    /// Connect to camerad and initialize the controllers
    Open {
        /// Connect only to camerad on this machine
        #[arg(long, conflicts_with = "hosts")]
        local: bool,
        /// Host id to connect to (repeatable; default: all hosts)
        #[arg(long = "host", value_name = "ID")]
        hosts: Vec<u32>,
        /// Skip loading the default ACF (also skips power on and setup)
        #[arg(long)]
        no_load: bool,
        /// Skip POWERON
        #[arg(long)]
        no_power_on: bool,
        /// Skip the observation setup
        #[arg(long)]
        no_setup: bool,
    },
    /// Close the camera and the connections to it
    Close,
    /// Load an ACF file
    Load {
        /// ACF file; `~` is expanded
        acf_file: PathBuf,
        /// Readout mode
        #[arg(long, default_value = "DEFAULT")]
        mode: String,
        /// Image base name
        #[arg(long, default_value = "")]
        basename: String,
        /// Image type, e.g. BIAS or DOME_FLAT
        #[arg(long = "type", default_value = "TEST")]
        image_type: ImageType,
        /// ON or OFF
        #[arg(long, default_value = "ON")]
        power: PowerState,
    },
    /// Read a parameter from controller configuration memory
    #[command(name = "getp", alias = "readparam")]
    ReadParam {
        /// Parameter name
        name: String,
    },
    /// Write a parameter to controller configuration memory
    #[command(name = "setp")]
    SetParam {
        /// Parameter name
        name: String,
        /// New value
        value: String,
    },
    /// Set the readout mode
    Mode {
        /// Readout mode name
        mode: String,
    },
    /// Set the image type (local only)
    #[command(name = "type")]
    Type {
        /// Image type, e.g. BIAS or DOME_FLAT
        image_type: ImageType,
    },
    /// Set the image name for the next exposure
    Basename {
        /// Image base name (one word)
        name: String,
    },
    /// Turn controller power ON or OFF
    Power {
        /// ON or OFF
        state: PowerState,
    },
    /// Set FITS compression (local only)
    Compression {
        /// NONE, RICE, GZIP or PLIO
        kind: Compression,
        /// Noise bits; keeps the previous value when omitted
        noisebits: Option<u32>,
    },
    /// Take one or more exposures
    Expose {
        /// Exposure time in seconds
        #[arg(default_value_t = 0.0)]
        exptime: f64,
        /// Number of exposures
        #[arg(default_value_t = 1)]
        iterations: u32,
    },
    /// Send image name, exposure time and mode for the next observation
    Setup,
    /// Show the current observation settings
    Settings,
    /// Turn verbose traffic logging on or off
    Verbose {
        /// on/off, true/false, yes/no, 1/0
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },
    /// Load (optionally), name and take test exposures
    Run {
        /// ACF file to load first, if it exists
        #[arg(long)]
        acf: Option<PathBuf>,
        /// Number of exposures
        #[arg(long, default_value_t = 1)]
        iterations: u32,
        /// Load in DEFAULT (CDS) mode instead of RAW
        #[arg(long)]
        read_cds: bool,
        /// Exposure time in seconds
        #[arg(long, default_value_t = 0.0)]
        exptime: f64,
        /// Log the elapsed time
        #[arg(long)]
        timeit: bool,
        /// Image base name
        #[arg(long, default_value = "zztf")]
        basename: String,
    },
    /// Route the magic board (NAME,CHANNEL identifiers) and expose
    Magicboard {
        /// Positive input
        p_in: Identifier,
        /// Negative input
        n_in: Identifier,
        /// Positive output
        p_out: Identifier,
        /// Negative output
        n_out: Identifier,
        /// ACF file to load first, if it exists
        #[arg(long)]
        acf: Option<PathBuf>,
        /// Number of exposures
        #[arg(long, default_value_t = 1)]
        iterations: u32,
        /// Load in DEFAULT (CDS) mode instead of RAW
        #[arg(long)]
        read_cds: bool,
        /// Log how long the register writes took
        #[arg(long)]
        timeit: bool,
        /// Seconds to wait between load and the first register write
        #[arg(long, default_value_t = 0.0)]
        delay: f64,
    },
    /// Send a raw command to every host
    Send {
        /// Command name and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

impl CameraCommand {
    /// Returns true if the command talks to camerad over open sockets.
    ///
    /// `open` makes its own connections; the local-only commands never
    /// touch the wire.
    pub fn needs_connection(&self) -> bool {
        !matches!(
            self,
            Self::Open { .. }
                | Self::Type { .. }
                | Self::Compression { .. }
                | Self::Settings
                | Self::Verbose { .. }
        )
    }
}

/// Runs a command against a session, returning any text to show the user.
pub async fn execute(
    session: &mut Session,
    command: CameraCommand,
) -> Result<Option<String>, SessionError> {
    match command {
        CameraCommand::Open {
            local,
            hosts,
            no_load,
            no_power_on,
            no_setup,
        } => {
            let selection = if local {
                HostSelection::Local
            } else if hosts.is_empty() {
                HostSelection::All
            } else {
                HostSelection::Ids(hosts)
            };
            let options = OpenOptions {
                load: !no_load,
                power_on: !no_power_on,
                setup: !no_setup,
            };
            session.open(&selection, options).await?;
        }
        CameraCommand::Close => session.close().await?,
        CameraCommand::Load {
            acf_file,
            mode,
            basename,
            image_type,
            power,
        } => {
            let options = LoadOptions {
                mode,
                basename,
                image_type,
                power,
            };
            session.load(&acf_file, options).await?;
        }
        CameraCommand::ReadParam { name } => return Ok(Some(session.read_param(&name).await?)),
        CameraCommand::SetParam { name, value } => session.set_param(&name, value).await?,
        CameraCommand::Mode { mode } => session.set_mode(&mode).await?,
        CameraCommand::Type { image_type } => session.set_type(image_type),
        CameraCommand::Basename { name } => session.set_basename(&name).await?,
        CameraCommand::Power { state } => session.set_power(state).await?,
        CameraCommand::Compression { kind, noisebits } => session.set_compression(kind, noisebits),
        CameraCommand::Expose {
            exptime,
            iterations,
        } => session.expose(exptime, iterations).await?,
        CameraCommand::Setup => session.setup_observation().await?,
        CameraCommand::Settings => return Ok(Some(session.settings().to_string())),
        CameraCommand::Verbose { enabled } => session.set_verbosity(enabled),
        CameraCommand::Run {
            acf,
            iterations,
            read_cds,
            exptime,
            timeit,
            basename,
        } => {
            let options = RunOptions {
                acf_file: acf,
                iterations,
                read_cds,
                exptime,
                timeit,
                basename,
            };
            magicboard::run(session, &options).await?;
        }
        CameraCommand::Magicboard {
            p_in,
            n_in,
            p_out,
            n_out,
            acf,
            iterations,
            read_cds,
            timeit,
            delay,
        } => {
            let delay = Duration::try_from_secs_f64(delay)
                .map_err(|_| SettingsError::InvalidDelay(delay))?;
            let board = MagicboardRun {
                acf_file: acf,
                p_in,
                n_in,
                p_out,
                n_out,
                iterations,
                read_cds,
                timeit,
                delay,
            };
            magicboard::magicboard(session, &board).await?;
        }
        CameraCommand::Send { words } => return Ok(Some(session.send(words).await?)),
    }
    Ok(None)
}
