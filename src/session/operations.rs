//! Camera operations built on [`Session::send_command`].

use super::{LoadOptions, OpenOptions, Session, SessionError};
use crate::hosts::HostSelection;
use crate::protocol::Command;
use crate::settings::{CameraSettings, Compression, ExposureSettings, ImageType, PowerState};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Builds the image root name sent to camerad before an observation.
///
/// The name is never empty: without a basename it is just the UTC
/// timestamp `YYYYMMDD_hhmmss`.
pub fn image_name(basename: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    if basename.is_empty() {
        timestamp.to_string()
    } else {
        format!("{basename}_{timestamp}")
    }
}

/// Expands a leading `~` and makes the path absolute.
pub fn expand_path(path: &Path) -> Result<PathBuf, SessionError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    std::path::absolute(&expanded).map_err(|source| SessionError::Path {
        path: expanded.clone(),
        source,
    })
}

/// A basename is one non-empty word.
fn check_basename(basename: &str) -> Result<(), SessionError> {
    if basename.trim().is_empty() {
        return Err(SessionError::EmptyBasename);
    }
    if basename.contains(char::is_whitespace) {
        return Err(SessionError::InvalidBasename(basename.to_string()));
    }
    Ok(())
}

fn check_mode(mode: &str) -> Result<(), SessionError> {
    if mode.is_empty() || mode.contains(char::is_whitespace) {
        return Err(SessionError::InvalidMode(mode.to_string()));
    }
    Ok(())
}

impl Session {
    /// Connects to the selected hosts and initializes the controllers.
    ///
    /// Sends `open`, then (per `options`) `load`, `POWERON` and the
    /// observation setup. Each step runs only if the previous one
    /// succeeded; the sockets stay open on failure so the caller can
    /// still [`close`](Self::close).
    pub async fn open(
        &mut self,
        selection: &HostSelection,
        options: OpenOptions,
    ) -> Result<(), SessionError> {
        self.connect(selection).await?;
        self.send_command(Command::new("open")).await?;

        if !options.load {
            tracing::info!("Skipping load ACF, power on and setup");
            return Ok(());
        }

        tracing::info!("Loading default ACF file");
        self.send_command(Command::new("load")).await?;

        if options.power_on {
            tracing::info!("Turning power on");
            self.send_command(Command::new(PowerState::On.command())).await?;
            self.camera.power_on = true;
        } else {
            tracing::info!("Skipping POWERON");
        }

        if options.setup {
            self.camera = CameraSettings::default();
            self.camera.power_on = options.power_on;
            self.exposure = ExposureSettings::default();
            if let Err(e) = self.setup_observation().await {
                tracing::error!(error = %e, "Error initializing camera");
                return Err(e);
            }
            tracing::info!("Camera initialized");
        } else {
            tracing::info!("Skipping setup");
        }
        Ok(())
    }

    /// Sends `close` to every host, then closes the sockets.
    ///
    /// Sockets are closed even when `close` fails, or when hosts were
    /// already lost and `close` could not be sent. A session with no open
    /// connections is left alone.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if !self.is_connected() && self.lost_hosts().is_empty() {
            tracing::warn!("No camera connections to close");
            return Ok(());
        }
        let result = self.send_command(Command::new("close")).await;
        self.disconnect().await;
        result?;
        tracing::info!("Camera closed");
        Ok(())
    }

    /// Loads an ACF file, sets power and prepares the next observation.
    pub async fn load(
        &mut self,
        acf_file: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<(), SessionError> {
        let path = expand_path(acf_file.as_ref())?;
        check_mode(&options.mode)?;
        if !options.basename.is_empty() {
            check_basename(&options.basename)?;
        }
        let path_text = path.display().to_string();
        if path_text.contains(['\r', '\n']) {
            return Err(SessionError::LineBreak(path_text));
        }

        self.camera.mode = options.mode.clone();
        self.camera.basename = options.basename.clone();
        self.exposure.set_image_type(options.image_type);

        tracing::info!(path = %path.display(), mode = %options.mode, "Loading ACF file");
        let result = self.load_sequence(&path, options.power).await;
        match &result {
            Ok(()) => tracing::info!("Camera initialized"),
            Err(e) => tracing::error!(error = %e, "Error initializing camera"),
        }
        result
    }

    async fn load_sequence(&mut self, path: &Path, power: PowerState) -> Result<(), SessionError> {
        self.send_command(Command::new("load").arg(path.display())).await?;
        self.camera.acf_file = path.display().to_string();
        self.set_power(power).await?;
        self.setup_observation().await
    }

    /// Reads a parameter from controller configuration memory.
    pub async fn read_param(&mut self, name: &str) -> Result<String, SessionError> {
        self.send_command(Command::new("getp").arg(name)).await
    }

    /// Writes a parameter to controller configuration memory.
    pub async fn set_param(
        &mut self,
        name: &str,
        value: impl fmt::Display,
    ) -> Result<(), SessionError> {
        let command = Command::new("setp").arg(name).arg(&value);
        match self.send_command(command).await {
            Ok(_) => {
                tracing::debug!(param = name, value = %value, "Loaded parameter");
                Ok(())
            }
            Err(e) => {
                tracing::error!(param = name, value = %value, "Error loading parameter");
                Err(e)
            }
        }
    }

    /// Changes the readout mode if it differs from the current one.
    pub async fn set_mode(&mut self, mode: &str) -> Result<(), SessionError> {
        check_mode(mode)?;
        if self.camera.mode == mode {
            tracing::info!(mode, "Using mode");
            return Ok(());
        }
        self.send_command(Command::new("mode").arg(mode)).await?;
        tracing::info!(old = %self.camera.mode, new = mode, "Mode changed");
        self.camera.mode = mode.to_string();
        Ok(())
    }

    /// Records the image type locally. camerad is not told.
    pub fn set_type(&mut self, image_type: ImageType) {
        if self.exposure.image_type() != image_type {
            tracing::debug!(old = %self.exposure.image_type(), new = %image_type, "Type changed");
            self.exposure.set_image_type(image_type);
        }
    }

    /// Sets the image name for the next exposure.
    pub async fn set_basename(&mut self, basename: &str) -> Result<(), SessionError> {
        check_basename(basename)?;
        if self.camera.basename == basename {
            return Ok(());
        }
        self.send_command(Command::new("basename").arg(basename)).await?;
        tracing::info!(old = %self.camera.basename, new = basename, "Basename changed");
        self.camera.basename = basename.to_string();
        Ok(())
    }

    /// Sends the native power command.
    pub async fn set_power(&mut self, power: PowerState) -> Result<(), SessionError> {
        tracing::info!(power = %power, "Setting power");
        self.send_command(Command::new(power.command())).await?;
        self.camera.power_on = power == PowerState::On;
        Ok(())
    }

    /// Records the FITS compression settings locally.
    ///
    /// Omitting `noisebits` keeps the previous value.
    pub fn set_compression(&mut self, compression: Compression, noisebits: Option<u32>) {
        self.camera.compression = compression;
        if let Some(bits) = noisebits {
            self.camera.noisebits = bits;
        }
    }

    /// Takes `iterations` exposures.
    ///
    /// camerad runs expose, readframe and writeframe for each one.
    pub async fn expose(&mut self, exptime: f64, iterations: u32) -> Result<(), SessionError> {
        let mut exposure = self.exposure.clone();
        exposure.set_exptime(exptime)?;
        exposure.set_iterations(iterations)?;
        self.exposure = exposure;

        tracing::info!(exptime, iterations, "Starting exposure");
        self.send_command(Command::new("expose").arg(iterations)).await?;
        Ok(())
    }

    /// Sends image name, exposure time and mode for the next observation.
    pub async fn setup_observation(&mut self) -> Result<(), SessionError> {
        tracing::info!(
            mode = %self.camera.mode,
            basename = %self.camera.basename,
            image_type = %self.exposure.image_type(),
            exptime = self.exposure.exptime(),
            "Setting up observation"
        );

        let name = image_name(&self.camera.basename, Utc::now());
        self.send_command(Command::new("basename").arg(name)).await?;
        self.send_command(Command::new("exptime").arg(self.exposure.exptime())).await?;
        let mode = self.camera.mode.clone();
        self.send_command(Command::new("mode").arg(mode)).await?;
        Ok(())
    }
}
