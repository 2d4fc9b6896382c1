//! Camera-level settings.

use super::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Controller family behind camerad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerInterface {
    /// STA Archon controller.
    #[default]
    Archon,
    /// Astronomical Research Cameras (Leach) controller.
    Arc,
}

impl fmt::Display for ControllerInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Archon => "archon",
            Self::Arc => "arc",
        })
    }
}

/// Controller power request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    /// `POWERON`
    On,
    /// `POWEROFF`
    Off,
}

impl PowerState {
    /// The native camerad command for this state.
    pub fn command(self) -> &'static str {
        match self {
            Self::On => "POWERON",
            Self::Off => "POWEROFF",
        }
    }
}

impl FromStr for PowerState {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(SettingsError::UnknownPowerState(s.to_string())),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "ON",
            Self::Off => "OFF",
        })
    }
}

/// FITS compression type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// Uncompressed.
    #[default]
    None,
    /// Rice tile compression.
    Rice,
    /// GZIP tile compression.
    Gzip,
    /// IRAF PLIO tile compression.
    Plio,
}

impl FromStr for Compression {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "RICE" => Ok(Self::Rice),
            "GZIP" => Ok(Self::Gzip),
            "PLIO" => Ok(Self::Plio),
            _ => Err(SettingsError::UnknownCompression(s.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Rice => "RICE",
            Self::Gzip => "GZIP",
            Self::Plio => "PLIO",
        })
    }
}

/// What the client last requested of the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Controller family.
    pub interface: ControllerInterface,
    /// Readout mode. Any string is allowed; camerad checks it.
    pub mode: String,
    /// Base name for image files. May be empty.
    pub basename: String,
    /// Whether power-on was last requested.
    pub power_on: bool,
    /// Last ACF file loaded, or `DEFAULT`.
    pub acf_file: String,
    /// FITS compression type.
    pub compression: Compression,
    /// Noise bits for floating-point compression.
    pub noisebits: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            interface: ControllerInterface::Archon,
            mode: "DEFAULT".to_string(),
            basename: String::new(),
            power_on: false,
            acf_file: "DEFAULT".to_string(),
            compression: Compression::None,
            noisebits: 4,
        }
    }
}
