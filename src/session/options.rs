//! Options for multi-step session operations.

use crate::settings::{ImageType, PowerState};

/// Steps performed by [`Session::open`](super::Session::open) after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Load the default ACF file.
    pub load: bool,
    /// Power on the controllers after loading.
    pub power_on: bool,
    /// Reset local settings and send the observation setup.
    pub setup: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            load: true,
            power_on: true,
            setup: true,
        }
    }
}

impl OpenOptions {
    /// Connect and send `open` only.
    pub fn connect_only() -> Self {
        Self {
            load: false,
            power_on: false,
            setup: false,
        }
    }
}

/// Settings applied by [`Session::load`](super::Session::load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Readout mode to use after loading.
    pub mode: String,
    /// Image base name; empty means timestamp only.
    pub basename: String,
    /// Image type recorded locally.
    pub image_type: ImageType,
    /// Power state requested after the load.
    pub power: PowerState,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mode: "DEFAULT".to_string(),
            basename: String::new(),
            image_type: ImageType::Test,
            power: PowerState::On,
        }
    }
}

impl LoadOptions {
    /// Default options with a different readout mode.
    pub fn with_mode(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Default::default()
        }
    }
}
