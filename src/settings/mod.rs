//! Local mirror of camera and exposure state.
//!
//! camerad is the authority on what the controllers are doing. These
//! types remember what this client last asked for, so repeated requests
//! can be skipped and image names can be built without a round trip.

mod camera;
mod exposure;

pub use camera::{CameraSettings, Compression, ControllerInterface, PowerState};
pub use exposure::{ExposureSettings, ImageType};

use thiserror::Error;

/// Errors from validating or parsing settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// Not one of the upper-case image type names.
    #[error("unknown image type '{0}'")]
    UnknownImageType(String),
    /// Power must be exactly `ON` or `OFF`.
    #[error("unrecognized power argument '{0}' (expected ON or OFF)")]
    UnknownPowerState(String),
    /// Not a FITS compression camerad supports.
    #[error("unknown compression type '{0}' (expected NONE, RICE, GZIP or PLIO)")]
    UnknownCompression(String),
    /// Negative or non-finite exposure time.
    #[error("exptime must be >= 0, got {0}")]
    InvalidExptime(f64),
    /// Zero iterations.
    #[error("iterations must be > 0")]
    InvalidIterations,
    /// Negative or non-finite delay in seconds.
    #[error("delay must be a finite number of seconds >= 0, got {0}")]
    InvalidDelay(f64),
}
