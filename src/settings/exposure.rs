//! Exposure-level settings.

use super::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image type recorded with an exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    /// Science target.
    Object,
    /// Zero-second bias frame.
    Bias,
    /// Shutter-closed dark frame.
    Dark,
    /// Flat from the dome screen.
    DomeFlat,
    /// Flat from the twilight sky.
    TwilightFlat,
    /// Focus sequence.
    Focus,
    /// Pointing model exposure.
    Pointing,
    /// Engineering test.
    #[default]
    Test,
    /// Illumination correction frame.
    Illumination,
    /// Fringe frame.
    Fringe,
    /// Seeing measurement.
    Seeing,
    /// Anything else.
    Other,
}

impl ImageType {
    /// Every type, in code order.
    pub const ALL: [ImageType; 12] = [
        Self::Object,
        Self::Bias,
        Self::Dark,
        Self::DomeFlat,
        Self::TwilightFlat,
        Self::Focus,
        Self::Pointing,
        Self::Test,
        Self::Illumination,
        Self::Fringe,
        Self::Seeing,
        Self::Other,
    ];

    /// Numeric code used by ZTF-era scripts.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case name, e.g. `DOME_FLAT`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "OBJECT",
            Self::Bias => "BIAS",
            Self::Dark => "DARK",
            Self::DomeFlat => "DOME_FLAT",
            Self::TwilightFlat => "TWILIGHT_FLAT",
            Self::Focus => "FOCUS",
            Self::Pointing => "POINTING",
            Self::Test => "TEST",
            Self::Illumination => "ILLUMINATION",
            Self::Fringe => "FRINGE",
            Self::Seeing => "SEEING",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for ImageType {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| SettingsError::UnknownImageType(s.to_string()))
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of the next exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    image_type: ImageType,
    iterations: u32,
    exptime: f64,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            image_type: ImageType::Test,
            iterations: 1,
            exptime: 0.0,
        }
    }
}

impl ExposureSettings {
    /// The image type.
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Number of exposures per `expose` call.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Exposure time in seconds.
    pub fn exptime(&self) -> f64 {
        self.exptime
    }

    /// Sets the image type.
    pub fn set_image_type(&mut self, image_type: ImageType) {
        self.image_type = image_type;
    }

    /// Sets the exposure time; must be finite and non-negative.
    pub fn set_exptime(&mut self, exptime: f64) -> Result<(), SettingsError> {
        if !exptime.is_finite() || exptime < 0.0 {
            return Err(SettingsError::InvalidExptime(exptime));
        }
        self.exptime = exptime;
        Ok(())
    }

    /// Sets the iteration count; must be at least one.
    pub fn set_iterations(&mut self, iterations: u32) -> Result<(), SettingsError> {
        if iterations == 0 {
            return Err(SettingsError::InvalidIterations);
        }
        self.iterations = iterations;
        Ok(())
    }
}
