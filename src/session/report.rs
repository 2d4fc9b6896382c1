use crate::settings::{CameraSettings, ExposureSettings};
use std::fmt;

/// Printable snapshot of the current observation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsReport {
    /// Camera-level settings.
    pub camera: CameraSettings,
    /// Settings of the next exposure.
    pub exposure: ExposureSettings,
}

impl fmt::Display for SettingsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  interface     = '{}'", self.camera.interface)?;
        writeln!(f, "  mode          = '{}'", self.camera.mode)?;
        writeln!(f, "  basename      = '{}'", self.camera.basename)?;
        let image_type = self.exposure.image_type();
        writeln!(f, "  type          = '{}' ({})", image_type, image_type.code())?;
        writeln!(f, "  exptime       = {}", self.exposure.exptime())?;
        writeln!(f, "  compression   = '{}'", self.camera.compression)?;
        write!(f, "  noisebits     = {}", self.camera.noisebits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_report() {
        let report = SettingsReport {
            camera: CameraSettings::default(),
            exposure: ExposureSettings::default(),
        };
        let text = report.to_string();
        assert!(text.contains("mode          = 'DEFAULT'"));
        assert!(text.starts_with("  interface     = 'archon'"));
        assert!(text.contains("type          = 'TEST' (7)"));
        assert!(text.contains("exptime       = 0"));
        assert!(text.ends_with("noisebits     = 4"));
    }
}
