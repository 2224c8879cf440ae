//! Renderer configuration.
//!
//! [`RendererSettings`] holds the sizes and limits used when deriving
//! wallpaper images. It round-trips through JSON; missing fields take their
//! defaults.
//!
//! # Example
//!
//! ```
//! use wallpaper_renderer::RendererSettings;
//!
//! let settings = RendererSettings::from_json(r#"{ "boxSide": 400 }"#).unwrap();
//! assert_eq!(settings.box_side, 400);
//! assert_eq!(settings.max_side, 2960);
//!
//! let json = settings.to_json().unwrap();
//! assert!(json.contains("\"devicePixelRatio\""));
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;

// ============================================================================
// RendererSettings
// ============================================================================

/// Sizes and limits for derived images.
///
/// # JSON Format
///
/// ```json
/// {
///   "boxSide": 320,
///   "devicePixelRatio": 1.0,
///   "maxSide": 2960,
///   "blurredMaxSide": 900,
///   "blurRadius": 24,
///   "workerThreads": 1,
///   "ditherGradients": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererSettings {
    /// Logical side of the square preview box.
    pub box_side: u32,

    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f32,

    /// Largest side of a decoded full image.
    pub max_side: u32,

    /// Largest side of the image fed to the background blur.
    pub blurred_max_side: u32,

    /// Background blur radius in pixels.
    pub blur_radius: u32,

    /// Threads in the preparation pool.
    pub worker_threads: usize,

    /// Dither multi-color pattern fills to hide banding.
    pub dither_gradients: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            box_side: 320,
            device_pixel_ratio: 1.0,
            max_side: 2960,
            blurred_max_side: 900,
            blur_radius: 24,
            worker_threads: 1,
            dither_gradients: false,
        }
    }
}

impl RendererSettings {
    /// Serializes the settings to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the settings to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        debug!(path = %path.display(), ?settings, "loaded renderer settings");
        Ok(settings)
    }

    /// Physical side of the preview box.
    pub fn physical_box_side(&self) -> u32 {
        ((self.box_side as f32 * self.device_pixel_ratio).round() as u32).max(1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_roundtrip() {
        let settings = RendererSettings {
            box_side: 100,
            device_pixel_ratio: 2.0,
            worker_threads: 3,
            ..RendererSettings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(RendererSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn settings_json_format() {
        let json = RendererSettings::default().to_json_pretty().unwrap();
        assert!(json.contains("\"boxSide\": 320"));
        assert!(json.contains("\"blurredMaxSide\": 900"));
        assert!(json.contains("\"workerThreads\": 1"));
        assert!(json.contains("\"ditherGradients\": false"));
    }

    #[test]
    fn empty_settings_deserialize() {
        assert_eq!(
            RendererSettings::from_json("{}").unwrap(),
            RendererSettings::default()
        );
    }

    #[test]
    fn physical_side() {
        let settings = RendererSettings {
            box_side: 100,
            device_pixel_ratio: 1.5,
            ..RendererSettings::default()
        };
        assert_eq!(settings.physical_box_side(), 150);
    }

    #[test]
    fn load_reports_missing_file() {
        let missing = std::env::temp_dir().join("wallpaper-renderer-missing-settings.json");
        assert!(matches!(
            RendererSettings::load(&missing),
            Err(SettingsError::Io(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "wallpaper-renderer-settings-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{ "maxSide": 1000 }"#).unwrap();
        let settings = RendererSettings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(settings.max_side, 1000);
        assert_eq!(settings.box_side, 320);
    }
}
