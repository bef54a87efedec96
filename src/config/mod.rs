//! # Viewer Configuration
//!
//! A [`ViewerConfig`] is fixed for the lifetime of a viewer session. Hosts supply a
//! [`PartialViewerConfig`] that is merged against [`ViewerConfig::default`] field by
//! field within each sub-record (see [`merge_with_defaults`]).
//!
//! ## JSON overrides
//!
//! Overrides use camelCase keys:
//!
//! ```
//! use meshview::config::PartialViewerConfig;
//!
//! let overrides = PartialViewerConfig::from_json_str(
//!     r##"{ "camera": { "fov": 35 }, "grid": { "enableGrid": true, "color": "#888" } }"##,
//! ).unwrap();
//! assert_eq!(overrides.camera.unwrap().fov, Some(35.0));
//! ```

pub mod color;
pub mod defaults;
pub mod merge;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use color::Color;
pub use merge::merge_with_defaults;

/// Three-component vector as written in configuration.
pub type Vec3 = [f32; 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub camera_position: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsConfig {
    pub target_position: Vec3,
    /// Enables orbit rotation
    pub enable_controls: bool,
    pub enable_zoom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingConfig {
    pub background_color: Option<Color>,
    pub environment_path: Option<String>,
    pub ambient_color: Color,
    pub ambient_intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingConfig {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
    pub color: Color,
    pub enable_grid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireframeConfig {
    pub color: Color,
    pub enable_wireframe: bool,
}

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub rendering: RenderingConfig,
    pub lighting: LightingConfig,
    pub grid: GridConfig,
    pub wireframe: WireframeConfig,
    pub auto_rotate: bool,
    /// Radians per second around the vertical axis
    pub auto_rotate_speed: f32,
}

impl ViewerConfig {
    /// Merges `overrides` against the built-in defaults.
    pub fn from_overrides(overrides: &PartialViewerConfig) -> Self {
        merge_with_defaults(&Self::default(), overrides)
    }

    /// Lists values that are accepted but probably not what the host meant.
    ///
    /// Nothing is clamped; the viewer logs these and uses the values as given.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let fov = self.camera.fov;
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            warnings.push(format!("camera.fov {fov} is outside (0, 180)"));
        }
        if self.camera.camera_position.iter().any(|v| !v.is_finite()) {
            warnings.push("camera.cameraPosition has a non-finite component".to_string());
        }
        if self.grid.size.is_nan() || self.grid.size <= 0.0 {
            warnings.push(format!("grid.size {} is not positive", self.grid.size));
        }
        if self.grid.divisions == 0 {
            warnings.push("grid.divisions is zero".to_string());
        }
        if self.rendering.ambient_intensity < 0.0 {
            warnings.push(format!(
                "rendering.ambientIntensity {} is negative",
                self.rendering.ambient_intensity
            ));
        }
        if self.lighting.intensity < 0.0 {
            warnings.push(format!(
                "lighting.intensity {} is negative",
                self.lighting.intensity
            ));
        }
        if !self.auto_rotate_speed.is_finite() || self.auto_rotate_speed < 0.0 {
            warnings.push(format!(
                "autoRotateSpeed {} is negative or non-finite",
                self.auto_rotate_speed
            ));
        }
        warnings
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialCameraConfig {
    pub camera_position: Option<Vec3>,
    pub fov: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialControlsConfig {
    pub target_position: Option<Vec3>,
    pub enable_controls: Option<bool>,
    pub enable_zoom: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialRenderingConfig {
    pub background_color: Option<Color>,
    pub environment_path: Option<String>,
    pub ambient_color: Option<Color>,
    pub ambient_intensity: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialLightingConfig {
    pub position: Option<Vec3>,
    pub color: Option<Color>,
    pub intensity: Option<f32>,
    pub cast_shadow: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialGridConfig {
    pub size: Option<f32>,
    pub divisions: Option<u32>,
    pub color: Option<Color>,
    pub enable_grid: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialWireframeConfig {
    pub color: Option<Color>,
    pub enable_wireframe: Option<bool>,
}

/// Host-supplied override; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialViewerConfig {
    pub camera: Option<PartialCameraConfig>,
    pub controls: Option<PartialControlsConfig>,
    pub rendering: Option<PartialRenderingConfig>,
    pub lighting: Option<PartialLightingConfig>,
    pub grid: Option<PartialGridConfig>,
    pub wireframe: Option<PartialWireframeConfig>,
    pub auto_rotate: Option<bool>,
    pub auto_rotate_speed: Option<f32>,
}

impl PartialViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
