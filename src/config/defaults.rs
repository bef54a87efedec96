//! Built-in defaults for every configuration field

use super::{
    CameraConfig, Color, ControlsConfig, GridConfig, LightingConfig, RenderingConfig,
    ViewerConfig, WireframeConfig,
};

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_position: [-6.0, 7.0, 4.0],
            fov: 50.0,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target_position: [0.0, 0.0, 0.0],
            enable_controls: true,
            enable_zoom: true,
        }
    }
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            environment_path: None,
            ambient_color: Color::from_hex(0xb1e1ff),
            ambient_intensity: 0.5,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            position: [100.0, 100.0, 100.0],
            color: Color::from_hex(0xfff2e6),
            intensity: std::f32::consts::PI,
            cast_shadow: true,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 5,
            color: Color::WHITE,
            enable_grid: false,
        }
    }
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            enable_wireframe: false,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            rendering: RenderingConfig::default(),
            lighting: LightingConfig::default(),
            grid: GridConfig::default(),
            wireframe: WireframeConfig::default(),
            auto_rotate: false,
            auto_rotate_speed: 0.1,
        }
    }
}
