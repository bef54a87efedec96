use cgmath::{InnerSpace, Vector3};

use crate::config::{Color, LightingConfig, RenderingConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn from_config(config: &RenderingConfig) -> Self {
        Self {
            color: config.ambient_color,
            intensity: config.ambient_intensity,
        }
    }

    /// Linear color premultiplied by intensity
    pub fn radiance(&self) -> [f32; 3] {
        let [r, g, b] = self.color.to_linear();
        [r * self.intensity, g * self.intensity, b * self.intensity]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 1024,
            bias: -0.0001,
        }
    }
}

/// Light shining from `position` toward `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            position: Vector3::from(config.position),
            target: Vector3::new(0.0, 0.0, 0.0),
            color: config.color,
            intensity: config.intensity,
            cast_shadow: config.cast_shadow,
            shadow: ShadowSettings::default(),
        }
    }

    /// Unit vector the light travels along; straight down when position equals target.
    pub fn direction(&self) -> Vector3<f32> {
        let d = self.target - self.position;
        if d.magnitude2() > 0.0 {
            d.normalize()
        } else {
            Vector3::new(0.0, -1.0, 0.0)
        }
    }

    pub fn radiance(&self) -> [f32; 3] {
        let [r, g, b] = self.color.to_linear();
        [r * self.intensity, g * self.intensity, b * self.intensity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_light_defaults() {
        let light = DirectionalLight::from_config(&LightingConfig::default());
        assert_eq!(light.shadow.map_size, 1024);
        assert_eq!(light.shadow.bias, -0.0001);
        assert!(light.cast_shadow);
        let d = light.direction();
        let expected = -1.0 / 3.0_f32.sqrt();
        assert!((d.x - expected).abs() < 1e-6);
        assert!((d.y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_direction_points_down() {
        let mut light = DirectionalLight::from_config(&LightingConfig::default());
        light.position = light.target;
        assert_eq!(light.direction(), Vector3::new(0.0, -1.0, 0.0));
    }
}
