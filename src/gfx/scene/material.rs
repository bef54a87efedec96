//! Surface and line materials
//!
//! Materials are plain parameter blocks. The renderer turns them into per-draw
//! uniforms; the registry handle marks them as live.

use crate::config::Color;
use crate::gfx::resources::GpuHandle;

/// PBR metallic-roughness parameters
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Linear RGBA base color
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub gpu: GpuHandle,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            gpu: GpuHandle::default(),
        }
    }
}

impl Material {
    /// `metallic` and `roughness` are clamped to `[0, 1]`.
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            gpu: GpuHandle::default(),
        }
    }
}

/// One material for the whole mesh, or one per primitive group.
#[derive(Debug, Clone)]
pub enum MaterialSlot {
    Single(Material),
    Multi(Vec<Material>),
}

impl MaterialSlot {
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        match self {
            MaterialSlot::Single(m) => std::slice::from_ref(m).iter(),
            MaterialSlot::Multi(ms) => ms.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Material> {
        match self {
            MaterialSlot::Single(m) => std::slice::from_mut(m).iter_mut(),
            MaterialSlot::Multi(ms) => ms.iter_mut(),
        }
    }

    /// Material used for drawing; multi-material meshes draw with their first entry.
    pub fn primary(&self) -> Option<&Material> {
        self.iter().next()
    }
}

/// Unlit color for line overlays
#[derive(Debug, Clone)]
pub struct LineMaterial {
    pub color: Color,
    pub transparent: bool,
    pub opacity: f32,
    pub gpu: GpuHandle,
}

impl LineMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            transparent: false,
            opacity: 1.0,
            gpu: GpuHandle::default(),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    /// Linear RGBA for the shader
    pub fn rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.color.to_linear();
        [r, g, b, self.opacity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_iterates_all_materials() {
        let single = MaterialSlot::Single(Material::default());
        assert_eq!(single.iter().count(), 1);

        let mut multi = MaterialSlot::Multi(vec![
            Material::new("a", [1.0; 4], 0.0, 1.0),
            Material::new("b", [1.0; 4], 2.0, -1.0),
        ]);
        assert_eq!(multi.iter().count(), 2);
        assert_eq!(multi.primary().map(|m| m.name.as_str()), Some("a"));
        for m in multi.iter_mut() {
            m.roughness = 0.25;
        }
        assert!(multi.iter().all(|m| m.roughness == 0.25));
    }

    #[test]
    fn test_material_factors_are_clamped() {
        let m = Material::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(m.metallic, 1.0);
        assert_eq!(m.roughness, 0.0);
    }
}
