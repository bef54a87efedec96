//! Renderer capability consumed by the viewer
//!
//! The viewer never talks to the GPU. Once per tick it assembles a [`RenderFrame`]
//! borrowing the scene and hands it to a [`Renderer`].

use cgmath::Matrix4;

use crate::config::Color;
use crate::gfx::camera::PerspectiveCamera;
use crate::gfx::geometry::LineGeometry;
use crate::gfx::resources::ResourceRegistry;
use crate::gfx::scene::{
    AmbientLight, DirectionalLight, Drawable, EnvironmentTexture, GridHelper, LineMaterial, Node,
    NodeKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMapType {
    Basic,
    Pcf,
    PcfSoft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneMapping {
    None,
    AcesFilmic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    /// Transparent clear when no background color is set
    pub alpha: bool,
    pub antialias: bool,
    pub shadow_map_enabled: bool,
    pub shadow_map_type: ShadowMapType,
    pub tone_mapping: ToneMapping,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            shadow_map_enabled: true,
            shadow_map_type: ShadowMapType::PcfSoft,
            tone_mapping: ToneMapping::AcesFilmic,
        }
    }
}

pub trait Renderer {
    fn configure(&mut self, settings: &RendererSettings);
    fn set_size(&mut self, width: u32, height: u32);
    fn render(&mut self, frame: &RenderFrame<'_>);
}

/// Everything needed to draw one frame
pub struct RenderFrame<'a> {
    pub camera: &'a PerspectiveCamera,
    pub background: Option<Color>,
    pub environment: Option<&'a EnvironmentTexture>,
    pub ambient: &'a AmbientLight,
    pub directional: &'a DirectionalLight,
    /// Transform of the group holding the grid and the model
    pub root_transform: Matrix4<f32>,
    pub grid: &'a GridHelper,
    pub model: Option<&'a Node>,
    pub registry: &'a ResourceRegistry,
}

/// One draw call worth of scene data
pub enum DrawItem<'a> {
    Mesh {
        world: Matrix4<f32>,
        drawable: &'a Drawable,
    },
    Lines {
        world: Matrix4<f32>,
        geometry: &'a LineGeometry,
        material: &'a LineMaterial,
    },
}

impl<'a> RenderFrame<'a> {
    /// Visible items in draw order: the grid, then the model tree.
    pub fn draw_items(&self) -> Vec<DrawItem<'a>> {
        let mut items = Vec::new();

        if self.grid.visible {
            items.push(DrawItem::Lines {
                world: self.root_transform,
                geometry: &self.grid.geometry,
                material: &self.grid.material,
            });
        }

        if let Some(model) = self.model {
            model.visit_visible(self.root_transform, &mut |node, world| match &node.kind {
                NodeKind::Group => {}
                NodeKind::Mesh(drawable) => items.push(DrawItem::Mesh { world, drawable }),
                NodeKind::Wireframe(overlay) => items.push(DrawItem::Lines {
                    world,
                    geometry: &overlay.geometry,
                    material: &overlay.material,
                }),
            });
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, LightingConfig, RenderingConfig};
    use crate::gfx::geometry::cube;
    use crate::gfx::scene::{Material, MaterialSlot, WireframeOverlay};
    use cgmath::SquareMatrix;

    #[test]
    fn test_draw_items_skip_hidden_nodes() {
        let camera = PerspectiveCamera::new(50.0, 1.0, 0.1, 1000.0);
        let ambient = AmbientLight::from_config(&RenderingConfig::default());
        let directional = DirectionalLight::from_config(&LightingConfig::default());
        let grid = GridHelper::from_config(&GridConfig::default());
        let registry = ResourceRegistry::new();

        let geometry = cube(1.0);
        let mut overlay = Node::wireframe(
            "wireframe",
            WireframeOverlay {
                geometry: geometry.wireframe(),
                material: LineMaterial::new(Color::WHITE),
            },
        );
        overlay.visible = false;
        let mesh = Node::mesh(
            "cube",
            Drawable::new(geometry, MaterialSlot::Single(Material::default())),
        )
        .with_child(overlay);
        let model = Node::group("root").with_child(mesh);

        let frame = RenderFrame {
            camera: &camera,
            background: None,
            environment: None,
            ambient: &ambient,
            directional: &directional,
            root_transform: Matrix4::identity(),
            grid: &grid,
            model: Some(&model),
            registry: &registry,
        };

        let items = frame.draw_items();
        // grid hidden by default, overlay hidden
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], DrawItem::Mesh { .. }));
    }
}
