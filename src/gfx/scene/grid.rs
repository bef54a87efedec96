use crate::config::GridConfig;
use crate::error::DisposalError;
use crate::gfx::geometry::LineGeometry;
use crate::gfx::resources::{ResourceKind, ResourceRegistry};

use super::material::LineMaterial;

/// Square line grid on the XZ plane, centered at the origin
#[derive(Debug, Clone)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub visible: bool,
    pub geometry: LineGeometry,
    pub material: LineMaterial,
}

impl GridHelper {
    /// `divisions + 1` lines along each axis. Zero divisions yields an empty grid.
    pub fn new(size: f32, divisions: u32, material: LineMaterial) -> Self {
        let mut positions = Vec::new();
        if divisions > 0 {
            let half = size / 2.0;
            let step = size / divisions as f32;
            for i in 0..=divisions {
                let k = -half + i as f32 * step;
                positions.push([-half, 0.0, k]);
                positions.push([half, 0.0, k]);
                positions.push([k, 0.0, -half]);
                positions.push([k, 0.0, half]);
            }
        }

        Self {
            size,
            divisions,
            visible: true,
            geometry: LineGeometry::new(positions),
            material,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        let mut grid = Self::new(config.size, config.divisions, LineMaterial::new(config.color));
        grid.visible = config.enable_grid;
        grid
    }

    pub fn upload(&mut self, registry: &mut ResourceRegistry) {
        self.geometry.gpu.acquire(registry, ResourceKind::Geometry);
        self.material.gpu.acquire(registry, ResourceKind::Material);
    }

    /// Releases the line buffers. Safe to call repeatedly.
    pub fn dispose(&mut self, registry: &mut ResourceRegistry) -> Result<(), DisposalError> {
        self.geometry.gpu.release(registry)?;
        self.material.gpu.release(registry)?;
        Ok(())
    }
}
