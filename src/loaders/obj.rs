//! Wavefront OBJ import through `tobj`

use std::path::Path;

use crate::error::LoadError;
use crate::gfx::geometry::Geometry;
use crate::gfx::scene::{Drawable, Material, MaterialSlot, Node};

use super::{model_name, ModelLoader};

#[derive(Debug, Default, Clone, Copy)]
pub struct ObjLoader;

impl ModelLoader for ObjLoader {
    fn load(&self, path: &Path) -> Result<Node, LoadError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let materials = materials.unwrap_or_else(|err| {
            log::debug!("No usable MTL for {}: {}", path.display(), err);
            Vec::new()
        });
        let materials: Vec<Material> = materials
            .iter()
            .enumerate()
            .map(|(i, mtl)| {
                let name = if mtl.name.is_empty() {
                    format!("material_{}", i)
                } else {
                    mtl.name.clone()
                };
                let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                let alpha = mtl.dissolve.unwrap_or(1.0);
                Material::new(&name, [diffuse[0], diffuse[1], diffuse[2], alpha], 0.0, 0.5)
            })
            .collect();

        let mut root = Node::group(model_name(path));
        for model in models {
            let mesh = model.mesh;
            if mesh.positions.is_empty() {
                continue;
            }

            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let mut geometry = Geometry::new(positions, Some(mesh.indices));
            if mesh.normals.len() == mesh.positions.len() {
                geometry.normals = mesh
                    .normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect();
            }

            let material = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .cloned()
                .unwrap_or_default();

            root.add_child(Node::mesh(
                model.name,
                Drawable::new(geometry, MaterialSlot::Single(material)),
            ));
        }

        if root.children.is_empty() {
            return Err(LoadError::EmptyModel(path.display().to_string()));
        }
        Ok(root)
    }
}
