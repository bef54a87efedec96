//! glTF / GLB import
//!
//! Walks the default scene (or the first one) and mirrors its node hierarchy. Each
//! triangle primitive becomes a mesh child of the node that references it.

use std::path::Path;

use cgmath::{Quaternion, Vector3};
use gltf::mesh::Mode;

use crate::error::LoadError;
use crate::gfx::geometry::Geometry;
use crate::gfx::scene::{Drawable, Material, MaterialSlot, Node, Transform};

use super::{model_name, ModelLoader};

#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl ModelLoader for GltfLoader {
    fn load(&self, path: &Path) -> Result<Node, LoadError> {
        let (document, buffers, _images) = gltf::import(path)?;

        let mut root = Node::group(model_name(path));
        if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
            for node in scene.nodes() {
                root.add_child(build_node(&node, &buffers));
            }
        }

        if root.count(|n| n.drawable().is_some()) == 0 {
            return Err(LoadError::EmptyModel(path.display().to_string()));
        }
        Ok(root)
    }
}

fn build_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut out = Node::group(name.clone()).with_transform(Transform {
        position: Vector3::from(translation),
        // glTF stores quaternions as [x, y, z, w]
        rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: Vector3::from(scale),
    });

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(drawable) = read_primitive(&primitive, buffers) {
                out.add_child(Node::mesh(
                    format!("{}_primitive_{}", name, primitive.index()),
                    drawable,
                ));
            }
        }
    }

    for child in node.children() {
        out.add_child(build_node(&child, buffers));
    }
    out
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<Drawable> {
    if primitive.mode() != Mode::Triangles {
        log::debug!("Skipping {:?} primitive", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let indices = reader.read_indices().map(|i| i.into_u32().collect());

    let mut geometry = Geometry::new(positions, indices);
    if let Some(normals) = reader.read_normals() {
        let normals: Vec<[f32; 3]> = normals.collect();
        if normals.len() == geometry.vertex_count() {
            geometry.normals = normals;
        }
    }

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let material = Material::new(
        material.name().unwrap_or("Default"),
        pbr.base_color_factor(),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
    );

    Some(Drawable::new(geometry, MaterialSlot::Single(material)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Rotation;

    // One triangle (3 f32 positions + 3 u16 indices + padding) embedded as a data URI
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{
            "name": "tri",
            "mesh": 0,
            "translation": [0.0, 2.0, 0.0],
            "rotation": [0.0, 0.7071068, 0.0, 0.7071068]
        }],
        "meshes": [{ "primitives": [{
            "attributes": { "POSITION": 0 },
            "indices": 1,
            "material": 0
        }] }],
        "materials": [{
            "name": "red",
            "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.0, "roughnessFactor": 0.4 }
        }],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    #[test]
    fn test_load_embedded_triangle() {
        let path = std::env::temp_dir().join(format!("meshview_{}_tri.gltf", std::process::id()));
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();
        let root = GltfLoader.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(root.children.len(), 1);
        let node = &root.children[0];
        assert_eq!(node.name, "tri");
        assert_eq!(node.transform.position, Vector3::new(0.0, 2.0, 0.0));
        // 90 degrees about +Y maps +X to -Z
        let turned = node.transform.rotation.rotate_vector(Vector3::new(1.0, 0.0, 0.0));
        assert!((turned.z + 1.0).abs() < 1e-5);

        let drawable = node.children[0].drawable().unwrap();
        assert_eq!(drawable.geometry.index_count(), Some(3));
        assert_eq!(drawable.geometry.triangle_count(), 1);
        let material = drawable.material.primary().unwrap();
        assert_eq!(material.name, "red");
        assert_eq!(material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(material.roughness, 0.4);
    }

    #[test]
    fn test_missing_gltf_is_an_error() {
        let result = GltfLoader.load(Path::new("/definitely/not/here.glb"));
        assert!(matches!(result, Err(LoadError::Gltf(_))));
    }
}
