//! # Asset Loaders
//!
//! Loaders decode files into scene data on worker threads. The viewer only sees them
//! through the [`ModelLoader`] and [`TextureLoader`] traits, so hosts can plug in
//! their own formats or sources.
//!
//! - [`obj::ObjLoader`] - Wavefront OBJ via `tobj`
//! - [`gltf::GltfLoader`] - glTF and GLB via `gltf`
//! - [`hdr::HdrLoader`] - equirectangular HDR (or any `image` format) environment maps
//! - [`MeshFileLoader`] - picks OBJ or glTF by file extension
//!
//! [`manager::LoadingManager`] runs loader jobs and reports their results back to the
//! owning thread.

pub mod gltf;
pub mod hdr;
pub mod manager;
pub mod obj;

use std::path::Path;

use crate::error::LoadError;
use crate::gfx::scene::{EnvironmentTexture, Node};

pub use manager::{
    AssetKind, Generation, LoadMessage, LoadOutcome, LoadingManager, LoadingProgress,
    ManualSpawner, Spawner, ThreadSpawner,
};

/// Decodes a model file into a node tree.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Node, LoadError>;
}

/// Decodes an image file into an environment texture.
pub trait TextureLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<EnvironmentTexture, LoadError>;
}

/// Dispatches to the OBJ or glTF loader based on the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshFileLoader;

impl ModelLoader for MeshFileLoader {
    fn load(&self, path: &Path) -> Result<Node, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "obj" => obj::ObjLoader.load(path),
            "gltf" | "glb" => gltf::GltfLoader.load(path),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Root node name for a loaded file: its stem, or "model".
pub(crate) fn model_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let result = MeshFileLoader.load(Path::new("scene.fbx"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));

        let result = MeshFileLoader.load(Path::new("no_extension"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        // dispatches to the OBJ loader, which then fails to open the file
        let result = MeshFileLoader.load(Path::new("/definitely/not/here.OBJ"));
        assert!(matches!(result, Err(LoadError::Obj(_))));
    }

    #[test]
    fn test_model_name() {
        assert_eq!(model_name(Path::new("assets/teapot.obj")), "teapot");
        assert_eq!(model_name(Path::new("")), "model");
    }
}
