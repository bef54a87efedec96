//! Environment map import through `image`
//!
//! Any format `image` can decode is accepted; Radiance `.hdr` keeps its full range.

use std::path::Path;

use crate::error::LoadError;
use crate::gfx::scene::EnvironmentTexture;

use super::TextureLoader;

#[derive(Debug, Default, Clone, Copy)]
pub struct HdrLoader;

impl TextureLoader for HdrLoader {
    fn load(&self, path: &Path) -> Result<EnvironmentTexture, LoadError> {
        let image = image::open(path)?.into_rgba32f();
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| p.0).collect();
        Ok(EnvironmentTexture::new(width, height, data))
    }
}
