//! Error types shared across the viewer
//!
//! Load errors are reported to the host through [`crate::viewer::ViewerEvent::LoadFailed`]
//! and never cross the render loop. Disposal errors indicate a broken resource
//! invariant and are only logged.

use thiserror::Error;

use crate::gfx::resources::registry::ResourceId;

/// Failure while reading or decoding an asset on a loader thread.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),

    #[error("no geometry found in {0}")]
    EmptyModel(String),
}

/// Resource release that does not match a live registry handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DisposalError {
    #[error("resource {0:?} was released twice or never registered")]
    UnknownHandle(ResourceId),
}

/// Failure while reading a configuration override.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid color '{0}'")]
    InvalidColor(String),
}

/// Top-level viewer error, used for logging and event causes.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load model {path}: {source}")]
    ModelLoad {
        path: String,
        #[source]
        source: LoadError,
    },

    #[error("failed to load the environment texture from {path}: {source}")]
    EnvironmentLoad {
        path: String,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Disposal(#[from] DisposalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure while bringing up the GPU renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
