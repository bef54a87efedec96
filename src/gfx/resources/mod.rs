// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! The registry tracks which scene resources are live; the renderer creates and evicts
//! GPU buffers from it.

pub mod registry;
pub mod texture_resource;

// Re-export main types
pub use registry::{GpuHandle, ResourceId, ResourceKind, ResourceRegistry};
pub use texture_resource::TextureResource;
