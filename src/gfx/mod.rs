//! # Graphics Module
//!
//! Scene data and rendering for the viewer.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - Perspective camera and orbit controls
//! - **Geometry** ([`geometry`]) - Triangle and line geometry, bounds, primitives
//! - **Scene** ([`scene`]) - Node tree, materials, lights, grid and environment texture
//! - **Resources** ([`resources`]) - Registry of live GPU-backed resources
//! - **Rendering** ([`rendering`]) - The [`Renderer`] seam and its wgpu implementation
//!
//! Scene types never hold GPU objects. Each carries a [`resources::GpuHandle`] that the
//! viewer registers and releases; the renderer creates buffers for live handles and
//! drops them once released.
//!
//! [`Renderer`]: rendering::Renderer

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{OrbitControls, PerspectiveCamera};
pub use rendering::{RenderEngine, Renderer};
