// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The [`Renderer`] trait is the seam between the viewer and the GPU; [`RenderEngine`]
//! is its wgpu implementation.

pub mod pipeline_manager;
pub mod render_engine;
pub mod renderer;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
pub use render_engine::RenderEngine;
pub use renderer::{DrawItem, RenderFrame, Renderer, RendererSettings, ShadowMapType, ToneMapping};
