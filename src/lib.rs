// src/lib.rs
//! meshview
//!
//! An embeddable 3D model viewer built on wgpu and winit. The [`viewer::Viewer`]
//! controller owns the scene and drives asynchronous model and environment loads;
//! [`app::ViewerApp`] hosts it in a window.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod loaders;
pub mod prelude;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use viewer::{Viewer, ViewerEvent, ViewerState};
