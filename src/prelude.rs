//! # meshview Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use meshview::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let viewer: Viewer<RenderEngine> =
//!         Viewer::new(PartialViewerConfig::default()).with_model_path("model.glb");
//!     ViewerApp::new(viewer).run()
//! }
//! ```

pub use crate::app::ViewerApp;
pub use crate::config::{Color, PartialViewerConfig, ViewerConfig};
pub use crate::error::{ConfigError, LoadError, ViewerError};
pub use crate::gfx::rendering::{RenderEngine, RenderFrame, Renderer, RendererSettings};
pub use crate::gfx::scene::{EnvironmentTexture, Node};
pub use crate::loaders::{ModelLoader, TextureLoader};
pub use crate::viewer::{Viewer, ViewerEvent, ViewerState};

// Re-export commonly used external types
pub use cgmath::{Vector3, Matrix4};
