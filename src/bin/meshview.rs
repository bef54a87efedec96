//! # meshview
//!
//! Opens a window showing one model.
//!
//! ## Usage:
//! ```bash
//! meshview <model.obj|model.gltf|model.glb> [--config overrides.json] [--environment studio.hdr]
//! ```
//!
//! Drag with the left mouse button to orbit, scroll to zoom, Escape to quit.
//! `RUST_LOG=debug` shows load and disposal details.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use meshview::app::ViewerApp;
use meshview::config::{PartialRenderingConfig, PartialViewerConfig};
use meshview::gfx::rendering::RenderEngine;
use meshview::viewer::{Viewer, ViewerEvent};

#[derive(Parser, Debug)]
#[command(name = "meshview")]
#[command(about = "Orbit viewer for OBJ, glTF and GLB models")]
struct Cli {
    /// Path to a .obj, .gltf or .glb file
    model: String,

    /// JSON file with configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Equirectangular environment map (.hdr or any image format)
    #[arg(long)]
    environment: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let mut overrides = match &args.config {
        Some(path) => PartialViewerConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PartialViewerConfig::default(),
    };
    if let Some(environment) = args.environment {
        overrides
            .rendering
            .get_or_insert_with(PartialRenderingConfig::default)
            .environment_path = Some(environment);
    }

    let mut viewer: Viewer<RenderEngine> = Viewer::new(overrides).with_model_path(args.model);
    viewer.add_listener(|event| match event {
        ViewerEvent::LoadProgress { percent } => log::debug!("Loading: {}%", percent),
        ViewerEvent::ModelLoaded { path, triangles } => {
            log::info!("{}: {} triangles", path, triangles)
        }
        ViewerEvent::CameraUpdated {
            camera_position,
            target_position,
        } => log::info!(
            "Camera at {:?} looking at {:?}",
            camera_position,
            target_position
        ),
        ViewerEvent::LoadFailed { kind, path, cause } => {
            log::error!("Could not load {:?} {}: {}", kind, path, cause)
        }
    });

    ViewerApp::new(viewer).with_title("meshview").run()
}
