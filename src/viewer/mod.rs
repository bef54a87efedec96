//! # Viewer Lifecycle
//!
//! [`Viewer`] owns the scene and orchestrates everything around it: configuration,
//! scene construction, asynchronous model and environment loads, the per-frame tick
//! and teardown. It is driven from a single thread; loads run on a [`Spawner`] and
//! their results are applied during [`Viewer::tick`] or [`Viewer::poll`].
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --attach--> Initializing --> Ready <--> Loading
//!       |                                      |          |
//!       +--------------------dispose-----------+----------+--> Disposed
//! ```
//!
//! Every model request is stamped with a new generation. Only the result for the
//! latest generation is installed; older ones are dropped unseen. Installing a model
//! disposes the one it replaces in the same step, so at most one model is ever live.
//!
//! ## Usage
//!
//! ```no_run
//! use meshview::config::PartialViewerConfig;
//! use meshview::gfx::rendering::RenderEngine;
//! use meshview::viewer::{Viewer, ViewerEvent};
//!
//! let mut viewer: Viewer<RenderEngine> = Viewer::new(PartialViewerConfig::default())
//!     .with_model_path("assets/teapot.obj");
//! viewer.add_listener(|event| {
//!     if let ViewerEvent::ModelLoaded { path, triangles } = event {
//!         println!("{path}: {triangles} triangles");
//!     }
//! });
//! // viewer.attach(render_engine, width, height);
//! // then once per frame: viewer.tick(elapsed_seconds);
//! ```

pub mod environment;
pub mod events;
pub mod model_manager;
pub mod triangles;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use cgmath::{Matrix4, Rad, Vector3};

use crate::config::{
    Color, PartialCameraConfig, PartialControlsConfig, PartialGridConfig, PartialRenderingConfig,
    PartialViewerConfig, PartialWireframeConfig, ViewerConfig,
};
use crate::error::{DisposalError, ViewerError};
use crate::gfx::camera::camera_utils::round2_vec;
use crate::gfx::camera::{OrbitControls, PerspectiveCamera};
use crate::gfx::rendering::{RenderFrame, Renderer, RendererSettings};
use crate::gfx::resources::ResourceRegistry;
use crate::gfx::scene::{AmbientLight, DirectionalLight, EnvironmentTexture, GridHelper, Node};
use crate::loaders::hdr::HdrLoader;
use crate::loaders::{
    AssetKind, Generation, LoadMessage, LoadOutcome, LoadingManager, MeshFileLoader, ModelLoader,
    Spawner, TextureLoader,
};

pub use environment::{EnvironmentManager, EnvironmentOutcome};
pub use events::{Listener, ViewerEvent};
pub use model_manager::{ModelManager, PreparedModel, TARGET_SIZE};
pub use triangles::count_triangles;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Uninitialized,
    Initializing,
    Ready,
    Loading,
    Disposed,
}

/// Scene objects that exist from attach until dispose
struct SceneState {
    camera: PerspectiveCamera,
    controls: OrbitControls,
    ambient: AmbientLight,
    directional: DirectionalLight,
    grid: GridHelper,
    background: Option<Color>,
    /// Rotation of the group holding the grid and the model, in radians about +Y
    rotation_y: f32,
}

pub struct Viewer<R: Renderer> {
    overrides: PartialViewerConfig,
    config: ViewerConfig,
    state: ViewerState,
    model_path: Option<String>,
    renderer: Option<R>,
    scene: Option<SceneState>,
    registry: ResourceRegistry,
    loading: LoadingManager,
    model_loader: Arc<dyn ModelLoader>,
    texture_loader: Arc<dyn TextureLoader>,
    model_generation: Generation,
    model_pending: bool,
    models: ModelManager,
    environment: EnvironmentManager,
    listeners: Vec<Listener>,
    interacting: bool,
    wireframe_visible: bool,
    auto_rotate: bool,
}

impl<R: Renderer> Viewer<R> {
    /// Creates a detached viewer. Loads use worker threads and the bundled loaders
    /// unless replaced with the `with_*` builders.
    pub fn new(overrides: PartialViewerConfig) -> Self {
        let config = ViewerConfig::from_overrides(&overrides);
        Self {
            models: ModelManager::new(config.wireframe.color),
            wireframe_visible: config.wireframe.enable_wireframe,
            auto_rotate: config.auto_rotate,
            overrides,
            config,
            state: ViewerState::Uninitialized,
            model_path: None,
            renderer: None,
            scene: None,
            registry: ResourceRegistry::new(),
            loading: LoadingManager::with_threads(),
            model_loader: Arc::new(MeshFileLoader),
            texture_loader: Arc::new(HdrLoader),
            model_generation: Generation::default(),
            model_pending: false,
            environment: EnvironmentManager::new(),
            listeners: Vec::new(),
            interacting: false,
        }
    }

    pub fn with_spawner(mut self, spawner: Box<dyn Spawner>) -> Self {
        self.loading = LoadingManager::new(spawner);
        self
    }

    pub fn with_model_loader(mut self, loader: Arc<dyn ModelLoader>) -> Self {
        self.model_loader = loader;
        self
    }

    pub fn with_texture_loader(mut self, loader: Arc<dyn TextureLoader>) -> Self {
        self.texture_loader = loader;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.set_model_path(path);
        self
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    /// The merged configuration. Fixed once attached.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn model_path(&self) -> Option<&str> {
        self.model_path.as_deref()
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.scene.as_ref().map(|s| &s.camera)
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.scene.as_ref().map(|s| &s.controls)
    }

    pub fn grid(&self) -> Option<&GridHelper> {
        self.scene.as_ref().map(|s| &s.grid)
    }

    pub fn rotation_y(&self) -> f32 {
        self.scene.as_ref().map_or(0.0, |s| s.rotation_y)
    }

    pub fn active_model(&self) -> Option<&Node> {
        self.models.active()
    }

    pub fn environment(&self) -> Option<&EnvironmentTexture> {
        self.environment.current()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn wireframe_visible(&self) -> bool {
        self.wireframe_visible
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    fn is_live(&self) -> bool {
        matches!(self.state, ViewerState::Ready | ViewerState::Loading)
    }

    fn is_detached(&self) -> bool {
        matches!(
            self.state,
            ViewerState::Uninitialized | ViewerState::Initializing
        )
    }

    /// Builds the scene around `renderer` and starts the configured loads.
    ///
    /// Only the first call has an effect.
    pub fn attach(&mut self, mut renderer: R, width: u32, height: u32) {
        if self.state != ViewerState::Uninitialized {
            log::warn!("Viewer is {:?}; ignoring attach", self.state);
            return;
        }
        self.state = ViewerState::Initializing;

        self.config = ViewerConfig::from_overrides(&self.overrides);
        for warning in self.config.diagnostics() {
            log::warn!("Suspicious configuration: {}", warning);
        }
        let config = self.config.clone();

        let aspect = if height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let mut camera = PerspectiveCamera::new(config.camera.fov, aspect, NEAR, FAR);
        let target = Vector3::from(config.controls.target_position);
        camera.set_position(Vector3::from(config.camera.camera_position));
        camera.look_at(target);
        camera.update_view_proj();

        let mut controls = OrbitControls::new(target);
        controls.enable_rotate = config.controls.enable_controls;
        controls.enable_zoom = config.controls.enable_zoom;

        let mut grid = GridHelper::from_config(&config.grid);
        grid.upload(&mut self.registry);

        renderer.configure(&RendererSettings::default());
        renderer.set_size(width, height);

        self.scene = Some(SceneState {
            camera,
            controls,
            ambient: AmbientLight::from_config(&config.rendering),
            directional: DirectionalLight::from_config(&config.lighting),
            grid,
            background: config.rendering.background_color,
            rotation_y: 0.0,
        });
        self.renderer = Some(renderer);
        self.models = ModelManager::new(config.wireframe.color);
        self.wireframe_visible = config.wireframe.enable_wireframe;
        self.auto_rotate = config.auto_rotate;
        self.state = ViewerState::Ready;
        log::info!("Viewer attached at {}x{}", width, height);

        if let Some(path) = config.rendering.environment_path.filter(|p| !p.is_empty()) {
            self.start_environment_load(&path);
        }
        if let Some(path) = self.model_path.clone() {
            self.start_model_load(&path);
        }
    }

    /// Points the viewer at a new model.
    ///
    /// Before attach the path is only remembered. Afterwards a load starts at once and
    /// supersedes any load still in flight. Empty paths are ignored.
    pub fn set_model_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path.is_empty() {
            log::debug!("Ignoring empty model path");
            return;
        }
        if self.state == ViewerState::Disposed {
            log::warn!("Viewer is disposed; ignoring model path {}", path);
            return;
        }

        self.model_path = Some(path.clone());
        if self.is_live() {
            self.start_model_load(&path);
        }
    }

    /// Replaces the environment texture. The current one is released immediately.
    pub fn load_environment(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path.is_empty() || self.state == ViewerState::Disposed {
            return;
        }
        if self.is_detached() {
            self.update_overrides(|o| {
                o.rendering
                    .get_or_insert_with(PartialRenderingConfig::default)
                    .environment_path = Some(path);
            });
            return;
        }
        self.start_environment_load(&path);
    }

    fn start_model_load(&mut self, path: &str) {
        self.model_generation = self.model_generation.next();
        self.model_pending = true;
        self.loading
            .load_model(self.model_loader.clone(), path, self.model_generation);
        self.state = ViewerState::Loading;
        log::info!("Loading model {}", path);
    }

    fn start_environment_load(&mut self, path: &str) {
        if let Err(err) = self.environment.begin_load(&mut self.registry) {
            log_disposal(err);
        }
        let generation = self.environment.generation();
        self.loading
            .load_texture(self.texture_loader.clone(), path, generation);
        log::info!("Loading environment {}", path);
    }

    /// Applies every finished load. Called by [`tick`](Self::tick); hosts that render
    /// on demand can call it directly.
    pub fn poll(&mut self) {
        while let Some((message, progress)) = self.loading.try_recv() {
            if self.state == ViewerState::Disposed {
                log::debug!("Dropping {} loaded after dispose", message.path);
                continue;
            }
            self.handle_load(message);
            self.emit(ViewerEvent::LoadProgress {
                percent: progress.percent(),
            });
        }

        if self.state == ViewerState::Loading && !self.model_pending {
            self.state = ViewerState::Ready;
        }
    }

    fn handle_load(&mut self, message: LoadMessage) {
        let LoadMessage {
            generation,
            path,
            outcome,
        } = message;

        match outcome {
            LoadOutcome::Model(result) => {
                if generation != self.model_generation {
                    log::debug!("Discarding stale model result for {}", path);
                    return;
                }
                self.model_pending = false;
                match result {
                    Ok(root) => {
                        // each new model starts from the configured overlay visibility
                        self.wireframe_visible = self.config.wireframe.enable_wireframe;
                        let prepared = self.models.prepare(root, self.wireframe_visible);
                        let triangles = prepared.triangles;
                        if let Err(err) = self.models.install(prepared, &mut self.registry) {
                            log_disposal(err);
                        }
                        log::info!("Loaded model {} ({} triangles)", path, triangles);
                        self.emit(ViewerEvent::ModelLoaded { path, triangles });
                    }
                    Err(source) => {
                        let cause = source.to_string();
                        log::warn!("{}", ViewerError::ModelLoad { path: path.clone(), source });
                        self.emit(ViewerEvent::LoadFailed {
                            kind: AssetKind::Model,
                            path,
                            cause,
                        });
                    }
                }
            }
            LoadOutcome::Environment(result) => {
                match self
                    .environment
                    .finish_load(generation, result, &mut self.registry)
                {
                    EnvironmentOutcome::Installed => {
                        log::info!("Environment {} installed", path);
                    }
                    EnvironmentOutcome::Stale => {
                        log::debug!("Discarding stale environment result for {}", path);
                    }
                    EnvironmentOutcome::Failed(source) => {
                        let cause = source.to_string();
                        log::warn!(
                            "{}",
                            ViewerError::EnvironmentLoad { path: path.clone(), source }
                        );
                        self.emit(ViewerEvent::LoadFailed {
                            kind: AssetKind::Environment,
                            path,
                            cause,
                        });
                    }
                }
            }
        }
    }

    /// Advances one frame: applies finished loads, updates the controls, auto-rotates
    /// unless the user is interacting, and renders.
    ///
    /// Does nothing unless the viewer is attached and not disposed.
    pub fn tick(&mut self, elapsed: f32) {
        if !self.is_live() {
            return;
        }
        self.poll();

        let rotate_by = if self.auto_rotate && !self.interacting {
            self.config.auto_rotate_speed * elapsed
        } else {
            0.0
        };
        if let Some(scene) = self.scene.as_mut() {
            scene.controls.update(&mut scene.camera);
            scene.rotation_y = (scene.rotation_y + rotate_by).rem_euclid(std::f32::consts::TAU);
            scene.camera.update_view_proj();
        }

        self.render();
    }

    fn render(&mut self) {
        let (Some(scene), Some(renderer)) = (self.scene.as_ref(), self.renderer.as_mut()) else {
            return;
        };
        let frame = RenderFrame {
            camera: &scene.camera,
            background: scene.background,
            environment: self.environment.current(),
            ambient: &scene.ambient,
            directional: &scene.directional,
            root_transform: Matrix4::from_angle_y(Rad(scene.rotation_y)),
            grid: &scene.grid,
            model: self.models.active(),
            registry: &self.registry,
        };
        renderer.render(&frame);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.is_live() || width == 0 || height == 0 {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.camera.resize_projection(width, height);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_size(width, height);
        }
    }

    /// Marks the start of a pointer drag; suppresses auto-rotation until it ends.
    pub fn begin_interaction(&mut self) {
        if !self.is_live() {
            return;
        }
        self.interacting = true;
        if let Some(scene) = self.scene.as_mut() {
            scene.controls.begin_drag();
        }
    }

    /// Ends a pointer drag and reports where the camera ended up.
    pub fn end_interaction(&mut self) {
        if !self.is_live() {
            return;
        }
        self.interacting = false;
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        scene.controls.end_drag();
        let event = ViewerEvent::CameraUpdated {
            camera_position: round2_vec(scene.camera.position.into()),
            target_position: round2_vec(scene.controls.target.into()),
        };
        self.emit(event);
    }

    /// Orbits by pointer movement in pixels. Ignored when rotation is disabled.
    pub fn rotate_camera(&mut self, dx: f32, dy: f32) {
        if !self.is_live() {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.controls.rotate(dx, dy);
            scene.controls.update(&mut scene.camera);
        }
    }

    /// Zooms by wheel steps; positive moves away. Ignored when zoom is disabled.
    pub fn zoom_camera(&mut self, delta: f32) {
        if !self.is_live() {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.controls.zoom(delta);
            scene.controls.update(&mut scene.camera);
        }
    }

    pub fn set_camera_and_target(&mut self, camera_position: [f32; 3], target_position: [f32; 3]) {
        if self.is_detached() {
            self.update_overrides(|o| {
                o.camera
                    .get_or_insert_with(PartialCameraConfig::default)
                    .camera_position = Some(camera_position);
                o.controls
                    .get_or_insert_with(PartialControlsConfig::default)
                    .target_position = Some(target_position);
            });
            return;
        }
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let target = Vector3::from(target_position);
        scene.camera.set_position(Vector3::from(camera_position));
        scene.controls.target = target;
        scene.camera.look_at(target);
        scene.camera.update_view_proj();
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        if self.is_detached() {
            self.update_overrides(|o| {
                o.grid
                    .get_or_insert_with(PartialGridConfig::default)
                    .enable_grid = Some(visible);
            });
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.grid.visible = visible;
        }
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        if self.is_detached() {
            self.update_overrides(|o| o.auto_rotate = Some(enabled));
        }
        self.auto_rotate = enabled;
    }

    /// Shows or hides the wireframe overlays of the active model.
    ///
    /// Models loaded later start from `wireframe.enable_wireframe` again. Before attach
    /// the value is written into that setting instead.
    pub fn set_wireframe_visible(&mut self, visible: bool) {
        if self.is_detached() {
            self.update_overrides(|o| {
                o.wireframe
                    .get_or_insert_with(PartialWireframeConfig::default)
                    .enable_wireframe = Some(visible);
            });
        }
        self.wireframe_visible = visible;
        self.models.set_wireframe_visible(visible);
    }

    fn update_overrides(&mut self, update: impl FnOnce(&mut PartialViewerConfig)) {
        update(&mut self.overrides);
        self.config = ViewerConfig::from_overrides(&self.overrides);
    }

    /// Releases every scene resource and stops ticking. Safe to call at any time and
    /// more than once.
    pub fn dispose(&mut self) {
        if self.state == ViewerState::Disposed {
            return;
        }

        let mut results = vec![
            self.environment.dispose(&mut self.registry),
            self.models.dispose_active(&mut self.registry),
        ];
        if let Some(mut scene) = self.scene.take() {
            results.push(scene.grid.dispose(&mut self.registry));
        }
        for err in results.into_iter().filter_map(Result::err) {
            log_disposal(err);
        }

        self.renderer = None;
        self.interacting = false;
        self.model_pending = false;
        self.state = ViewerState::Disposed;
        log::info!("Viewer disposed");
    }

    fn emit(&mut self, event: ViewerEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

fn log_disposal(err: DisposalError) {
    log::error!("{}", ViewerError::from(err));
}
