use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use cgmath::{Matrix4, Rad, SquareMatrix};

use super::*;
use crate::config::{PartialCameraConfig, PartialControlsConfig};
use crate::error::LoadError;
use crate::gfx::geometry::cube;
use crate::gfx::rendering::{DrawItem, ShadowMapType, ToneMapping};
use crate::gfx::resources::ResourceKind;
use crate::gfx::scene::{Drawable, Material, MaterialSlot, NodeKind, TextureMapping, Transform};
use crate::loaders::ManualSpawner;

/// What the renderer saw in one frame
#[derive(Debug, Clone)]
struct FrameRecord {
    meshes: usize,
    lines: usize,
    root_transform: Matrix4<f32>,
    has_environment: bool,
}

#[derive(Debug, Default)]
struct RenderLog {
    settings: Vec<RendererSettings>,
    sizes: Vec<(u32, u32)>,
    frames: Vec<FrameRecord>,
}

#[derive(Clone, Default)]
struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl Renderer for RecordingRenderer {
    fn configure(&mut self, settings: &RendererSettings) {
        self.log.borrow_mut().settings.push(*settings);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().sizes.push((width, height));
    }

    fn render(&mut self, frame: &RenderFrame<'_>) {
        let items = frame.draw_items();
        let meshes = items
            .iter()
            .filter(|i| matches!(i, DrawItem::Mesh { .. }))
            .count();
        self.log.borrow_mut().frames.push(FrameRecord {
            meshes,
            lines: items.len() - meshes,
            root_transform: frame.root_transform,
            has_environment: frame.environment.is_some(),
        });
    }
}

/// `*two*` paths load two cubes, `*bad*` paths fail, anything else is one cube.
struct StubModelLoader;

impl ModelLoader for StubModelLoader {
    fn load(&self, path: &Path) -> Result<Node, LoadError> {
        let name = path.to_string_lossy();
        if name.contains("bad") {
            return Err(LoadError::EmptyModel(name.to_string()));
        }
        let cube_node = |n: &str| {
            Node::mesh(n, Drawable::new(cube(2.0), MaterialSlot::Single(Material::default())))
        };
        let mut root = Node::group(name.to_string()).with_child(cube_node("a"));
        if name.contains("two") {
            root.add_child(cube_node("b").with_transform(Transform {
                position: cgmath::Vector3::new(3.0, 0.0, 0.0),
                ..Default::default()
            }));
        }
        Ok(root)
    }
}

struct StubTextureLoader;

impl TextureLoader for StubTextureLoader {
    fn load(&self, path: &Path) -> Result<EnvironmentTexture, LoadError> {
        if path.to_string_lossy().contains("bad") {
            return Err(LoadError::UnsupportedFormat(path.display().to_string()));
        }
        Ok(EnvironmentTexture::new(1, 1, vec![[0.5, 0.5, 0.5, 1.0]]))
    }
}

struct Harness {
    viewer: Viewer<RecordingRenderer>,
    spawner: ManualSpawner,
    renderer: RecordingRenderer,
    events: Rc<RefCell<Vec<ViewerEvent>>>,
}

impl Harness {
    fn new(overrides: PartialViewerConfig) -> Self {
        let spawner = ManualSpawner::new();
        let mut viewer = Viewer::new(overrides)
            .with_spawner(Box::new(spawner.clone()))
            .with_model_loader(Arc::new(StubModelLoader))
            .with_texture_loader(Arc::new(StubTextureLoader));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        viewer.add_listener(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            viewer,
            spawner,
            renderer: RecordingRenderer::default(),
            events,
        }
    }

    fn attach(&mut self) {
        self.viewer.attach(self.renderer.clone(), 800, 600);
    }

    fn take_events(&self) -> Vec<ViewerEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn frames(&self) -> Vec<FrameRecord> {
        self.renderer.log.borrow().frames.clone()
    }

    fn overlays_visible(&self) -> Vec<bool> {
        let mut out = Vec::new();
        if let Some(root) = self.viewer.active_model() {
            root.traverse(&mut |node| {
                if matches!(node.kind, NodeKind::Wireframe(_)) {
                    out.push(node.visible);
                }
            });
        }
        out
    }
}

/// Live handles held by the grid helper (line geometry and line material)
const GRID_HANDLES: usize = 2;

fn loaded(path: &str, triangles: u64) -> ViewerEvent {
    ViewerEvent::ModelLoaded {
        path: path.to_string(),
        triangles,
    }
}

fn progress(percent: u32) -> ViewerEvent {
    ViewerEvent::LoadProgress { percent }
}

#[test]
fn test_attach_builds_scene_from_defaults() {
    let mut h = Harness::new(PartialViewerConfig::default());
    assert_eq!(h.viewer.state(), ViewerState::Uninitialized);
    h.attach();
    assert_eq!(h.viewer.state(), ViewerState::Ready);

    let camera = h.viewer.camera().unwrap();
    assert_eq!(camera.position, cgmath::Vector3::new(-6.0, 7.0, 4.0));
    assert_eq!(camera.fov, 50.0);
    assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!((camera.znear, camera.zfar), (0.1, 1000.0));

    let controls = h.viewer.controls().unwrap();
    assert!(controls.enable_rotate && controls.enable_zoom);
    assert!(!h.viewer.grid().unwrap().visible);

    let log = h.renderer.log.borrow();
    assert_eq!(log.settings.len(), 1);
    assert!(log.settings[0].shadow_map_enabled);
    assert_eq!(log.settings[0].shadow_map_type, ShadowMapType::PcfSoft);
    assert_eq!(log.settings[0].tone_mapping, ToneMapping::AcesFilmic);
    assert_eq!(log.sizes, vec![(800, 600)]);
    drop(log);

    assert_eq!(h.viewer.registry().live_count(), GRID_HANDLES);
    assert_eq!(h.spawner.pending(), 0);
}

#[test]
fn test_second_attach_is_ignored() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.attach(RecordingRenderer::default(), 10, 10);
    assert_eq!(h.renderer.log.borrow().settings.len(), 1);
    assert_eq!(h.viewer.registry().live_count(), GRID_HANDLES);
}

#[test]
fn test_pre_attach_model_path_loads_on_attach() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.viewer.set_model_path("cube.obj");
    assert_eq!(h.spawner.pending(), 0);
    assert_eq!(h.viewer.model_path(), Some("cube.obj"));

    h.attach();
    assert_eq!(h.viewer.state(), ViewerState::Loading);
    assert_eq!(h.spawner.pending(), 1);

    h.spawner.run_all();
    h.viewer.tick(0.016);
    assert_eq!(h.viewer.state(), ViewerState::Ready);
    assert_eq!(h.take_events(), vec![loaded("cube.obj", 12), progress(100)]);
    assert!(h.viewer.active_model().is_some());
}

#[test]
fn test_model_is_normalized_on_load() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("two.obj");
    h.spawner.run_all();
    h.viewer.poll();

    let root = h.viewer.active_model().unwrap();
    let world = root.content_bounds().transform(&root.transform.matrix());
    assert!((world.diagonal() - TARGET_SIZE).abs() < 1e-4);
    assert!(world.min.y.abs() < 1e-5);
    assert!(world.center().x.abs() < 1e-5);
    assert!(world.center().z.abs() < 1e-5);
}

#[test]
fn test_stale_result_is_discarded() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("first.obj");
    h.viewer.set_model_path("two.obj");
    assert_eq!(h.spawner.pending(), 2);

    h.spawner.run_all();
    h.viewer.tick(0.016);

    assert_eq!(
        h.take_events(),
        vec![progress(50), loaded("two.obj", 24), progress(100)]
    );
    assert_eq!(h.viewer.active_model().unwrap().name, "two.obj");
    assert_eq!(h.viewer.state(), ViewerState::Ready);
}

#[test]
fn test_out_of_order_completion_keeps_latest() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("first.obj");
    h.viewer.set_model_path("two.obj");

    h.spawner.run_last();
    h.viewer.poll();
    assert_eq!(h.viewer.active_model().unwrap().name, "two.obj");
    assert_eq!(h.viewer.state(), ViewerState::Ready);

    h.spawner.run_all();
    h.viewer.poll();
    assert_eq!(h.viewer.active_model().unwrap().name, "two.obj");
    let models = h
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, ViewerEvent::ModelLoaded { .. }))
        .count();
    assert_eq!(models, 1);
}

#[test]
fn test_swaps_do_not_leak_resources() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();

    for path in ["one.obj", "two.obj", "cube.obj", "two.obj"] {
        h.viewer.set_model_path(path);
        h.spawner.run_all();
        h.viewer.poll();
    }

    // two cubes: two meshes and two overlays, each with a geometry and a material
    let registry = h.viewer.registry();
    assert_eq!(registry.live_count(), GRID_HANDLES + 8);
    assert_eq!(registry.live_count_of(ResourceKind::Geometry), 1 + 4);
}

#[test]
fn test_load_failure_keeps_previous_model() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("cube.obj");
    h.spawner.run_all();
    h.viewer.poll();
    h.take_events();

    h.viewer.set_model_path("bad.obj");
    h.spawner.run_all();
    h.viewer.poll();

    let events = h.take_events();
    assert!(matches!(
        &events[0],
        ViewerEvent::LoadFailed { kind: AssetKind::Model, path, .. } if path == "bad.obj"
    ));
    assert_eq!(events[1], progress(100));
    assert_eq!(h.viewer.active_model().unwrap().name, "cube.obj");
    assert_eq!(h.viewer.state(), ViewerState::Ready);
}

#[test]
fn test_empty_path_is_ignored() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("");
    assert_eq!(h.spawner.pending(), 0);
    assert_eq!(h.viewer.state(), ViewerState::Ready);
}

#[test]
fn test_auto_rotation_wraps_at_full_turn() {
    let overrides = PartialViewerConfig {
        auto_rotate: Some(true),
        auto_rotate_speed: Some(1.0),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();

    for _ in 0..100 {
        h.viewer.tick(1.0);
    }
    let expected = 100.0_f32.rem_euclid(std::f32::consts::TAU);
    assert!(h.viewer.rotation_y() >= 0.0);
    assert!(h.viewer.rotation_y() < std::f32::consts::TAU);
    assert!((h.viewer.rotation_y() - expected).abs() < 1e-3);
}

#[test]
fn test_auto_rotate_advances_rotate_group() {
    let overrides = PartialViewerConfig {
        auto_rotate: Some(true),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();

    h.viewer.tick(2.0);
    assert!((h.viewer.rotation_y() - 0.2).abs() < 1e-6);

    let frames = h.frames();
    let expected = Matrix4::from_angle_y(Rad(0.2_f32));
    let actual = frames.last().unwrap().root_transform;
    let diff: f32 = (0..4)
        .flat_map(|c| (0..4).map(move |r| (c, r)))
        .map(|(c, r)| (actual[c][r] - expected[c][r]).abs())
        .sum();
    assert!(diff < 1e-5);
}

#[test]
fn test_interaction_suppresses_auto_rotate() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_auto_rotate(true);

    h.viewer.begin_interaction();
    assert!(h.viewer.is_interacting());
    h.viewer.tick(1.0);
    assert_eq!(h.viewer.rotation_y(), 0.0);

    h.viewer.end_interaction();
    assert!(!h.viewer.is_interacting());
    h.viewer.tick(1.0);
    assert!((h.viewer.rotation_y() - 0.1).abs() < 1e-6);

    h.viewer.set_auto_rotate(false);
    h.viewer.tick(1.0);
    assert!((h.viewer.rotation_y() - 0.1).abs() < 1e-6);
}

#[test]
fn test_end_interaction_reports_rounded_camera() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_camera_and_target([1.234, 2.346, 3.456], [0.001, 0.0, -0.006]);
    h.viewer.begin_interaction();
    h.viewer.end_interaction();

    assert_eq!(
        h.take_events(),
        vec![ViewerEvent::CameraUpdated {
            camera_position: [1.23, 2.35, 3.46],
            target_position: [0.0, 0.0, -0.01],
        }]
    );
}

#[test]
fn test_rotate_camera_respects_enable_controls() {
    let overrides = PartialViewerConfig {
        controls: Some(PartialControlsConfig {
            enable_controls: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();
    let before = h.viewer.camera().unwrap().position;
    h.viewer.rotate_camera(120.0, 40.0);
    assert_eq!(h.viewer.camera().unwrap().position, before);

    // zoom is still enabled
    h.viewer.zoom_camera(1.0);
    assert_ne!(h.viewer.camera().unwrap().position, before);
}

#[test]
fn test_rotate_camera_orbits_target() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    let before = h.viewer.camera().unwrap().position;
    h.viewer.rotate_camera(100.0, 0.0);
    let after = h.viewer.camera().unwrap().position;
    assert_ne!(after, before);
    use cgmath::InnerSpace;
    assert!((after.magnitude() - before.magnitude()).abs() < 1e-3);
}

#[test]
fn test_resize_updates_camera_and_renderer() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.resize(1000, 500);
    h.viewer.resize(0, 500);
    assert_eq!(h.viewer.camera().unwrap().aspect, 2.0);
    assert_eq!(h.renderer.log.borrow().sizes, vec![(800, 600), (1000, 500)]);
}

#[test]
fn test_grid_toggle_reaches_renderer() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.tick(0.0);
    h.viewer.set_grid_visible(true);
    h.viewer.tick(0.0);

    let frames = h.frames();
    assert_eq!(frames[0].lines, 0);
    assert_eq!(frames[1].lines, 1);
}

#[test]
fn test_wireframe_toggle_resets_on_next_load() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("cube.obj");
    h.spawner.run_all();
    h.viewer.tick(0.0);
    assert_eq!(h.overlays_visible(), vec![false]);

    h.viewer.set_wireframe_visible(true);
    assert_eq!(h.overlays_visible(), vec![true]);

    h.viewer.set_model_path("two.obj");
    h.spawner.run_all();
    h.viewer.tick(0.0);
    assert_eq!(h.overlays_visible(), vec![false, false]);
    assert!(!h.viewer.wireframe_visible());

    let frame = h.frames().last().cloned().unwrap();
    assert_eq!(frame.meshes, 2);
    assert_eq!(frame.lines, 0);
}

#[test]
fn test_configured_wireframe_applies_to_every_load() {
    let overrides = PartialViewerConfig {
        wireframe: Some(crate::config::PartialWireframeConfig {
            enable_wireframe: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();
    h.viewer.set_model_path("cube.obj");
    h.spawner.run_all();
    h.viewer.tick(0.0);
    h.viewer.set_wireframe_visible(false);
    assert_eq!(h.overlays_visible(), vec![false]);

    h.viewer.set_model_path("two.obj");
    h.spawner.run_all();
    h.viewer.tick(0.0);
    assert_eq!(h.overlays_visible(), vec![true, true]);
}

#[test]
fn test_pre_attach_toggles_apply_on_attach() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.viewer.set_grid_visible(true);
    h.viewer.set_wireframe_visible(true);
    h.viewer.set_auto_rotate(true);
    h.viewer.set_camera_and_target([0.0, 0.0, 9.0], [0.0, 1.0, 0.0]);
    h.attach();

    assert!(h.viewer.grid().unwrap().visible);
    assert!(h.viewer.wireframe_visible());
    assert!(h.viewer.auto_rotate());
    assert_eq!(
        h.viewer.camera().unwrap().position,
        cgmath::Vector3::new(0.0, 0.0, 9.0)
    );
    assert_eq!(h.viewer.controls().unwrap().target, cgmath::Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn test_environment_lifecycle() {
    let overrides = PartialViewerConfig {
        rendering: Some(crate::config::PartialRenderingConfig {
            environment_path: Some("studio.hdr".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();
    assert_eq!(h.spawner.pending(), 1);
    assert_eq!(h.viewer.state(), ViewerState::Ready);

    h.spawner.run_all();
    h.viewer.tick(0.0);
    let env = h.viewer.environment().unwrap();
    assert_eq!(env.mapping, TextureMapping::EquirectangularReflection);
    assert!(h.frames()[0].has_environment);
    assert_eq!(h.viewer.registry().live_count_of(ResourceKind::Texture), 1);

    // the held texture is released before the new load is issued
    h.viewer.load_environment("bad.hdr");
    assert!(h.viewer.environment().is_none());
    assert_eq!(h.viewer.registry().live_count_of(ResourceKind::Texture), 0);

    h.spawner.run_all();
    h.viewer.poll();
    let events = h.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ViewerEvent::LoadFailed { kind: AssetKind::Environment, .. }
    )));
    assert!(h.viewer.environment().is_none());
}

#[test]
fn test_model_and_environment_share_progress() {
    let overrides = PartialViewerConfig {
        rendering: Some(crate::config::PartialRenderingConfig {
            environment_path: Some("studio.hdr".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.viewer.set_model_path("cube.obj");
    h.attach();
    h.spawner.run_all();
    h.viewer.poll();

    assert_eq!(
        h.take_events(),
        vec![progress(50), loaded("cube.obj", 12), progress(100)]
    );
}

#[test]
fn test_dispose_releases_everything() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.load_environment("studio.hdr");
    h.viewer.set_model_path("two.obj");
    h.spawner.run_all();
    h.viewer.poll();
    assert!(h.viewer.registry().live_count() > GRID_HANDLES);

    h.viewer.dispose();
    assert_eq!(h.viewer.state(), ViewerState::Disposed);
    assert_eq!(h.viewer.registry().live_count(), 0);
    assert!(h.viewer.active_model().is_none());
    assert!(h.viewer.environment().is_none());
    assert!(h.viewer.renderer().is_none());

    h.viewer.dispose();
    assert_eq!(h.viewer.state(), ViewerState::Disposed);
}

#[test]
fn test_results_after_dispose_are_dropped() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.set_model_path("cube.obj");
    h.viewer.dispose();

    h.spawner.run_all();
    h.viewer.poll();
    h.viewer.tick(0.016);

    assert!(h.take_events().is_empty());
    assert!(h.viewer.active_model().is_none());
    assert_eq!(h.viewer.registry().live_count(), 0);
    assert!(h.frames().is_empty());
}

#[test]
fn test_dispose_before_attach_is_safe() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.viewer.dispose();
    h.viewer.dispose();
    assert_eq!(h.viewer.state(), ViewerState::Disposed);

    h.attach();
    assert_eq!(h.viewer.state(), ViewerState::Disposed);
    assert!(h.renderer.log.borrow().settings.is_empty());
}

#[test]
fn test_tick_before_attach_does_nothing() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.viewer.set_model_path("cube.obj");
    h.viewer.tick(1.0);
    assert!(h.frames().is_empty());
    assert_eq!(h.spawner.pending(), 0);
}

#[test]
fn test_out_of_range_config_passes_through() {
    let overrides = PartialViewerConfig {
        camera: Some(PartialCameraConfig {
            fov: Some(-20.0),
            ..Default::default()
        }),
        grid: Some(crate::config::PartialGridConfig {
            divisions: Some(0),
            enable_grid: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut h = Harness::new(overrides);
    h.attach();
    h.viewer.tick(0.016);

    assert_eq!(h.viewer.config().camera.fov, -20.0);
    assert_eq!(h.viewer.camera().unwrap().fov, -20.0);
    assert_eq!(h.frames().len(), 1);
}

#[test]
fn test_frame_identity_without_rotation() {
    let mut h = Harness::new(PartialViewerConfig::default());
    h.attach();
    h.viewer.tick(5.0);
    assert_eq!(h.frames()[0].root_transform, Matrix4::identity());
}

struct RefusingSpawner;

impl Spawner for RefusingSpawner {
    fn spawn(&self, _job: crate::loaders::manager::Job) -> std::io::Result<()> {
        Err(std::io::Error::other("thread limit reached"))
    }
}

#[test]
fn test_spawn_failure_reports_load_failed() {
    let mut viewer = Viewer::new(PartialViewerConfig::default())
        .with_spawner(Box::new(RefusingSpawner))
        .with_model_loader(Arc::new(StubModelLoader))
        .with_model_path("cube.obj");
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    viewer.add_listener(move |event| sink.borrow_mut().push(event.clone()));

    viewer.attach(RecordingRenderer::default(), 800, 600);
    viewer.tick(0.0);

    assert_eq!(viewer.state(), ViewerState::Ready);
    assert!(viewer.active_model().is_none());
    let events = events.borrow();
    assert!(matches!(
        &events[0],
        ViewerEvent::LoadFailed { kind: AssetKind::Model, path, .. } if path == "cube.obj"
    ));
    assert_eq!(events[1], progress(100));
}
