//! WGPU forward renderer for the viewer
//!
//! Implements [`Renderer`] on top of wgpu: one pass per frame drawing meshes with
//! directional, ambient and environment-average lighting, and line overlays unlit.
//! GPU buffers are created lazily per [`ResourceId`] and evicted once the registry
//! reports the resource released.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;
use wgpu::TextureFormat;

use crate::error::RenderError;
use crate::gfx::geometry::{Geometry, LineGeometry};
use crate::gfx::resources::{ResourceId, TextureResource};
use crate::wgpu_utils::{dynamic_uniform, single_entry_layout, uniform, DynamicUniformBuffer, UniformBuffer};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use super::renderer::{DrawItem, RenderFrame, Renderer, RendererSettings, ToneMapping};

const MESH_PIPELINE: &str = "Mesh";
const LINE_PIPELINE: &str = "Lines";
const MSAA_SAMPLES: u32 = 4;

/// Per-frame scene constants, bound at group 0
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_direction: [f32; 4],
    light_radiance: [f32; 4],
    ambient_radiance: [f32; 4],
    environment_radiance: [f32; 4],
    /// x: ACES tone mapping, y: gamma-encode in the shader
    flags: [f32; 4],
}

/// Per-draw constants, bound at group 1 with a dynamic offset
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    /// x: metallic, y: roughness
    params: [f32; 4],
}

impl DrawUniform {
    fn new(world: Matrix4<f32>, color: [f32; 4], params: [f32; 4]) -> Self {
        let normal_matrix = world.invert().map(|m| m.transpose()).unwrap_or(world);
        Self {
            model: world.into(),
            normal_matrix: normal_matrix.into(),
            color,
            params,
        }
    }
}

fn extend(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

/// Vertex (and optional index) buffer for one geometry
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl GpuMesh {
    fn from_geometry(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.to_vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let (index_buffer, count) = match &geometry.indices {
            Some(indices) => {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (Some(buffer), indices.len() - indices.len() % 3)
            }
            None => (None, geometry.vertex_count() - geometry.vertex_count() % 3),
        };
        Self {
            vertex_buffer,
            index_buffer,
            count: count as u32,
        }
    }

    fn from_lines(device: &wgpu::Device, geometry: &LineGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Line Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.to_vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            index_buffer: None,
            count: (geometry.segment_count() * 2) as u32,
        }
    }
}

/// Core rendering engine managing the surface, pipelines and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    settings: RendererSettings,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_target: Option<TextureResource>,
    pipeline_manager: PipelineManager,
    global_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
    globals: UniformBuffer<GlobalUniform>,
    global_bind_group: wgpu::BindGroup,
    draws: DynamicUniformBuffer<DrawUniform>,
    draw_bind_group: wgpu::BindGroup,
    meshes: HashMap<ResourceId, GpuMesh>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    ///
    /// # Errors
    /// Fails if no surface, adapter or device can be created.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let global_layout = single_entry_layout(&device, "Global Layout", uniform());
        let draw_layout =
            single_entry_layout(&device, "Draw Layout", dynamic_uniform::<DrawUniform>());

        let globals = UniformBuffer::<GlobalUniform>::new(&device);
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.binding_resource(),
            }],
        });

        let draws = DynamicUniformBuffer::<DrawUniform>::new(&device, 64);
        let draw_bind_group = Self::create_draw_bind_group(&device, &draw_layout, &draws);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, 1, "depth_texture");

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("viewer", include_str!("viewer.wgsl"));

        let mut engine = RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            settings: RendererSettings::default(),
            sample_count: 1,
            depth_texture,
            msaa_target: None,
            pipeline_manager,
            global_layout,
            draw_layout,
            globals,
            global_bind_group,
            draws,
            draw_bind_group,
            meshes: HashMap::new(),
        };
        engine.build_pipelines();
        Ok(engine)
    }

    fn create_draw_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        draws: &DynamicUniformBuffer<DrawUniform>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: draws.binding_resource(),
            }],
        })
    }

    /// Registers the mesh and line pipelines for the current format and sample count.
    fn build_pipelines(&mut self) {
        let color_targets = vec![Some(wgpu::ColorTargetState {
            format: self.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let layouts = vec![self.global_layout.clone(), self.draw_layout.clone()];

        self.pipeline_manager.register_pipeline(
            MESH_PIPELINE,
            PipelineConfig::default()
                .with_label("MESH")
                .with_shader("viewer")
                .with_entry_points("vs_main", "fs_main")
                .with_vertex_layout(VertexLayout::Mesh)
                .with_bind_group_layouts(layouts.clone())
                // imported models are often open or inconsistently wound
                .with_cull_mode(None)
                .with_depth(TextureResource::DEPTH_FORMAT, true)
                .with_sample_count(self.sample_count)
                .with_color_targets(color_targets.clone()),
        );
        self.pipeline_manager.register_pipeline(
            LINE_PIPELINE,
            PipelineConfig::default()
                .with_label("LINES")
                .with_shader("viewer")
                .with_entry_points("vs_line", "fs_line")
                .with_vertex_layout(VertexLayout::Line)
                .with_bind_group_layouts(layouts)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_depth(TextureResource::DEPTH_FORMAT, false)
                .with_sample_count(self.sample_count)
                .with_color_targets(color_targets),
        );

        if let Err(errors) = self.pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }
    }

    fn recreate_targets(&mut self) {
        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        self.msaa_target = (self.sample_count > 1).then(|| {
            TextureResource::create_msaa_target(&self.device, &self.config, self.sample_count)
        });
    }

    fn global_uniform(&self, frame: &RenderFrame<'_>) -> GlobalUniform {
        let camera = &frame.camera.uniform;
        let environment = frame
            .environment
            .map(|env| env.average_radiance())
            .unwrap_or([0.0; 3]);
        let direction = frame.directional.direction();
        let tone_mapping = match self.settings.tone_mapping {
            ToneMapping::AcesFilmic => 1.0,
            ToneMapping::None => 0.0,
        };
        let gamma = if self.format.is_srgb() { 0.0 } else { 1.0 };

        GlobalUniform {
            view_proj: camera.view_proj,
            camera_position: camera.view_position,
            light_direction: extend(direction.into(), 0.0),
            light_radiance: extend(frame.directional.radiance(), 0.0),
            ambient_radiance: extend(frame.ambient.radiance(), 0.0),
            environment_radiance: extend(environment, 0.0),
            flags: [tone_mapping, gamma, 0.0, 0.0],
        }
    }

    fn clear_color(&self, frame: &RenderFrame<'_>) -> wgpu::Color {
        match frame.background {
            Some(color) => {
                let [r, g, b] = if self.format.is_srgb() {
                    color.to_linear()
                } else {
                    color.to_array()
                };
                wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: 1.0,
                }
            }
            None if self.settings.alpha => wgpu::Color::TRANSPARENT,
            None => wgpu::Color::BLACK,
        }
    }

    /// Current surface size in pixels
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Number of geometries currently held in GPU memory
    pub fn cached_geometry_count(&self) -> usize {
        self.meshes.len()
    }
}

impl Renderer for RenderEngine {
    fn configure(&mut self, settings: &RendererSettings) {
        self.settings = *settings;
        if settings.shadow_map_enabled {
            log::debug!(
                "Shadow maps requested ({:?}); this renderer draws without a shadow pass",
                settings.shadow_map_type
            );
        }

        let sample_count = if settings.antialias { MSAA_SAMPLES } else { 1 };
        if sample_count != self.sample_count {
            self.sample_count = sample_count;
            self.recreate_targets();
            self.build_pipelines();
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.recreate_targets();
    }

    fn render(&mut self, frame: &RenderFrame<'_>) {
        // drop buffers whose scene resources were disposed
        self.meshes.retain(|id, _| frame.registry.is_live(*id));

        let items = frame.draw_items();
        let mut uniforms = Vec::with_capacity(items.len());
        let mut draws = Vec::with_capacity(items.len());

        for item in &items {
            match item {
                DrawItem::Mesh { world, drawable } => {
                    let geometry = &drawable.geometry;
                    let Some(id) = geometry.gpu.id() else {
                        continue;
                    };
                    if geometry.positions.is_empty() {
                        continue;
                    }
                    self.meshes
                        .entry(id)
                        .or_insert_with(|| GpuMesh::from_geometry(&self.device, geometry));

                    let (color, params) = drawable
                        .material
                        .primary()
                        .map(|m| (m.base_color, [m.metallic, m.roughness, 0.0, 0.0]))
                        .unwrap_or(([0.8, 0.8, 0.8, 1.0], [0.0, 1.0, 0.0, 0.0]));
                    uniforms.push(DrawUniform::new(*world, color, params));
                    draws.push((MESH_PIPELINE, id));
                }
                DrawItem::Lines {
                    world,
                    geometry,
                    material,
                } => {
                    let Some(id) = geometry.gpu.id() else {
                        continue;
                    };
                    if geometry.segment_count() == 0 {
                        continue;
                    }
                    self.meshes
                        .entry(id)
                        .or_insert_with(|| GpuMesh::from_lines(&self.device, geometry));

                    uniforms.push(DrawUniform::new(*world, material.rgba(), [0.0; 4]));
                    draws.push((LINE_PIPELINE, id));
                }
            }
        }

        if self.draws.write_all(&self.device, &self.queue, &uniforms) {
            self.draw_bind_group =
                Self::create_draw_bind_group(&self.device, &self.draw_layout, &self.draws);
        }
        let globals = self.global_uniform(frame);
        self.globals.update_content(&self.queue, globals);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                log::warn!("Skipping frame: {}", err);
                return;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let (target_view, resolve_target) = match &self.msaa_target {
            Some(msaa) => (&msaa.view, Some(&surface_view)),
            None => (&surface_view, None),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color(frame)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.global_bind_group, &[]);

            for (slot, (pipeline_name, id)) in draws.iter().enumerate() {
                let (Some(pipeline), Some(mesh)) = (
                    self.pipeline_manager.pipeline(pipeline_name),
                    self.meshes.get(id),
                ) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.draw_bind_group, &[self.draws.offset(slot)]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                match &mesh.index_buffer {
                    Some(index_buffer) => {
                        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..mesh.count, 0, 0..1);
                    }
                    None => render_pass.draw(0..mesh.count, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }
}
