mod camera;

pub use camera::{DragGesture, OrbitCamera};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::viewer::LightRig;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const GRID_EXTENT: i32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter available")]
    AdapterUnavailable,
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreate(#[from] wgpu::CreateSurfaceError),
    #[error("failed to acquire graphics device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("failed to acquire frame: {0}")]
    FrameAcquire(wgpu::SurfaceError),
    #[error("capture readback mapping failed: {0}")]
    CaptureMap(#[from] wgpu::BufferAsyncError),
    #[error("capture readback reply never arrived")]
    CaptureLost,
    #[error("failed creating screenshot directory '{path}': {source}")]
    ScreenshotDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing screenshot '{path}': {source}")]
    ScreenshotWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Uniform block shared by the mesh and line pipelines. Layout mirrors
/// `Globals` in `viewer.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    base_color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Geometry for the current frame. Positions are already posed; the
/// index list stays fixed for the lifetime of the installed character.
#[derive(Clone, Copy)]
pub struct MeshFrame<'a> {
    pub positions: &'a [Vec3],
    pub indices: &'a [u32],
}

#[derive(Clone, Copy)]
pub struct FrameParams<'a> {
    pub view_proj: Mat4,
    pub model: Mat4,
    pub light: LightRig,
    pub base_color: [f32; 3],
    pub background: [u8; 3],
    pub mesh: Option<MeshFrame<'a>>,
}

/// Tessellated egui output for one frame.
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    vertex_capacity: usize,
}

pub struct RenderContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    grid_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    mesh: Option<MeshBuffers>,
    staging: Vec<[f32; 3]>,
    egui_renderer: egui_wgpu::Renderer,
    has_rendered: bool,
}

impl RenderContext {
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterUnavailable)?;
        log::info!("Rendering on adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pedestal-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::include_wgsl!("viewer.wgsl"));
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("viewer-pipeline-layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });
        let mesh_pipeline = create_mesh_pipeline(&device, &pipeline_layout, &shader, format);
        let line_pipeline = create_line_pipeline(&device, &pipeline_layout, &shader, format);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals-bind-group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let grid = grid_vertices();
        let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground-grid"),
            contents: bytemuck::cast_slice(&grid),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            mesh_pipeline,
            line_pipeline,
            globals_buffer,
            globals_bind_group,
            grid_buffer,
            grid_vertex_count: grid.len() as u32,
            mesh: None,
            staging: Vec::new(),
            egui_renderer,
            has_rendered: false,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.config.width = new_size.width.max(1);
        self.config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Whether at least one frame has been presented since startup.
    pub fn has_rendered(&self) -> bool {
        self.has_rendered
    }

    pub fn render_frame(&mut self, frame: FrameParams<'_>, ui: UiFrame) -> Result<(), RenderError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => match acquire_action(&err) {
                AcquireAction::ReconfigureAndRedraw => {
                    self.surface.configure(&self.device, &self.config);
                    // Without a queued redraw an on-demand loop would sit on
                    // the stale frame until the next external event.
                    self.window.request_redraw();
                    return Ok(());
                }
                AcquireAction::SkipFrame => return Ok(()),
                AcquireAction::Fail => return Err(RenderError::FrameAcquire(err)),
            },
        };
        let target = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.sync_mesh(frame.mesh);
        self.write_globals(&frame);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: ui.pixels_per_point,
        };
        let ui_commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &ui.primitives,
            &screen,
        );

        self.draw_scene(
            &mut encoder,
            &target,
            &self.depth_view,
            background_clear(frame.background),
        );

        {
            // The overlay pass loads the scene output and has no depth
            // attachment of its own.
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("ui-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.egui_renderer.render(&mut pass, &ui.primitives, &screen);
        }

        self.queue
            .submit(ui_commands.into_iter().chain([encoder.finish()]));
        surface_texture.present();

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        self.has_rendered = true;
        Ok(())
    }

    /// Renders the scene (without the UI overlay) into an offscreen target,
    /// reads it back, and writes a PNG to `path`.
    pub fn capture_png(&mut self, path: &Path, frame: FrameParams<'_>) -> Result<(), RenderError> {
        let width = self.config.width.max(1);
        let height = self.config.height.max(1);
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture-color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = create_depth_view(&self.device, width, height);

        self.sync_mesh(frame.mesh);
        self.write_globals(&frame);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture-encoder"),
            });
        self.draw_scene(
            &mut encoder,
            &color_view,
            &depth_view,
            background_clear(frame.background),
        );

        let bytes_per_row = padded_bytes_per_row(width);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture-readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit([encoder.finish()]);

        let slice = readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| RenderError::CaptureLost)??;

        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }
        }
        readback.unmap();

        if matches!(
            self.config.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        save_png(path, width, height, &pixels)
    }

    fn draw_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        clear: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        if let Some(mesh) = &self.mesh {
            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        // Grid draws after the mesh so its blend only composites over
        // already-resolved fragments.
        pass.set_pipeline(&self.line_pipeline);
        pass.set_vertex_buffer(0, self.grid_buffer.slice(..));
        pass.draw(0..self.grid_vertex_count, 0..1);
    }

    fn sync_mesh(&mut self, mesh: Option<MeshFrame<'_>>) {
        let Some(mesh) = mesh else {
            self.mesh = None;
            return;
        };
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            self.mesh = None;
            return;
        }
        self.staging.clear();
        self.staging
            .extend(mesh.positions.iter().map(|p| p.to_array()));

        let needs_rebuild = self.mesh.as_ref().map_or(true, |buffers| {
            buffers.vertex_capacity != self.staging.len()
                || buffers.index_count as usize != mesh.indices.len()
        });
        if needs_rebuild {
            let vertices = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("character-vertices"),
                    contents: bytemuck::cast_slice(&self.staging),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
            let indices = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("character-indices"),
                    contents: bytemuck::cast_slice(mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            self.mesh = Some(MeshBuffers {
                vertices,
                indices,
                index_count: mesh.indices.len() as u32,
                vertex_capacity: self.staging.len(),
            });
        } else if let Some(buffers) = &self.mesh {
            self.queue
                .write_buffer(&buffers.vertices, 0, bytemuck::cast_slice(&self.staging));
        }
    }

    fn write_globals(&self, frame: &FrameParams<'_>) {
        let light = frame.light;
        let globals = Globals {
            view_proj: frame.view_proj.to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            light_dir: [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                0.0,
            ],
            light_color: [
                light.color[0] * light.intensity,
                light.color[1] * light.intensity,
                light.color[2] * light.intensity,
                light.ambient,
            ],
            base_color: [
                frame.base_color[0],
                frame.base_color[1],
                frame.base_color[2],
                1.0,
            ],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth-texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mesh-pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_mesh"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_mesh"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Character meshes are not guaranteed a consistent winding.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_line_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("line-pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_line"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_line"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn grid_vertices() -> Vec<LineVertex> {
    let reach = GRID_EXTENT as f32;
    let mut lines = Vec::with_capacity((GRID_EXTENT * 2 + 1) as usize * 4);
    for i in -GRID_EXTENT..=GRID_EXTENT {
        let offset = i as f32;
        let color = if i == 0 {
            [0.62, 0.62, 0.66, 0.6]
        } else {
            [0.5, 0.5, 0.52, 0.3]
        };
        lines.push(LineVertex {
            position: [offset, 0.0, -reach],
            color,
        });
        lines.push(LineVertex {
            position: [offset, 0.0, reach],
            color,
        });
        lines.push(LineVertex {
            position: [-reach, 0.0, offset],
            color,
        });
        lines.push(LineVertex {
            position: [reach, 0.0, offset],
            color,
        });
    }
    lines
}

/// How to handle a refused swapchain acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireAction {
    /// Surface parameters went stale; rebuild it and queue a fresh frame.
    ReconfigureAndRedraw,
    /// Transient miss; the next scheduled frame catches up.
    SkipFrame,
    /// Unrecoverable (out of memory and friends).
    Fail,
}

fn acquire_action(err: &wgpu::SurfaceError) -> AcquireAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            AcquireAction::ReconfigureAndRedraw
        }
        wgpu::SurfaceError::Timeout => AcquireAction::SkipFrame,
        _ => AcquireAction::Fail,
    }
}

/// Converts an sRGB background into the linear clear color the surface
/// encodes back to sRGB on present.
fn background_clear(rgb: [u8; 3]) -> wgpu::Color {
    fn channel(value: u8) -> f64 {
        let c = value as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    wgpu::Color {
        r: channel(rgb[0]),
        g: channel(rgb[1]),
        b: channel(rgb[2]),
        a: 1.0,
    }
}

fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + align - 1) / align) * align
}

fn save_png(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| RenderError::ScreenshotDir {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
    }
    image::save_buffer_with_format(
        path,
        pixels,
        width,
        height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|err| RenderError::ScreenshotWrite {
        path: path.to_path_buf(),
        source: err,
    })
}
