use wgpu::util::DeviceExt;
use web_sys::HtmlCanvasElement;

use super::vertex::{Mesh, Uniforms, Vertex};
use crate::error::{EditorError, Result};
use crate::scene::Color;
use crate::types::BoundingBox;

const SAMPLE_COUNT: u32 = 4;

/// Smallest buffer allocation, in elements
const MIN_CAPACITY: usize = 1024;

fn render_error(what: &str, err: impl std::fmt::Display) -> EditorError {
    EditorError::Render(format!("{what}: {err}"))
}

/// Element capacity to allocate so that `needed` fits, doubling from `current`
fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current.max(MIN_CAPACITY);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}

/// GPU buffer reallocated whenever a frame outgrows it
struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    element_size: usize,
    capacity: usize,
    buffer: wgpu::Buffer,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, element_size: usize) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let capacity = MIN_CAPACITY;
        Self {
            label,
            usage,
            element_size,
            capacity,
            buffer: Self::allocate(device, label, usage, capacity * element_size),
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, size: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as wgpu::BufferAddress,
            usage,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = bytes.len().div_ceil(self.element_size);
        if needed > self.capacity {
            self.capacity = grown_capacity(self.capacity, needed);
            log::debug!("growing {} to {} elements", self.label, self.capacity);
            self.buffer = Self::allocate(device, self.label, self.usage, self.capacity * self.element_size);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }
}

/// Multisampled colour target matching the surface size
struct SampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl SampleTarget {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("backdrop samples"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Draws the tessellated workspace backdrop into a WebGL2 canvas
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertices: GrowableBuffer,
    indices: GrowableBuffer,
    samples: SampleTarget,
}

impl Renderer {
    pub async fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let (width, height) = (canvas.width().max(1), canvas.height().max(1));

        // WebGL2 only; the WebGPU path is not reliable across browsers yet
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| render_error("failed to create surface", e))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| EditorError::Render("no suitable GPU adapter".to_string()))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("backdrop device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| render_error("failed to create device", e))?;

        let caps = surface.get_capabilities(&adapter);
        // colours are already sRGB encoded
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| EditorError::Render("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("backdrop uniforms"),
            contents: bytemuck::bytes_of(&Uniforms::for_surface(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("backdrop uniforms layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("backdrop uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        let pipeline = Self::build_pipeline(&device, &bind_group_layout, format);

        let vertices = GrowableBuffer::new(
            &device,
            "backdrop vertices",
            wgpu::BufferUsages::VERTEX,
            std::mem::size_of::<Vertex>(),
        );
        let indices = GrowableBuffer::new(
            &device,
            "backdrop indices",
            wgpu::BufferUsages::INDEX,
            std::mem::size_of::<u32>(),
        );
        let samples = SampleTarget::new(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniforms,
            bind_group,
            vertices,
            indices,
            samples,
        })
    }

    fn build_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("backdrop shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("backdrop pipeline layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("backdrop pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: SAMPLE_COUNT,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }

    /// Follow the canvas size; a no-op when nothing changed
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.samples = SampleTarget::new(&self.device, &self.config);
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&Uniforms::for_surface(width, height)));
    }

    /// Clear to `clear` and draw `mesh`, limited to `clip` when given
    pub fn render(&mut self, mesh: &Mesh, clear: Color, clip: Option<BoundingBox>) -> Result<()> {
        let frame = self
            .surface
            .get_current_texture()
            .map_err(|e| render_error("failed to acquire frame", e))?;
        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let (width, height) = (self.config.width, self.config.height);
        let scissor = match clip {
            Some(rect) => scissor_rect(&rect, width, height),
            None => Some([0, 0, width, height]),
        };
        let draw = !mesh.is_empty() && scissor.is_some();
        if draw {
            self.vertices
                .upload(&self.device, &self.queue, bytemuck::cast_slice(&mesh.vertices));
            self.indices
                .upload(&self.device, &self.queue, bytemuck::cast_slice(&mesh.indices));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.samples.view,
                    resolve_target: Some(&target),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let (true, Some([x, y, w, h])) = (draw, scissor) {
                pass.set_scissor_rect(x, y, w, h);
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertices.buffer.slice(..));
                pass.set_index_buffer(self.indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.indices.len() as u32, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// Pixel scissor `[x, y, width, height]` for a stage rectangle, or `None`
/// when nothing of it is on the surface
fn scissor_rect(rect: &BoundingBox, width: u32, height: u32) -> Option<[u32; 4]> {
    let x0 = rect.x.floor().clamp(0.0, width as f64) as u32;
    let y0 = rect.y.floor().clamp(0.0, height as f64) as u32;
    let x1 = (rect.x + rect.width).ceil().clamp(0.0, width as f64) as u32;
    let y1 = (rect.y + rect.height).ceil().clamp(0.0, height as f64) as u32;
    (x1 > x0 && y1 > y0).then(|| [x0, y0, x1 - x0, y1 - y0])
}
