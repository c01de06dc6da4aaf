//! WebGPU render pipeline for level geometry
//!
//! Vertices stay in world units (Y-up, origin at the bottom-left corner of the
//! level). The vertex shader maps them onto the viewport using the level size
//! held in a small uniform, so a frame's geometry is uploaded untouched.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::vertex::{Vertex, colors};

/// Level dimensions as seen by the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct ViewUniform {
    world_size: [f32; 2],
    _pad: [f32; 2],
}

impl ViewUniform {
    fn new(world_size: (f32, f32)) -> Self {
        Self {
            world_size: [world_size.0.max(1.0), world_size.1.max(1.0)],
            _pad: [0.0; 2],
        }
    }
}

const VERTEX_USAGE: wgpu::BufferUsages =
    wgpu::BufferUsages::VERTEX.union(wgpu::BufferUsages::COPY_DST);

/// GPU side of the level view
pub struct RenderState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    view_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    /// Backing store size in pixels
    pub size: (u32, u32),
    /// Level size in world units, stretched over the whole viewport
    pub world_size: (f32, f32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        world_size: (f32, f32),
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("blockhop-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface {}x{} ({:?})", config.width, config.height, format);

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("level-view"),
            contents: bytemuck::bytes_of(&ViewUniform::new(world_size)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("level-view-layout"),
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
        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("level-view-bind-group"),
            layout: &view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        let pipeline = build_pipeline(&device, format, &view_layout);

        // Sized for a typical level; grows on demand
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("level-vertices"),
            size: (4096 * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: VERTEX_USAGE,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            view_buffer,
            view_bind_group,
            vertex_buffer,
            vertex_count: 0,
            size: (width, height),
            world_size,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            return;
        }
        self.size = (new_width, new_height);
        self.config.width = new_width;
        self.config.height = new_height;
        self.surface.configure(&self.device, &self.config);
    }

    /// A different level size, e.g. after attaching another level
    pub fn set_world_size(&mut self, world_size: (f32, f32)) {
        self.world_size = world_size;
        self.queue.write_buffer(
            &self.view_buffer,
            0,
            bytemuck::bytes_of(&ViewUniform::new(world_size)),
        );
    }

    /// World point to normalized device coordinates, matching the shader
    pub fn world_to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        world_to_ndc(self.world_size, x, y)
    }

    fn upload(&mut self, vertices: &[Vertex]) {
        self.vertex_count = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        if bytes.len() as wgpu::BufferAddress > self.vertex_buffer.size() {
            log::debug!("Growing vertex buffer to {} vertices", vertices.len());
            self.vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("level-vertices"),
                    contents: bytes,
                    usage: VERTEX_USAGE,
                });
        } else {
            self.queue.write_buffer(&self.vertex_buffer, 0, bytes);
        }
    }

    /// Draw one frame of world-space triangles over the background colour
    pub fn render(&mut self, vertices: &[Vertex]) -> Result<(), wgpu::SurfaceError> {
        self.upload(vertices);

        let frame = self.surface.get_current_texture()?;
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("level-frame"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("level-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if self.vertex_count > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.view_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.draw(0..self.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    view_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("level-shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("level-pipeline-layout"),
        bind_group_layouts: &[view_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("level-pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        // Tessellated paths mix windings, so nothing is culled
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn clear_color() -> wgpu::Color {
    let [r, g, b, _] = colors::BACKGROUND;
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

/// CPU mirror of the vertex shader's mapping
fn world_to_ndc(world_size: (f32, f32), x: f32, y: f32) -> (f32, f32) {
    let (w, h) = world_size;
    if w <= 0.0 || h <= 0.0 {
        return (0.0, 0.0);
    }
    (x / w * 2.0 - 1.0, y / h * 2.0 - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_ndc_corners() {
        let size = (800.0, 480.0);
        assert_eq!(world_to_ndc(size, 0.0, 0.0), (-1.0, -1.0));
        assert_eq!(world_to_ndc(size, 800.0, 480.0), (1.0, 1.0));
        assert_eq!(world_to_ndc(size, 400.0, 240.0), (0.0, 0.0));
        assert_eq!(world_to_ndc((0.0, 0.0), 5.0, 5.0), (0.0, 0.0));
    }

    #[test]
    fn test_view_uniform_layout() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 16);
        let view = ViewUniform::new((0.0, 480.0));
        assert_eq!(view.world_size, [1.0, 480.0]);
    }
}
