use crate::frame::{FrameData, InstanceData, MeshKind, Uniforms};
use crate::geometry::{self, MeshData, Vertex};
use crate::shaders;
use bytemuck::Zeroable;
use physlab_render::Scene;
use wgpu::util::DeviceExt;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: Option<wgpu::Buffer>,
    count: u32,
}

impl GpuMesh {
    fn indexed(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        Self {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            })),
            count: mesh.indices.len() as u32,
        }
    }

    fn lines(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Self {
        Self {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: None,
            count: vertices.len() as u32,
        }
    }
}

/// Instance storage sized for one built lab.
struct SceneBinding {
    instances: wgpu::Buffer,
    capacity: u32,
}

/// wgpu backend drawing a packed [`FrameData`].
///
/// Pipelines and shared meshes live as long as the renderer. The instance
/// buffer is bound to one scene at a time through [`WgpuRenderer::bind_scene`]
/// and freed by [`WgpuRenderer::unbind_scene`].
pub struct WgpuRenderer {
    lit_pipeline: wgpu::RenderPipeline,
    wire_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube: GpuMesh,
    sphere: GpuMesh,
    plane: GpuMesh,
    wire_cube: GpuMesh,
    binding: Option<SceneBinding>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LIT_SHADER.into()),
        });
        let wire_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("wire_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::WIRE_SHADER.into()),
        });

        let lit_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &lit_shader,
            ("vs_main", "fs_main"),
            surface_format,
            wgpu::PrimitiveTopology::TriangleList,
            true,
        );
        let wire_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &wire_shader,
            ("vs_wire", "fs_wire"),
            surface_format,
            wgpu::PrimitiveTopology::LineList,
            false,
        );

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            lit_pipeline,
            wire_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube: GpuMesh::indexed(device, "cube_mesh", &geometry::cube()),
            sphere: GpuMesh::indexed(device, "sphere_mesh", &geometry::sphere(16, 24)),
            plane: GpuMesh::indexed(device, "plane_mesh", &geometry::plane()),
            wire_cube: GpuMesh::lines(device, "wire_cube_mesh", &geometry::wire_cube()),
            binding: None,
            depth_texture,
            surface_format,
        }
    }

    /// Allocate instance storage for every mesh of `scene`.
    pub fn bind_scene(&mut self, device: &wgpu::Device, scene: &Scene) {
        let capacity = scene.mesh_count().max(1) as u32;
        let instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: u64::from(capacity) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        tracing::debug!(capacity, "instance buffer bound");
        self.binding = Some(SceneBinding { instances, capacity });
    }

    pub fn unbind_scene(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.instances.destroy();
            tracing::debug!("instance buffer released");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Draw one frame into `view`. With no bound scene only the clear runs.
    pub fn draw(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView, frame: &FrameData) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));

        let binding = self.binding.as_ref();
        let drawable = match binding {
            Some(b) if frame.instances.len() <= b.capacity as usize => {
                if !frame.instances.is_empty() {
                    queue.write_buffer(&b.instances, 0, bytemuck::cast_slice(&frame.instances));
                }
                Some(b)
            }
            Some(b) => {
                tracing::warn!(
                    instances = frame.instances.len(),
                    capacity = b.capacity,
                    "frame exceeds bound scene, skipping draw"
                );
                None
            }
            None => None,
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(binding) = drawable {
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(1, binding.instances.slice(..));
                for batch in &frame.batches {
                    let (pipeline, mesh) = match batch.kind {
                        MeshKind::Plane => (&self.lit_pipeline, &self.plane),
                        MeshKind::Cube => (&self.lit_pipeline, &self.cube),
                        MeshKind::Sphere => (&self.lit_pipeline, &self.sphere),
                        MeshKind::WireCube => (&self.wire_pipeline, &self.wire_cube),
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                    match &mesh.indices {
                        Some(indices) => {
                            pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                            pass.draw_indexed(0..mesh.count, 0, batch.instances.clone());
                        }
                        None => pass.draw(0..mesh.count, batch.instances.clone()),
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    (vs, fs): (&str, &str),
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    solid: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if solid { "lit_pipeline" } else { "wire_pipeline" }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: if solid { Some(wgpu::Face::Back) } else { None },
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            // Translucent wireframes must not hide what is behind them.
            depth_write_enabled: solid,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
