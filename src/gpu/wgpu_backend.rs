use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{RenderError, RenderResult};
use crate::RendererConfig;

use super::backend::{BufferId, BufferKind, GpuBackend, Primitive, RenderTarget};
use super::bindings;
use super::ubo::{CameraUniform, LightUniform};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INDIRECT_COMMAND_STRIDE: u64 = 20;

struct BufferEntry {
    buffer: wgpu::Buffer,
    kind: BufferKind,
    size: u64,
    label: &'static str,
}

enum DrawOp {
    SetViewport {
        width: u32,
        height: u32,
    },
    Draw {
        primitive: Primitive,
        vertices: BufferId,
        vertex_count: u32,
    },
    MultiDraw {
        vertices: BufferId,
        indices: BufferId,
        commands: BufferId,
        draw_count: u32,
        instances: Option<BufferId>,
    },
}

struct Segment {
    target: RenderTarget,
    clear: bool,
    ops: Vec<DrawOp>,
}

/// [`GpuBackend`] over wgpu.
///
/// Wraps an existing device/queue pair; does not own a surface. Buffer
/// writes go through the queue immediately, draw-phase calls are recorded
/// and replayed by [`WgpuBackend::submit`] as one shadow depth pass and one
/// screen color pass.
///
/// The device must be created with `Features::MULTI_DRAW_INDIRECT` and
/// `Features::INDIRECT_FIRST_INSTANCE`.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    buffers: FxHashMap<BufferId, BufferEntry>,
    next_id: u64,
    segments: Vec<Segment>,
    pending_instances: Option<BufferId>,

    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    instance_layout: wgpu::BindGroupLayout,
    shadow_bind_group: wgpu::BindGroup,

    shadow_view: wgpu::TextureView,
    screen_depth_view: wgpu::TextureView,

    mesh_pipeline: wgpu::RenderPipeline,
    depth_pipeline: wgpu::RenderPipeline,
    lines_pipeline: wgpu::RenderPipeline,
    triangles_pipeline: wgpu::RenderPipeline,

    clear_color: wgpu::Color,
}

impl WgpuBackend {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        config: &RendererConfig,
    ) -> Self {
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Projection Uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting Uniform"),
            size: std::mem::size_of::<LightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Uniforms Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: bindings::VIEW_PROJECTION,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: bindings::LIGHTING,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Uniforms"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: bindings::VIEW_PROJECTION,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::LIGHTING,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let instance_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Instance Storage Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Map Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: config.shadow_map_size,
                height: config.shadow_map_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let shadow_view = shadow_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Map"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let screen_depth_view = Self::create_screen_depth(
            &device,
            config.viewport_width,
            config.viewport_height,
        );

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });
        let lines_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lines.wgsl").into()),
        });

        let mesh_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 36,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        };

        let prim_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 16,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
            ],
        };

        let depth_state = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &instance_layout, &shadow_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: "vs_main",
                buffers: &[mesh_vertex_layout.clone()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let depth_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &instance_layout],
            push_constant_ranges: &[],
        });

        let depth_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Pipeline"),
            layout: Some(&depth_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: "vs_main",
                buffers: &[mesh_vertex_layout],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let prim_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Primitive Pipeline Layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let make_prim_pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&prim_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &lines_shader,
                    entry_point: "vs_main",
                    buffers: &[prim_vertex_layout.clone()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &lines_shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state.clone()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let lines_pipeline = make_prim_pipeline("Lines Pipeline", wgpu::PrimitiveTopology::LineList);
        let triangles_pipeline =
            make_prim_pipeline("Triangles Pipeline", wgpu::PrimitiveTopology::TriangleList);

        Self {
            device,
            queue,
            buffers: FxHashMap::default(),
            next_id: 0,
            segments: Vec::new(),
            pending_instances: None,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            instance_layout,
            shadow_bind_group,
            shadow_view,
            screen_depth_view,
            mesh_pipeline,
            depth_pipeline,
            lines_pipeline,
            triangles_pipeline,
            clear_color: wgpu::Color {
                r: config.clear_color[0],
                g: config.clear_color[1],
                b: config.clear_color[2],
                a: config.clear_color[3],
            },
        }
    }

    fn create_screen_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screen Depth"),
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

    /// Upload this frame's camera and lighting blocks.
    pub fn update_frame_uniforms(&self, camera: &CameraUniform, light: &LightUniform) {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(light));
    }

    /// Recreate the screen depth attachment after a surface resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_depth_view = Self::create_screen_depth(&self.device, width, height);
    }

    fn entry(&self, id: BufferId) -> RenderResult<&BufferEntry> {
        self.buffers
            .get(&id)
            .ok_or(RenderError::UnknownBuffer(id.raw()))
    }

    fn current_segment(&mut self, fallback: RenderTarget) -> &mut Segment {
        if self.segments.is_empty() {
            self.segments.push(Segment {
                target: fallback,
                clear: false,
                ops: Vec::new(),
            });
        }
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    /// Replay the recorded frame into `encoder`: the shadow segments render
    /// into the shadow map, the screen segments into `surface_view`.
    pub fn submit(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) -> RenderResult<()> {
        let segments = std::mem::take(&mut self.segments);
        self.pending_instances = None;

        // Bind groups must exist before a pass borrows them.
        let mut instance_groups: Vec<Vec<Option<wgpu::BindGroup>>> = Vec::new();
        for segment in &segments {
            let mut groups = Vec::with_capacity(segment.ops.len());
            for op in &segment.ops {
                if let DrawOp::MultiDraw {
                    instances: Some(id), ..
                } = op
                {
                    let entry = self.entry(*id)?;
                    groups.push(Some(self.device.create_bind_group(
                        &wgpu::BindGroupDescriptor {
                            label: Some("Instance Storage"),
                            layout: &self.instance_layout,
                            entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: entry.buffer.as_entire_binding(),
                            }],
                        },
                    )));
                } else {
                    groups.push(None);
                }
            }
            instance_groups.push(groups);
        }

        for (segment, groups) in segments.iter().zip(&instance_groups) {
            match segment.target {
                RenderTarget::ShadowDepth => {
                    self.replay_shadow_segment(encoder, segment, groups)?;
                }
                RenderTarget::Screen => {
                    self.replay_screen_segment(encoder, surface_view, segment, groups)?;
                }
            }
        }

        Ok(())
    }

    fn replay_shadow_segment(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        segment: &Segment,
        groups: &[Option<wgpu::BindGroup>],
    ) -> RenderResult<()> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: if segment.clear {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.depth_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for (op, group) in segment.ops.iter().zip(groups) {
            match op {
                DrawOp::SetViewport { width, height } => {
                    pass.set_viewport(0.0, 0.0, *width as f32, *height as f32, 0.0, 1.0);
                }
                DrawOp::MultiDraw {
                    vertices,
                    indices,
                    commands,
                    draw_count,
                    ..
                } => {
                    if let Some(group) = group {
                        pass.set_bind_group(1, group, &[]);
                    }
                    pass.set_vertex_buffer(0, self.entry(*vertices)?.buffer.slice(..));
                    pass.set_index_buffer(
                        self.entry(*indices)?.buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    pass.multi_draw_indexed_indirect(
                        &self.entry(*commands)?.buffer,
                        0,
                        *draw_count,
                    );
                }
                DrawOp::Draw { .. } => {
                    // Non-indexed primitives are color-pass only.
                }
            }
        }

        Ok(())
    }

    fn replay_screen_segment(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        segment: &Segment,
        groups: &[Option<wgpu::BindGroup>],
    ) -> RenderResult<()> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Color Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: if segment.clear {
                        wgpu::LoadOp::Clear(self.clear_color)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.screen_depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: if segment.clear {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for (op, group) in segment.ops.iter().zip(groups) {
            match op {
                DrawOp::SetViewport { width, height } => {
                    pass.set_viewport(0.0, 0.0, *width as f32, *height as f32, 0.0, 1.0);
                }
                DrawOp::Draw {
                    primitive,
                    vertices,
                    vertex_count,
                } => {
                    let pipeline = match primitive {
                        Primitive::Lines => &self.lines_pipeline,
                        Primitive::Triangles => &self.triangles_pipeline,
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.entry(*vertices)?.buffer.slice(..));
                    pass.draw(0..*vertex_count, 0..1);
                }
                DrawOp::MultiDraw {
                    vertices,
                    indices,
                    commands,
                    draw_count,
                    ..
                } => {
                    pass.set_pipeline(&self.mesh_pipeline);
                    pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    if let Some(group) = group {
                        pass.set_bind_group(1, group, &[]);
                    }
                    pass.set_bind_group(2, &self.shadow_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.entry(*vertices)?.buffer.slice(..));
                    pass.set_index_buffer(
                        self.entry(*indices)?.buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    pass.multi_draw_indexed_indirect(
                        &self.entry(*commands)?.buffer,
                        0,
                        *draw_count,
                    );
                }
            }
        }

        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        label: &'static str,
    ) -> RenderResult<BufferId> {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Storage => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            BufferKind::Indirect => wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
        };

        // wgpu requires write sizes in whole copy units.
        let size = size.max(4).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            BufferEntry {
                buffer,
                kind,
                size,
                label,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> RenderResult<()> {
        let entry = self.entry(id)?;
        if offset + data.len() as u64 > entry.size {
            return Err(RenderError::WriteOutOfBounds {
                label: entry.label,
                offset,
                len: data.len() as u64,
                capacity: entry.size,
            });
        }

        if entry.kind == BufferKind::Indirect {
            // WGSL has no draw-index builtin; the object array is indexed
            // by instance_index, so each command's first_instance carries
            // its position in the command list.
            let mut patched = data.to_vec();
            let base = offset / INDIRECT_COMMAND_STRIDE;
            for (i, command) in patched
                .chunks_exact_mut(INDIRECT_COMMAND_STRIDE as usize)
                .enumerate()
            {
                let first_instance = (base + i as u64) as u32;
                command[16..20].copy_from_slice(&first_instance.to_le_bytes());
            }
            self.queue.write_buffer(&entry.buffer, offset, &patched);
        } else {
            self.queue.write_buffer(&entry.buffer, offset, data);
        }
        Ok(())
    }

    fn bind_storage_buffer(&mut self, id: BufferId, slot: u32) -> RenderResult<()> {
        self.entry(id)?;
        if slot != bindings::INSTANCE_BUFFER {
            return Err(RenderError::Backend(format!(
                "unsupported storage slot {slot}"
            )));
        }
        self.pending_instances = Some(id);
        Ok(())
    }

    fn bind_render_target(&mut self, target: RenderTarget) {
        self.segments.push(Segment {
            target,
            clear: false,
            ops: Vec::new(),
        });
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.current_segment(RenderTarget::Screen)
            .ops
            .push(DrawOp::SetViewport { width, height });
    }

    fn clear(&mut self, target: RenderTarget) {
        let segment = self.current_segment(target);
        if segment.target == target && segment.ops.is_empty() {
            segment.clear = true;
        }
    }

    fn draw(
        &mut self,
        primitive: Primitive,
        vertices: BufferId,
        vertex_count: u32,
    ) -> RenderResult<()> {
        self.entry(vertices)?;
        self.current_segment(RenderTarget::Screen)
            .ops
            .push(DrawOp::Draw {
                primitive,
                vertices,
                vertex_count,
            });
        Ok(())
    }

    fn multi_draw_indexed_indirect(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        commands: BufferId,
        draw_count: u32,
    ) -> RenderResult<()> {
        self.entry(vertices)?;
        self.entry(indices)?;
        let command_entry = self.entry(commands)?;
        if command_entry.kind != BufferKind::Indirect {
            return Err(RenderError::Backend(format!(
                "buffer '{}' is not an indirect command buffer",
                command_entry.label
            )));
        }

        let instances = self.pending_instances;
        self.current_segment(RenderTarget::Screen)
            .ops
            .push(DrawOp::MultiDraw {
                vertices,
                indices,
                commands,
                draw_count,
                instances,
            });
        Ok(())
    }
}
