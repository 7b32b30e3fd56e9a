//! Rendering system with wgpu pipelines for the sky, water, and lit meshes.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::environment::EnvironmentMap;
use crate::mesh::{MeshData, MeshVertex};
use crate::ocean::OceanVertex;
use crate::params::{hex_rgb, RenderConfig, WaveParams};
use crate::scene::SceneComposer;
use crate::vessel::{Geometry, VesselClass};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Point lights the mesh shader evaluates per frame
pub const MAX_LIGHTS: usize = 4;

const FRAME_WGSL: &str = include_str!("shaders/frame.wgsl");

/// Hull colour for resolved models
const MODEL_COLOR: u32 = 0xd9dde3;
/// Placeholder hull colours by class
const SURFACE_PLACEHOLDER_COLOR: u32 = 0x60a5fa;
const UNDERWATER_PLACEHOLDER_COLOR: u32 = 0x3b82f6;

/// Linear RGB hull colour for the geometry a vessel currently draws
pub fn hull_color(geometry: &Geometry<'_>, class: VesselClass) -> [f32; 3] {
    let hex = match (geometry.is_placeholder(), class) {
        (false, _) => MODEL_COLOR,
        (true, VesselClass::Surface) => SURFACE_PLACEHOLDER_COLOR,
        (true, VesselClass::Underwater) => UNDERWATER_PLACEHOLDER_COLOR,
    };
    hex_rgb(hex)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz: world position, w: range (0 = no falloff)
    pub position_range: [f32; 4],
    /// rgb: colour, a: intensity
    pub color_intensity: [f32; 4],
}

/// Per-frame uniforms shared by every pipeline (group 0, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub sun: [f32; 4],
    /// ambient, light count, environment available, time
    pub params: [f32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

/// Water colour bands and Fresnel terms
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaveUniforms {
    pub trough_color: [f32; 4],
    pub surface_color: [f32; 4],
    pub peak_color: [f32; 4],
    pub bands: [f32; 4],
    pub fresnel: [f32; 4],
}

impl WaveUniforms {
    pub fn new(p: &WaveParams) -> Self {
        let rgb = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
        Self {
            trough_color: rgb(p.trough_color),
            surface_color: rgb(p.surface_color),
            peak_color: rgb(p.peak_color),
            bands: [
                p.peak_threshold,
                p.peak_transition,
                p.trough_threshold,
                p.trough_transition,
            ],
            fresnel: [p.fresnel_scale, p.fresnel_power, p.opacity, 0.0],
        }
    }
}

/// Per-object uniforms for the mesh pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(model: Mat4, color: [f32; 3]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
        }
    }
}

/// Uploaded mesh with its own object uniforms
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// (placeholder?, vertex count) of the uploaded geometry
    key: (bool, usize),
}

impl GpuMesh {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: &MeshData,
        key: (bool, usize),
        label: &str,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[ObjectUniforms::new(Mat4::IDENTITY, [1.0; 3])]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
            key,
        }
    }

    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    skybox_pipeline: wgpu::RenderPipeline,
    ocean_pipeline: wgpu::RenderPipeline,
    mesh_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    env_texture: wgpu::Texture,
    environment_available: bool,
    wave_buffer: wgpu::Buffer,
    wave_bind_group: wgpu::BindGroup,
    ocean_vertex_buffer: wgpu::Buffer,
    ocean_index_buffer: wgpu::Buffer,
    ocean_index_count: u32,
    object_layout: wgpu::BindGroupLayout,
    floor: GpuMesh,
    vessels: Vec<GpuMesh>,
    released: bool,
}

impl RenderSystem {
    /// Create the device, pipelines, and static buffers for `scene`
    pub async fn new(
        window: Arc<winit::window::Window>,
        scene: &SceneComposer,
        render_config: RenderConfig,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("Failed to request device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("Surface reports no texture formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let (depth_texture, depth_view) = create_depth_texture(&device, config.width, config.height);

        let (env_texture, env_view) = create_env_texture(&device, &queue, scene.environment());
        let environment_available = scene.environment().is_some();
        let env_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Frame bind group: uniforms + environment cube
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&env_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&env_sampler),
                },
            ],
        });

        let wave_layout = uniform_layout(&device, "Wave Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        let object_layout = uniform_layout(
            &device,
            "Object Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );

        let wave_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wave Uniform Buffer"),
            contents: bytemuck::cast_slice(&[WaveUniforms::new(scene.surface().params())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let wave_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wave Bind Group"),
            layout: &wave_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wave_buffer.as_entire_binding(),
            }],
        });

        // Shaders
        let skybox_shader = shader_module(&device, "Skybox Shader", include_str!("shaders/skybox.wgsl"));
        let ocean_shader = shader_module(&device, "Ocean Shader", include_str!("shaders/ocean.wgsl"));
        let mesh_shader = shader_module(&device, "Mesh Shader", include_str!("shaders/mesh.wgsl"));

        // Ocean and mesh vertices share the same layout (position + normal)
        let vertex_attributes = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ];
        let ocean_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OceanVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attributes,
        };
        let mesh_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attributes,
        };

        let skybox_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "Skybox Pipeline",
                shader: &skybox_shader,
                bind_group_layouts: &[&frame_layout],
                vertex_layout: None,
                format: config.format,
                blend: None,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );

        // Double-sided: underwater tracking puts the camera below the surface
        let ocean_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "Ocean Pipeline",
                shader: &ocean_shader,
                bind_group_layouts: &[&frame_layout, &wave_layout],
                vertex_layout: Some(ocean_vertex_layout),
                format: config.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let mesh_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "Mesh Pipeline",
                shader: &mesh_shader,
                bind_group_layouts: &[&frame_layout, &object_layout],
                vertex_layout: Some(mesh_vertex_layout),
                format: config.format,
                blend: None,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let ocean = scene.ocean();
        let ocean_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Vertex Buffer"),
            contents: bytemuck::cast_slice(&ocean.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let ocean_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Index Buffer"),
            contents: bytemuck::cast_slice(&ocean.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let plane = scene.ocean_plane();
        let floor_mesh = MeshData::plane(plane.floor_size_m, plane.floor_depth_m);
        let floor = GpuMesh::new(&device, &object_layout, &floor_mesh, (false, 0), "Ocean Floor");
        queue.write_buffer(
            &floor.uniform_buffer,
            0,
            bytemuck::cast_slice(&[ObjectUniforms::new(Mat4::IDENTITY, plane.floor_color)]),
        );

        log::info!(
            "Renderer ready: {:?}, {}x{}, environment {}",
            surface_format,
            config.width,
            config.height,
            if environment_available { "loaded" } else { "missing" }
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_config,
            depth_texture,
            depth_view,
            skybox_pipeline,
            ocean_pipeline,
            mesh_pipeline,
            frame_buffer,
            frame_bind_group,
            env_texture,
            environment_available,
            wave_buffer,
            wave_bind_group,
            ocean_vertex_buffer,
            ocean_index_buffer,
            ocean_index_count: ocean.indices.len() as u32,
            object_layout,
            floor,
            vessels: Vec::new(),
            released: false,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface and depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.released {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.render_config.window_width = width;
        self.render_config.window_height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture.destroy();
        let (texture, view) = create_depth_texture(&self.device, width, height);
        self.depth_texture = texture;
        self.depth_view = view;
    }

    /// Reconfigure with the current size, after the surface was lost
    pub fn reconfigure(&mut self) {
        let (width, height) = self.size();
        self.resize(width, height);
    }

    /// Upload vessel geometry that changed since the last frame (placeholder to model)
    fn sync_vessels(&mut self, scene: &SceneComposer) {
        let instances = scene.vessels();
        self.vessels.truncate(instances.len());
        for (index, instance) in instances.iter().enumerate() {
            let geometry = instance.slot.geometry();
            let key = (geometry.is_placeholder(), geometry.mesh().vertices.len());
            if self.vessels.get(index).map(|gpu| gpu.key) == Some(key) {
                continue;
            }
            let gpu = GpuMesh::new(
                &self.device,
                &self.object_layout,
                geometry.mesh(),
                key,
                &instance.vessel.name,
            );
            if index < self.vessels.len() {
                self.vessels[index].destroy();
                self.vessels[index] = gpu;
            } else {
                self.vessels.push(gpu);
            }
        }
    }

    fn frame_uniforms(&self, scene: &SceneComposer, time_s: f32) -> FrameUniforms {
        let view_proj = scene
            .camera()
            .view_proj(self.render_config.aspect_ratio(), &self.render_config);
        let camera_pos = scene.camera().position();
        let (sun_dir, sun_intensity) = scene.sun();

        let mut lights = [GpuLight::default(); MAX_LIGHTS];
        let scene_lights = scene.lights();
        let count = scene_lights.len().min(MAX_LIGHTS);
        for (slot, light) in lights.iter_mut().zip(&scene_lights) {
            *slot = GpuLight {
                position_range: light.position.extend(light.range_m).to_array(),
                color_intensity: [light.color[0], light.color[1], light.color[2], light.intensity],
            };
        }

        FrameUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            sun: sun_dir.extend(sun_intensity).to_array(),
            params: [
                scene.ambient_intensity(),
                count as f32,
                if self.environment_available { 1.0 } else { 0.0 },
                time_s,
            ],
            lights,
        }
    }

    /// Draw one frame of `scene`
    pub fn render(&mut self, scene: &SceneComposer, time_s: f32) -> Result<(), wgpu::SurfaceError> {
        if self.released {
            return Ok(());
        }
        self.sync_vessels(scene);

        let frame = self.frame_uniforms(scene, time_s);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));
        if scene.draw_surface() {
            self.queue.write_buffer(
                &self.ocean_vertex_buffer,
                0,
                bytemuck::cast_slice(&scene.ocean().vertices),
            );
        }

        for (gpu, instance) in self.vessels.iter().zip(scene.vessels()) {
            let color = hull_color(&instance.slot.geometry(), instance.vessel.class);
            let uniforms = ObjectUniforms::new(instance.transform(), color);
            self.queue
                .write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b] = self.render_config.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            // Sky first, only when a cube map was loaded
            if self.environment_available {
                render_pass.set_pipeline(&self.skybox_pipeline);
                render_pass.draw(0..3, 0..1); // Fullscreen triangle
            }

            // Opaque meshes: floor, then vessels
            render_pass.set_pipeline(&self.mesh_pipeline);
            for gpu in std::iter::once(&self.floor).chain(&self.vessels) {
                render_pass.set_bind_group(1, &gpu.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }

            // Translucent water last
            if scene.draw_surface() {
                render_pass.set_pipeline(&self.ocean_pipeline);
                render_pass.set_bind_group(1, &self.wave_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.ocean_vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.ocean_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.ocean_index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Destroy GPU buffers and textures; idempotent, later renders are no-ops
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for gpu in self.vessels.drain(..) {
            gpu.destroy();
        }
        self.floor.destroy();
        self.ocean_vertex_buffer.destroy();
        self.ocean_index_buffer.destroy();
        self.wave_buffer.destroy();
        self.frame_buffer.destroy();
        self.env_texture.destroy();
        self.depth_texture.destroy();
        self.environment_available = false;
        self.released = true;
        log::info!("GPU resources released");
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex_layout: Option<wgpu::VertexBufferLayout<'a>>,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc.vertex_layout.into_iter().collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Compile a shader with the shared frame bindings prepended
fn shader_module(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(format!("{FRAME_WGSL}\n{body}").into()),
    })
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
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
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Upload the six cube faces, or a 1x1 black cube when no map is loaded
fn create_env_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    environment: Option<&EnvironmentMap>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let size = environment.map_or(1, EnvironmentMap::size);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Cube"),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    for layer in 0..6u32 {
        let data: &[u8] = match environment {
            Some(env) => env.faces()[layer as usize].as_raw(),
            None => &BLACK,
        };
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Environment Cube View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        array_layer_count: Some(6),
        ..Default::default()
    });
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<WaveUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
    }

    #[test]
    fn test_wave_uniforms_pack_params() {
        let params = WaveParams::default();
        let u = WaveUniforms::new(&params);
        assert_eq!(u.bands, [0.12, 0.08, -0.015, 0.2]);
        assert_eq!(u.fresnel[2], params.opacity);
        assert_eq!(u.trough_color[3], 1.0);
    }

    #[test]
    fn test_normal_matrix_keeps_uniform_scale_direction() {
        let model = Mat4::from_scale(Vec3::splat(0.004));
        let u = ObjectUniforms::new(model, [1.0; 3]);
        let n = Mat4::from_cols_array_2d(&u.normal_matrix).transform_vector3(Vec3::Y);
        assert!(n.normalize().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_placeholder_colour_follows_class() {
        let mesh = MeshData::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Z]]);
        let placeholder = Geometry::Placeholder(&mesh);
        assert_eq!(
            hull_color(&placeholder, VesselClass::Surface),
            hex_rgb(0x60a5fa)
        );
        assert_eq!(
            hull_color(&placeholder, VesselClass::Underwater),
            hex_rgb(0x3b82f6)
        );
        let model = Geometry::Model(&mesh);
        assert_eq!(
            hull_color(&model, VesselClass::Surface),
            hull_color(&model, VesselClass::Underwater)
        );
    }
}
