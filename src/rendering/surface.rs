//! Ocean surface renderer: owns the wave parameters, the grid and the active
//! evaluator, and draws the evaluator's output with the shared shading pipeline.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};
use wgpu::util::DeviceExt;

use super::texture::{DiffuseTexture, TexturePixels};
use crate::error::{ConfigError, OceanError};
use crate::gpu::GpuContext;
use crate::ocean::{
    check_tile_alignment, switch_evaluator, Backend, CpuEvaluator, GridMesh, ParallelEvaluator,
    Vertex, WaveEvaluator, WaveParameterSet, TILE_SIZE,
};
use crate::params::{default_lights, DirectionalLight, Material, SurfaceConfig, WaveParameter, NUM_LIGHTS};

/// Uniform block for ocean.wgsl (matrices column-major)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub world_inv_transpose: [[f32; 4]; 4],
    pub tex_transform: [[f32; 4]; 4],
    pub eye_position: [f32; 4],
    pub material: Material,
    pub lights: [DirectionalLight; NUM_LIGHTS],
}

/// Camera state the surface needs for one draw.
#[derive(Debug, Clone, Copy)]
pub struct ViewState {
    pub view_proj: Mat4,
    pub eye: Vec3,
}

/// Formats of the targets the surface pipeline renders into.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargets {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

/// Local-to-world transform of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Texture-coordinate transform: scale by the repeat count, then scroll by `offset`.
pub fn tex_transform(repeat: [f32; 2], offset: Vec2) -> Mat4 {
    Mat4::from_translation(offset.extend(0.0))
        * Mat4::from_scale(Vec3::new(repeat[0], repeat[1], 1.0))
}

/// Buffers and pipelines shared by both backends.
struct DrawResources {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    fill_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    _texture: DiffuseTexture,
}

/// Orchestrates wave evaluation and drawing of one ocean surface.
pub struct SurfaceRenderer {
    gpu: Arc<GpuContext>,
    config: SurfaceConfig,
    waves: WaveParameterSet,
    grid: GridMesh,
    evaluator: Box<dyn WaveEvaluator>,
    transform: Transform,
    material: Material,
    lights: [DirectionalLight; NUM_LIGHTS],
    wireframe: bool,
    resources: DrawResources,
}

impl SurfaceRenderer {
    /// Validate `config`, build the grid and parameter set, allocate the
    /// shared draw resources and initialize `backend`.
    ///
    /// Nothing is kept on failure.
    pub fn initialize(
        gpu: Arc<GpuContext>,
        config: SurfaceConfig,
        backend: Backend,
        targets: RenderTargets,
    ) -> Result<Self, OceanError> {
        let waves =
            WaveParameterSet::configure(config.num_waves, config.total_steepness, &config.waves)?;
        let grid = GridMesh::build(config.rows, config.cols, config.spatial_step)?;
        for value in [config.texture_repeat_u, config.texture_repeat_v] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: "texture_repeat",
                    value,
                }
                .into());
            }
        }
        if backend == Backend::Gpu {
            check_tile_alignment(grid.rows(), grid.cols(), TILE_SIZE)?;
        }

        let pixels = match &config.texture_file {
            Some(path) => TexturePixels::load(path)?,
            None => TexturePixels::procedural(),
        };

        let resources = gpu.scoped_allocation("surface draw resources", |device| {
            let texture = DiffuseTexture::create(device, &gpu.queue, &pixels)?;
            Ok(Self::create_draw_resources(device, &grid, texture, targets))
        })?;

        let mut evaluator = Self::make_evaluator(&gpu, backend);
        evaluator.initialize(&grid)?;

        log::info!(
            "Surface initialized: {}x{} grid, {} waves, {} backend",
            grid.rows(),
            grid.cols(),
            waves.num_waves(),
            backend
        );

        Ok(Self {
            gpu,
            config,
            waves,
            grid,
            evaluator,
            transform: Transform::default(),
            material: Material::default(),
            lights: default_lights(),
            wireframe: false,
            resources,
        })
    }

    fn make_evaluator(gpu: &Arc<GpuContext>, backend: Backend) -> Box<dyn WaveEvaluator> {
        match backend {
            Backend::Cpu => Box::new(CpuEvaluator::new()),
            Backend::Gpu => Box::new(ParallelEvaluator::new(Arc::clone(gpu))),
        }
    }

    fn create_draw_resources(
        device: &wgpu::Device,
        grid: &GridMesh,
        texture: DiffuseTexture,
        targets: RenderTargets,
    ) -> DrawResources {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ocean Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("ocean.wgsl").into()),
        });

        // Create buffers
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Vertex Buffer"),
            contents: bytemuck::cast_slice(&grid.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Index Buffer"),
            contents: bytemuck::cast_slice(&grid.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Uniform Buffer"),
            size: std::mem::size_of::<SurfaceUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ocean Bind Group Layout"),
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
                        view_dimension: wgpu::TextureViewDimension::D2,
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ocean Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |label, polygon_mode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
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
                            wgpu::VertexAttribute {
                                offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32x2,
                            },
                        ],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: targets.color_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: targets.depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let fill_pipeline = create_pipeline("Ocean Fill Pipeline", wgpu::PolygonMode::Fill);
        let wireframe_pipeline = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| create_pipeline("Ocean Wireframe Pipeline", wgpu::PolygonMode::Line));

        DrawResources {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            fill_pipeline,
            wireframe_pipeline,
            _texture: texture,
        }
    }

    /// Cold switch to `backend`.
    ///
    /// The old evaluator releases its resources before the new one is
    /// initialized from the current parameters and grid; the simulation
    /// restarts from the rest grid. If the new backend fails to initialize,
    /// the previous backend is brought back and the switch error is returned.
    /// Should that restore fail too, `update` reports
    /// `OceanError::NotInitialized` until a later switch succeeds.
    pub fn set_active_backend(&mut self, backend: Backend) -> Result<(), OceanError> {
        if self.evaluator.backend() == backend && self.evaluator.is_initialized() {
            return Ok(());
        }
        let next = Self::make_evaluator(&self.gpu, backend);
        switch_evaluator(&mut self.evaluator, next, &self.grid)
    }

    /// Evaluate the waves at `time` with the active backend.
    ///
    /// Fails with `OceanError::NotInitialized` when no backend is usable.
    pub fn update(&mut self, time: f32) -> Result<(), OceanError> {
        self.evaluator.update(&self.waves, time)
    }

    /// Upload the current vertex array and uniforms, then record the indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, view: &ViewState) {
        let vertices = self.evaluator.vertices();
        if vertices.is_empty() {
            return;
        }
        let queue = &self.gpu.queue;
        queue.write_buffer(
            &self.resources.vertex_buffer,
            0,
            bytemuck::cast_slice(vertices),
        );

        let uniforms = self.uniforms(view);
        queue.write_buffer(
            &self.resources.uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );

        let pipeline = match (&self.resources.wireframe_pipeline, self.wireframe) {
            (Some(wireframe), true) => wireframe,
            _ => &self.resources.fill_pipeline,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.resources.bind_group, &[]);
        pass.set_vertex_buffer(0, self.resources.vertex_buffer.slice(..));
        pass.set_index_buffer(
            self.resources.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(0..self.grid.index_count(), 0, 0..1);
    }

    /// Uniform block for the next draw.
    pub fn uniforms(&self, view: &ViewState) -> SurfaceUniforms {
        let world = self.transform.matrix();
        SurfaceUniforms {
            view_proj: view.view_proj.to_cols_array_2d(),
            world: world.to_cols_array_2d(),
            world_inv_transpose: world.inverse().transpose().to_cols_array_2d(),
            tex_transform: tex_transform(self.config.texture_repeat(), self.tex_offset())
                .to_cols_array_2d(),
            eye_position: view.eye.extend(1.0).to_array(),
            material: self.material,
            lights: self.lights,
        }
    }

    /// Toggle line rendering. Returns whether wireframe is now active.
    pub fn set_wireframe(&mut self, enabled: bool) -> bool {
        if enabled && self.resources.wireframe_pipeline.is_none() {
            log::warn!("Wireframe requested but POLYGON_MODE_LINE is unavailable");
            self.wireframe = false;
        } else {
            self.wireframe = enabled;
        }
        self.wireframe
    }

    /// Replace or append one wave; takes effect on the next update.
    pub fn set_wave(&mut self, index: usize, parameter: WaveParameter) -> Result<(), OceanError> {
        self.waves.set_parameter(index, parameter)?;
        if index < self.config.waves.len() {
            self.config.waves[index] = parameter;
        } else {
            self.config.waves.push(parameter);
        }
        self.config.num_waves = self.waves.num_waves();
        Ok(())
    }

    /// Replace the whole wave set. The current set is kept if validation fails.
    pub fn reconfigure_waves(
        &mut self,
        num_waves: usize,
        total_steepness: f32,
        waves: &[WaveParameter],
    ) -> Result<(), OceanError> {
        self.waves = WaveParameterSet::configure(num_waves, total_steepness, waves)?;
        self.config.num_waves = num_waves;
        self.config.total_steepness = total_steepness;
        self.config.waves = waves.to_vec();
        Ok(())
    }

    pub fn set_total_steepness(&mut self, total_steepness: f32) -> Result<(), OceanError> {
        self.waves.set_total_steepness(total_steepness)?;
        self.config.total_steepness = total_steepness;
        Ok(())
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn set_lights(&mut self, lights: [DirectionalLight; NUM_LIGHTS]) {
        self.lights = lights;
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn active_backend(&self) -> Backend {
        self.evaluator.backend()
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn rows(&self) -> u32 {
        self.grid.rows()
    }

    pub fn cols(&self) -> u32 {
        self.grid.cols()
    }

    pub fn grid(&self) -> &GridMesh {
        &self.grid
    }

    pub fn waves(&self) -> &WaveParameterSet {
        &self.waves
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.evaluator.vertices()
    }

    pub fn tex_offset(&self) -> Vec2 {
        self.evaluator.tex_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_size() {
        // 4 matrices + eye + material + 4 lights, all 16-byte multiples
        assert_eq!(
            std::mem::size_of::<SurfaceUniforms>(),
            4 * 64 + 16 + 64 + NUM_LIGHTS * 64
        );
    }

    #[test]
    fn test_tex_transform_scales_then_scrolls() {
        let m = tex_transform([5.0, 2.0], Vec2::new(0.25, -1.0));
        let uv = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((uv.x - 5.25).abs() < 1e-6);
        assert!((uv.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_transform_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }
}
