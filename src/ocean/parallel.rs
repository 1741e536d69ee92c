//! Compute-shader wave evaluator.
//!
//! The rest grid lives in a read-only `Rgba32Float` texture, uploaded once.
//! Each update writes a small uniform block, dispatches one invocation per
//! vertex in `TILE_SIZE` x `TILE_SIZE` workgroups into two storage textures
//! (position, normal), copies both into staging buffers and blocks until
//! they are mapped. The result lands in the same `Vertex` layout the CPU
//! backend produces.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::evaluator::{Backend, TexScroll, WaveEvaluator};
use super::mesh::{GridMesh, Vertex};
use super::waves::{WaveParameterSet, GRAVITY, MAX_WAVES};
use crate::error::{ConfigError, OceanError};
use crate::gpu::GpuContext;

/// Workgroup edge length; grid rows and columns must be multiples of it.
pub const TILE_SIZE: u32 = 16;

/// Bytes per texel of an `Rgba32Float` texture.
const TEXEL_BYTES: u32 = 16;

/// Raw wave record. Must match `Wave` in gerstner_update.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
struct GpuWave {
    direction: f32,
    amplitude: f32,
    wavelength: f32,
    speed: f32,
}

/// Per-dispatch constants. Must match `WaveUniforms` in gerstner_update.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct WaveUniforms {
    time: f32,
    num_waves: u32,
    total_steepness: f32,
    _padding: f32,
    waves: [GpuWave; MAX_WAVES],
}

impl WaveUniforms {
    fn new(waves: &WaveParameterSet, time: f32) -> Self {
        let mut records = [GpuWave::default(); MAX_WAVES];
        for (record, wave) in records.iter_mut().zip(waves.waves()) {
            *record = GpuWave {
                direction: wave.direction,
                amplitude: wave.amplitude,
                wavelength: wave.wavelength,
                speed: wave.speed,
            };
        }

        Self {
            time,
            num_waves: waves.num_waves() as u32,
            total_steepness: waves.total_steepness(),
            _padding: 0.0,
            waves: records,
        }
    }
}

/// Fail unless both grid dimensions are whole multiples of `tile`.
pub fn check_tile_alignment(rows: u32, cols: u32, tile: u32) -> Result<(), ConfigError> {
    if tile == 0 || rows % tile != 0 || cols % tile != 0 {
        return Err(ConfigError::GridNotTileAligned { rows, cols, tile });
    }
    Ok(())
}

/// Succeed only if every staging buffer mapped.
///
/// On failure the buffers that did map are handed to `unmap`, so none of
/// them is still mapped when the next update copies into it.
fn settle_mappings<const N: usize>(
    mapped: [Result<(), OceanError>; N],
    mut unmap: impl FnMut(usize),
) -> Result<(), OceanError> {
    if mapped.iter().all(Result::is_ok) {
        return Ok(());
    }
    let mut first_error = None;
    for (index, result) in mapped.into_iter().enumerate() {
        match result {
            Ok(()) => unmap(index),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Device-side state, alive only between `initialize` and `release`.
struct ComputeResources {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    // Held so the bind group's views stay valid
    _rest_texture: wgpu::Texture,
    position_texture: wgpu::Texture,
    normal_texture: wgpu::Texture,
    position_staging: wgpu::Buffer,
    normal_staging: wgpu::Buffer,
}

/// Evaluates the wave sum with one compute invocation per vertex.
pub struct ParallelEvaluator {
    gpu: Arc<GpuContext>,
    resources: Option<ComputeResources>,
    vertices: Vec<Vertex>,
    rows: u32,
    cols: u32,
    scroll: TexScroll,
}

impl ParallelEvaluator {
    pub fn new(gpu: Arc<GpuContext>) -> Self {
        Self {
            gpu,
            resources: None,
            vertices: Vec::new(),
            rows: 0,
            cols: 0,
            scroll: TexScroll::default(),
        }
    }

    fn create_resources(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: &GridMesh,
    ) -> Result<ComputeResources, OceanError> {
        let (rows, cols) = (grid.rows(), grid.cols());
        let extent = wgpu::Extent3d {
            width: cols,
            height: rows,
            depth_or_array_layers: 1,
        };

        // Compose shader source with host constants
        let constants_preamble = format!(
            "const TILE_SIZE: u32 = {}u;\nconst MAX_WAVES: u32 = {}u;\nconst GRAVITY: f32 = {:?};\n",
            TILE_SIZE, MAX_WAVES, GRAVITY,
        );
        let shader_source = format!(
            "{constants_preamble}\n{}",
            include_str!("gerstner_update.wgsl")
        );
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gerstner Update Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        // Rest positions: xyz = undisplaced position, w = 1
        let rest_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Rest Position Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let rest_texels: Vec<[f32; 4]> = grid
            .rest_positions()
            .iter()
            .map(|p| [p.x, 0.0, p.y, 1.0])
            .collect();
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &rest_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&rest_texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(cols * TEXEL_BYTES),
                rows_per_image: Some(rows),
            },
            extent,
        );

        let solution_texture = |label| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba32Float,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        };
        let position_texture = solution_texture("Position Solution Texture");
        let normal_texture = solution_texture("Normal Solution Texture");

        // cols is a multiple of 16, so rows are already 256-byte aligned for the copy
        let staging_size = (rows * cols * TEXEL_BYTES) as u64;
        let staging_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: staging_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let position_staging = staging_buffer("Position Staging Buffer");
        let normal_staging = staging_buffer("Normal Staging Buffer");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Wave Uniform Buffer"),
            size: std::mem::size_of::<WaveUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: wgpu::TextureFormat::Rgba32Float,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gerstner Update Bind Group Layout"),
            entries: &[
                // binding 0: wave uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // binding 1: rest positions (read-only)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // binding 2, 3: position and normal outputs
                storage_entry(2),
                storage_entry(3),
            ],
        });

        let rest_view = rest_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let position_view = position_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let normal_view = normal_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gerstner Update Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&rest_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&position_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&normal_view),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gerstner Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Gerstner Update Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(ComputeResources {
            pipeline,
            bind_group,
            uniform_buffer,
            _rest_texture: rest_texture,
            position_texture,
            normal_texture,
            position_staging,
            normal_staging,
        })
    }

    /// Block until both staging buffers are mapped, then unpack into `vertices`.
    fn read_back(
        gpu: &GpuContext,
        resources: &ComputeResources,
        vertices: &mut [Vertex],
    ) -> Result<(), OceanError> {
        let position_slice = resources.position_staging.slice(..);
        let normal_slice = resources.normal_staging.slice(..);

        let (position_tx, position_rx) = futures::channel::oneshot::channel();
        position_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = position_tx.send(result);
        });
        let (normal_tx, normal_rx) = futures::channel::oneshot::channel();
        normal_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = normal_tx.send(result);
        });

        gpu.device.poll(wgpu::Maintain::Wait);

        let staging = [&resources.position_staging, &resources.normal_staging];
        let mapped = [position_rx, normal_rx].map(|receiver| {
            pollster::block_on(receiver)
                .map_err(|_| OceanError::Readback("map callback dropped".to_string()))?
                .map_err(|e| OceanError::Readback(e.to_string()))
        });
        settle_mappings(mapped, |index| staging[index].unmap())?;

        {
            let position_data = position_slice.get_mapped_range();
            let normal_data = normal_slice.get_mapped_range();
            let positions: &[[f32; 4]] = bytemuck::cast_slice(&position_data);
            let normals: &[[f32; 4]] = bytemuck::cast_slice(&normal_data);

            for ((vertex, p), n) in vertices.iter_mut().zip(positions).zip(normals) {
                vertex.position = [p[0], p[1], p[2]];
                vertex.normal = [n[0], n[1], n[2]];
            }
        }

        resources.position_staging.unmap();
        resources.normal_staging.unmap();
        Ok(())
    }
}

impl WaveEvaluator for ParallelEvaluator {
    fn backend(&self) -> Backend {
        Backend::Gpu
    }

    fn initialize(&mut self, grid: &GridMesh) -> Result<(), OceanError> {
        self.release();
        check_tile_alignment(grid.rows(), grid.cols(), TILE_SIZE)?;

        let gpu = Arc::clone(&self.gpu);
        let resources = gpu.scoped_allocation("compute evaluator", |device| {
            Self::create_resources(device, &gpu.queue, grid)
        })?;

        self.resources = Some(resources);
        self.vertices = grid.vertices.clone();
        self.rows = grid.rows();
        self.cols = grid.cols();

        log::info!(
            "GPU evaluator: {}x{} grid, {}x{} workgroups, {} KB readback per frame",
            self.rows,
            self.cols,
            self.cols / TILE_SIZE,
            self.rows / TILE_SIZE,
            2 * self.rows * self.cols * TEXEL_BYTES / 1024
        );
        Ok(())
    }

    fn update(&mut self, waves: &WaveParameterSet, time: f32) -> Result<(), OceanError> {
        let Some(resources) = self.resources.as_ref() else {
            return Err(OceanError::NotInitialized(Backend::Gpu));
        };

        let uniforms = WaveUniforms::new(waves, time);
        self.gpu
            .queue
            .write_buffer(&resources.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Gerstner Update Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Gerstner Update Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&resources.pipeline);
            compute_pass.set_bind_group(0, &resources.bind_group, &[]);
            compute_pass.dispatch_workgroups(self.cols / TILE_SIZE, self.rows / TILE_SIZE, 1);
        }

        let extent = wgpu::Extent3d {
            width: self.cols,
            height: self.rows,
            depth_or_array_layers: 1,
        };
        for (texture, staging) in [
            (&resources.position_texture, &resources.position_staging),
            (&resources.normal_texture, &resources.normal_staging),
        ] {
            encoder.copy_texture_to_buffer(
                wgpu::ImageCopyTexture {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::ImageCopyBuffer {
                    buffer: staging,
                    layout: wgpu::ImageDataLayout {
                        offset: 0,
                        bytes_per_row: Some(self.cols * TEXEL_BYTES),
                        rows_per_image: Some(self.rows),
                    },
                },
                extent,
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Self::read_back(&self.gpu, resources, &mut self.vertices)?;

        self.scroll.advance(waves);
        Ok(())
    }

    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn tex_offset(&self) -> Vec2 {
        self.scroll.offset()
    }

    fn release(&mut self) {
        if self.resources.take().is_some() {
            log::debug!("GPU evaluator: released {}x{} grid resources", self.rows, self.cols);
        }
        self.vertices = Vec::new();
        self.rows = 0;
        self.cols = 0;
        self.scroll.reset();
    }

    fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}
