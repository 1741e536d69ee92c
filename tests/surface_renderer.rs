//! SurfaceRenderer orchestration: initialization, cold backend switches and
//! drawing into an offscreen target.
//!
//! Need a GPU adapter; print SKIP and pass when none is available.

use std::sync::Arc;

use gerstner_ocean::error::{ConfigError, OceanError};
use gerstner_ocean::gpu::GpuContext;
use gerstner_ocean::ocean::{Backend, MAX_WAVES};
use gerstner_ocean::params::{SurfaceConfig, WaveParameter};
use gerstner_ocean::rendering::{create_depth_view, RenderTargets, SurfaceRenderer, ViewState};
use glam::{Mat4, Vec3};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_test_gpu() -> Option<Arc<GpuContext>> {
    match GpuContext::headless() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            println!("SKIP: No GPU adapter available ({})", e);
            None
        }
    }
}

fn targets() -> RenderTargets {
    RenderTargets {
        color_format: COLOR_FORMAT,
        depth_format: DEPTH_FORMAT,
    }
}

fn small_config() -> SurfaceConfig {
    SurfaceConfig {
        rows: 32,
        cols: 32,
        ..SurfaceConfig::default()
    }
}

fn view_state() -> ViewState {
    let eye = Vec3::new(0.0, 14.0, -14.0);
    let view = Mat4::look_at_rh(eye, Vec3::new(0.0, 2.5, 0.0), Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 1.0, 1000.0);
    ViewState {
        view_proj: proj * view,
        eye,
    }
}

/// Draw one frame into an offscreen target and return the center pixel
fn render_offscreen(gpu: &GpuContext, ocean: &SurfaceRenderer) -> [u8; 4] {
    const SIZE: u32 = 64;
    let color = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Color"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = create_depth_view(&gpu.device, SIZE, SIZE);

    let bytes_per_row = SIZE * 4; // 256, already aligned
    let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Offscreen Readback"),
        size: (bytes_per_row * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        ocean.draw(&mut pass, &view_state());
    }
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: &color,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &readback,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    gpu.device.poll(wgpu::Maintain::Wait);
    let data = slice.get_mapped_range();
    let center = ((SIZE / 2) * bytes_per_row + (SIZE / 2) * 4) as usize;
    let pixel = [data[center], data[center + 1], data[center + 2], data[center + 3]];
    drop(data);
    readback.unmap();
    pixel
}

#[test]
fn test_initialize_and_draw_both_backends() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };

    for backend in [Backend::Cpu, Backend::Gpu] {
        let mut ocean =
            SurfaceRenderer::initialize(Arc::clone(&gpu), small_config(), backend, targets())
                .unwrap();
        assert_eq!(ocean.active_backend(), backend);
        assert_eq!((ocean.rows(), ocean.cols()), (32, 32));

        ocean.update(1.5).unwrap();
        let pixel = render_offscreen(&gpu, &ocean);
        // The surface covers the center of the view and is not the clear color
        assert_ne!(&pixel[..3], &[0, 0, 0], "{} backend drew nothing", backend);
    }
}

#[test]
fn test_cold_backend_switch() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };
    let mut ocean =
        SurfaceRenderer::initialize(Arc::clone(&gpu), small_config(), Backend::Cpu, targets())
            .unwrap();
    ocean.update(0.5).unwrap();
    ocean.update(1.0).unwrap();
    let cpu_vertices = ocean.vertices().to_vec();
    assert_ne!(ocean.tex_offset(), glam::Vec2::ZERO);

    ocean.set_active_backend(Backend::Gpu).unwrap();
    assert_eq!(ocean.active_backend(), Backend::Gpu);
    // Fresh start: rest grid and no accumulated scroll
    assert_eq!(ocean.vertices(), ocean.grid().vertices.as_slice());
    assert_eq!(ocean.tex_offset(), glam::Vec2::ZERO);

    ocean.update(1.0).unwrap();
    for (a, b) in cpu_vertices.iter().zip(ocean.vertices()) {
        for i in 0..3 {
            assert!((a.position[i] - b.position[i]).abs() < 1e-3);
        }
    }

    // Switching to the active backend is a no-op
    ocean.set_active_backend(Backend::Gpu).unwrap();
    assert_eq!(ocean.active_backend(), Backend::Gpu);

    ocean.set_active_backend(Backend::Cpu).unwrap();
    assert_eq!(ocean.active_backend(), Backend::Cpu);
}

#[test]
fn test_failed_switch_keeps_previous_backend() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };
    let config = SurfaceConfig {
        rows: 20,
        cols: 24,
        ..SurfaceConfig::default()
    };
    let mut ocean =
        SurfaceRenderer::initialize(Arc::clone(&gpu), config, Backend::Cpu, targets()).unwrap();

    let err = ocean.set_active_backend(Backend::Gpu).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(ocean.active_backend(), Backend::Cpu);
    ocean.update(1.0).unwrap();
    assert_eq!(ocean.vertices().len(), 20 * 24);
}

#[test]
fn test_initialize_rejects_bad_configuration() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };

    let too_many = SurfaceConfig {
        num_waves: MAX_WAVES + 1,
        waves: vec![WaveParameter::new(0.0, 0.5, 10.0, 0.1); MAX_WAVES + 1],
        ..small_config()
    };
    let err = SurfaceRenderer::initialize(Arc::clone(&gpu), too_many, Backend::Cpu, targets())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        OceanError::Configuration(ConfigError::TooManyWaves { requested: 21, max: 20 })
    ));

    let unaligned = SurfaceConfig {
        rows: 17,
        cols: 32,
        ..SurfaceConfig::default()
    };
    let err = SurfaceRenderer::initialize(Arc::clone(&gpu), unaligned, Backend::Gpu, targets())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        OceanError::Configuration(ConfigError::GridNotTileAligned { .. })
    ));

    let zero_wavelength = SurfaceConfig {
        waves: vec![
            WaveParameter::new(0.0, 1.0, 0.0, 0.01),
            WaveParameter::new(0.0, 1.0, 10.0, 0.01),
        ],
        ..small_config()
    };
    let err = SurfaceRenderer::initialize(gpu, zero_wavelength, Backend::Cpu, targets())
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_parameter_changes_flow_into_next_update() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };
    let mut ocean =
        SurfaceRenderer::initialize(gpu, small_config(), Backend::Cpu, targets()).unwrap();

    ocean.update(2.0).unwrap();
    let before = ocean.vertices().to_vec();

    ocean
        .set_wave(2, WaveParameter::new(90.0, 0.5, 6.0, 0.3))
        .unwrap();
    assert_eq!(ocean.waves().num_waves(), 3);
    assert_eq!(ocean.config().num_waves, 3);
    ocean.update(2.0).unwrap();
    assert_ne!(ocean.vertices(), before.as_slice());

    assert!(ocean
        .set_wave(7, WaveParameter::new(0.0, 1.0, 10.0, 0.1))
        .is_err());

    ocean.reconfigure_waves(0, 0.25, &[]).unwrap();
    ocean.update(5.0).unwrap();
    assert_eq!(ocean.vertices(), ocean.grid().vertices.as_slice());

    // Failed reconfiguration keeps the current set
    assert!(ocean.reconfigure_waves(3, 0.25, &[]).is_err());
    assert_eq!(ocean.waves().num_waves(), 0);
}

#[test]
fn test_wireframe_toggle_respects_device_features() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };
    let line_supported = gpu
        .device
        .features()
        .contains(wgpu::Features::POLYGON_MODE_LINE);
    let mut ocean =
        SurfaceRenderer::initialize(Arc::clone(&gpu), small_config(), Backend::Cpu, targets())
            .unwrap();
    ocean.update(0.5).unwrap();

    assert_eq!(ocean.set_wireframe(true), line_supported);
    assert_eq!(ocean.is_wireframe(), line_supported);
    if line_supported {
        // Draws through the line pipeline
        render_offscreen(&gpu, &ocean);
    } else {
        println!("SKIP: adapter lacks POLYGON_MODE_LINE, wireframe pipeline not built");
    }

    assert!(!ocean.set_wireframe(false));
    assert!(!ocean.is_wireframe());
    let pixel = render_offscreen(&gpu, &ocean);
    assert_ne!(&pixel[..3], &[0, 0, 0]);
}

#[test]
fn test_oversized_texture_is_reported() {
    let Some(gpu) = create_test_gpu() else {
        return;
    };
    let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;
    let path = std::env::temp_dir().join(format!(
        "gerstner-ocean-wide-texture-{}.png",
        std::process::id()
    ));
    image::RgbaImage::new(too_wide, 1).save(&path).unwrap();

    let config = SurfaceConfig {
        texture_file: Some(path.clone()),
        ..small_config()
    };
    let result = SurfaceRenderer::initialize(Arc::clone(&gpu), config, Backend::Cpu, targets());
    let _ = std::fs::remove_file(&path);

    let err = result.err().unwrap();
    assert!(
        matches!(err, OceanError::ResourceAllocation(_)),
        "unexpected error: {}",
        err
    );

    // The device is still usable afterwards
    let mut ocean =
        SurfaceRenderer::initialize(gpu, small_config(), Backend::Cpu, targets()).unwrap();
    ocean.update(1.0).unwrap();
}
