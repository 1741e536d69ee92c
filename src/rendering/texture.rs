//! Diffuse texture for the ocean surface.
//!
//! Loading is split in two: `TexturePixels` decodes on the host, and
//! `DiffuseTexture::create` allocates on the device, so the device half can
//! run inside an allocation error scope.

use std::path::Path;

use crate::error::OceanError;

/// Edge length of the generated ripple tile.
const PROCEDURAL_SIZE: u32 = 128;

/// Decoded RGBA8 pixels waiting to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturePixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub label: &'static str,
}

impl TexturePixels {
    /// Decode any format the `image` crate understands.
    pub fn load(path: &Path) -> Result<Self, OceanError> {
        let image = image::open(path)
            .map_err(|source| OceanError::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        log::info!("Loaded texture {} ({}x{})", path.display(), width, height);
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
            label: "Diffuse Texture",
        })
    }

    /// Tileable blue ripple pattern used when no texture file is configured.
    pub fn procedural() -> Self {
        Self {
            width: PROCEDURAL_SIZE,
            height: PROCEDURAL_SIZE,
            rgba: procedural_ripples(PROCEDURAL_SIZE),
            label: "Procedural Ripple Texture",
        }
    }
}

/// Reject textures the device cannot hold.
pub fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> Result<(), OceanError> {
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        return Err(OceanError::ResourceAllocation(format!(
            "texture {}x{} exceeds the device limit of {} texels per side",
            width, height, max_dimension
        )));
    }
    Ok(())
}

/// Sampled RGBA texture with a repeating linear sampler.
pub struct DiffuseTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl DiffuseTexture {
    /// Allocate and upload `pixels`. Run inside `GpuContext::scoped_allocation`.
    pub fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &TexturePixels,
    ) -> Result<Self, OceanError> {
        let (width, height) = (pixels.width, pixels.height);
        check_texture_size(width, height, device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(pixels.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels.rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// RGBA8 pixels of a seamless ripple tile. Integer frequencies keep the edges matching.
fn procedural_ripples(size: u32) -> Vec<u8> {
    let deep = [0.05, 0.22, 0.40];
    let shallow = [0.30, 0.60, 0.75];
    let tau = std::f32::consts::TAU;

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let u = x as f32 / size as f32;
            let v = y as f32 / size as f32;
            let ripple = 0.5
                + 0.25 * (tau * (2.0 * u + 3.0 * v)).sin()
                + 0.15 * (tau * (5.0 * u - 4.0 * v)).sin()
                + 0.10 * (tau * (9.0 * v)).cos();
            let t = ripple.clamp(0.0, 1.0);

            for channel in 0..3 {
                let value = deep[channel] + (shallow[channel] - deep[channel]) * t;
                pixels.push((value * 255.0) as u8);
            }
            pixels.push(255);
        }
    }
    pixels
}
