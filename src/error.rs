//! Error types for surface configuration and GPU resource management.

use std::path::PathBuf;

use thiserror::Error;

use crate::ocean::Backend;

/// Invalid surface or wave configuration. Always fatal at initialization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cannot produce more than {max} Gerstner waves (requested {requested})")]
    TooManyWaves { requested: usize, max: usize },

    #[error("{requested} waves requested but only {provided} parameters supplied")]
    MissingWaves { requested: usize, provided: usize },

    #[error("wave {index}: wavelength must be positive and finite (got {wavelength})")]
    InvalidWavelength { index: usize, wavelength: f32 },

    #[error("{field} must be finite and in range (got {value})")]
    InvalidValue { field: &'static str, value: f32 },

    #[error("grid must be at least 2x2 (got {rows}x{cols})")]
    GridTooSmall { rows: u32, cols: u32 },

    #[error("grid {rows}x{cols} is not a multiple of the {tile}x{tile} compute tile")]
    GridNotTileAligned { rows: u32, cols: u32, tile: u32 },

    #[error("wave index {index} out of range (next free slot is {len})")]
    WaveIndexOutOfRange { index: usize, len: usize },
}

/// Top-level error for the ocean library.
#[derive(Debug, Error)]
pub enum OceanError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("{0} backend is not initialized")]
    NotInitialized(Backend),

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

impl OceanError {
    /// True for errors caused by caller-supplied configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, OceanError::Configuration(_))
    }
}
