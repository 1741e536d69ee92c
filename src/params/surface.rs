//! Ocean surface configuration: grid layout, texture tiling and wave list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::WaveParameter;
use crate::error::OceanError;

/// Everything needed to build a wave surface.
///
/// Loaded from RON or taken from `Default`, which reproduces the demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Vertex rows (>= 2; multiple of 16 for the compute backend)
    pub rows: u32,

    /// Vertex columns (>= 2; multiple of 16 for the compute backend)
    pub cols: u32,

    /// How many times the diffuse texture repeats along U
    pub texture_repeat_u: f32,

    /// How many times the diffuse texture repeats along V
    pub texture_repeat_v: f32,

    /// Distance between neighbouring vertices (scene units)
    pub spatial_step: f32,

    /// Number of active waves (<= 20, <= waves.len())
    pub num_waves: usize,

    /// Global steepness budget shared across waves (0-1 keeps crests from looping)
    pub total_steepness: f32,

    /// Wave parameters; only the first `num_waves` are used
    pub waves: Vec<WaveParameter>,

    /// Diffuse texture; a procedural ripple tile is generated when absent
    pub texture_file: Option<PathBuf>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            rows: 256,
            cols: 256,
            texture_repeat_u: 5.0,
            texture_repeat_v: 5.0,
            spatial_step: 0.625, // 256 vertices span ~160 units
            num_waves: 2,
            total_steepness: 0.25,
            waves: vec![
                WaveParameter::new(45.0, 1.0, 20.0, 0.01),
                WaveParameter::new(0.0, 1.0, 10.0, 0.01),
            ],
            texture_file: None,
        }
    }
}

impl SurfaceConfig {
    /// Load a configuration from a RON file. Missing fields fall back to `Default`.
    pub fn load(path: &Path) -> Result<Self, OceanError> {
        let text = std::fs::read_to_string(path).map_err(|source| OceanError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Parse a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, OceanError> {
        Ok(ron::from_str(text)?)
    }

    /// Texture coordinate scale applied in the shading pipeline.
    pub fn texture_repeat(&self) -> [f32; 2] {
        [self.texture_repeat_u, self.texture_repeat_v]
    }
}
