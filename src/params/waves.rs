//! Raw per-wave input parameters.

use serde::{Deserialize, Serialize};

/// One Gerstner wave as supplied by configuration.
///
/// Values are raw: `direction` is in degrees and nothing is derived yet.
/// `WaveParameterSet` converts and derives on ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParameter {
    /// Travel direction in the XZ plane (degrees, 0° = +Z, 90° = +X)
    pub direction: f32,

    /// Crest height above rest (scene units)
    pub amplitude: f32,

    /// Crest-to-crest distance (scene units, must be > 0)
    pub wavelength: f32,

    /// Phase speed multiplier (dimensionless, scales the deep-water dispersion speed)
    pub speed: f32,
}

impl WaveParameter {
    pub fn new(direction: f32, amplitude: f32, wavelength: f32, speed: f32) -> Self {
        Self {
            direction,
            amplitude,
            wavelength,
            speed,
        }
    }
}
