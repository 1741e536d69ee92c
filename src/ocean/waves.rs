//! Wave parameter set: validated per-wave constants and the Gerstner summation.

use glam::{Vec2, Vec3};

use crate::error::ConfigError;
use crate::params::WaveParameter;

/// Maximum number of simultaneously active waves (also the GPU uniform array length).
pub const MAX_WAVES: usize = 20;

/// Gravitational acceleration used by the deep-water dispersion relation.
pub const GRAVITY: f32 = 9.8;

/// One wave with its constants derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedWave {
    /// Travel direction (radians, 0 = +Z)
    pub direction: f32,
    pub amplitude: f32,
    pub wavelength: f32,
    pub speed: f32,
    /// ω = 2π / wavelength
    pub angular_frequency: f32,
    /// speed · sqrt(g·ω)
    pub phase_speed: f32,
    /// total_steepness / (ω · amplitude · num_waves), 0 for flat waves
    pub steepness_share: f32,
}

impl DerivedWave {
    fn derive(parameter: &WaveParameter, total_steepness: f32, num_waves: usize) -> Self {
        let angular_frequency = std::f32::consts::TAU / parameter.wavelength;
        let phase_speed = parameter.speed * (GRAVITY * angular_frequency).sqrt();
        let steepness_share = if parameter.amplitude == 0.0 {
            0.0
        } else {
            total_steepness / (angular_frequency * parameter.amplitude * num_waves as f32)
        };

        Self {
            direction: parameter.direction.to_radians(),
            amplitude: parameter.amplitude,
            wavelength: parameter.wavelength,
            speed: parameter.speed,
            angular_frequency,
            phase_speed,
            steepness_share,
        }
    }

    /// Horizontal unit vector of travel in the XZ plane, stored as (x, z).
    pub fn direction_xz(&self) -> Vec2 {
        Vec2::new(self.direction.sin(), self.direction.cos()).normalize()
    }
}

/// Displaced position and normal for one rest point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSample {
    pub position: Vec3,
    pub normal: Vec3,
}

/// The active set of Gerstner waves.
///
/// Built once from configuration and mutated in place when a wave or the
/// steepness budget changes. Never touches grid or GPU state.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveParameterSet {
    total_steepness: f32,
    parameters: Vec<WaveParameter>,
    waves: Vec<DerivedWave>,
}

impl WaveParameterSet {
    /// Validate and derive the first `num_waves` entries of `parameters`.
    pub fn configure(
        num_waves: usize,
        total_steepness: f32,
        parameters: &[WaveParameter],
    ) -> Result<Self, ConfigError> {
        if num_waves > MAX_WAVES {
            return Err(ConfigError::TooManyWaves {
                requested: num_waves,
                max: MAX_WAVES,
            });
        }
        if num_waves > parameters.len() {
            return Err(ConfigError::MissingWaves {
                requested: num_waves,
                provided: parameters.len(),
            });
        }
        validate_steepness(total_steepness)?;
        for (index, parameter) in parameters[..num_waves].iter().enumerate() {
            validate_parameter(index, parameter)?;
        }

        let mut set = Self {
            total_steepness,
            parameters: parameters[..num_waves].to_vec(),
            waves: Vec::with_capacity(num_waves),
        };
        set.rederive_all();

        log::debug!(
            "Configured {} waves (total steepness {})",
            num_waves,
            total_steepness
        );
        Ok(set)
    }

    /// Replace wave `index`, or append when `index` is the next free slot.
    ///
    /// Replacing re-derives only that wave. Appending changes the wave count,
    /// which every steepness share depends on, so all waves are re-derived.
    pub fn set_parameter(
        &mut self,
        index: usize,
        parameter: WaveParameter,
    ) -> Result<(), ConfigError> {
        validate_parameter(index, &parameter)?;
        let len = self.parameters.len();

        if index < len {
            self.parameters[index] = parameter;
            self.waves[index] = DerivedWave::derive(&parameter, self.total_steepness, len);
        } else if index == len {
            if len == MAX_WAVES {
                return Err(ConfigError::TooManyWaves {
                    requested: len + 1,
                    max: MAX_WAVES,
                });
            }
            self.parameters.push(parameter);
            self.rederive_all();
        } else {
            return Err(ConfigError::WaveIndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Change the global steepness budget and re-derive every wave.
    pub fn set_total_steepness(&mut self, total_steepness: f32) -> Result<(), ConfigError> {
        validate_steepness(total_steepness)?;
        self.total_steepness = total_steepness;
        self.rederive_all();
        Ok(())
    }

    fn rederive_all(&mut self) {
        let num_waves = self.parameters.len();
        self.waves = self
            .parameters
            .iter()
            .map(|p| DerivedWave::derive(p, self.total_steepness, num_waves))
            .collect();
    }

    pub fn num_waves(&self) -> usize {
        self.waves.len()
    }

    pub fn total_steepness(&self) -> f32 {
        self.total_steepness
    }

    pub fn waves(&self) -> &[DerivedWave] {
        &self.waves
    }

    /// Parameters as supplied (direction still in degrees).
    pub fn raw_parameters(&self) -> &[WaveParameter] {
        &self.parameters
    }

    /// Sum every wave's contribution at one rest point.
    ///
    /// `rest_xz` holds the undisplaced (x, z); rest height is always 0.
    pub fn sample(&self, rest_xz: Vec2, time: f32) -> WaveSample {
        let mut offset = Vec3::ZERO;
        let mut normal = Vec3::Y;

        for wave in &self.waves {
            let dir = wave.direction_xz();
            let phase = wave.angular_frequency * dir.dot(rest_xz) + wave.phase_speed * time;
            let (sin_p, cos_p) = phase.sin_cos();

            let horizontal = wave.steepness_share * wave.amplitude * cos_p;
            offset.x += horizontal * dir.x;
            offset.y += wave.amplitude * sin_p;
            offset.z += horizontal * dir.y;

            let wa = wave.angular_frequency * wave.amplitude;
            normal.x -= dir.x * wa * cos_p;
            normal.y -= wave.steepness_share * wa * sin_p;
            normal.z -= dir.y * wa * cos_p;
        }

        WaveSample {
            position: Vec3::new(rest_xz.x + offset.x, offset.y, rest_xz.y + offset.z),
            normal: normal.normalize(),
        }
    }

    /// Texture-coordinate scroll contributed by one update.
    ///
    /// V runs toward -Z on the grid, so the Z component enters with the opposite sign.
    pub fn scroll_step(&self) -> Vec2 {
        self.waves.iter().fold(Vec2::ZERO, |acc, wave| {
            let dir = wave.direction_xz();
            acc + Vec2::new(-dir.x, dir.y) * wave.phase_speed
        })
    }
}

fn validate_parameter(index: usize, parameter: &WaveParameter) -> Result<(), ConfigError> {
    if !(parameter.wavelength.is_finite() && parameter.wavelength > 0.0) {
        return Err(ConfigError::InvalidWavelength {
            index,
            wavelength: parameter.wavelength,
        });
    }
    for (field, value) in [
        ("direction", parameter.direction),
        ("amplitude", parameter.amplitude),
        ("speed", parameter.speed),
    ] {
        if !value.is_finite() {
            return Err(ConfigError::InvalidValue { field, value });
        }
    }
    Ok(())
}

fn validate_steepness(total_steepness: f32) -> Result<(), ConfigError> {
    if !(total_steepness.is_finite() && total_steepness >= 0.0) {
        return Err(ConfigError::InvalidValue {
            field: "total_steepness",
            value: total_steepness,
        });
    }
    if total_steepness > 1.0 {
        log::warn!(
            "Total steepness {} exceeds 1.0; wave crests may loop over themselves",
            total_steepness
        );
    }
    Ok(())
}
