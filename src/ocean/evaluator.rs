//! Common interface for the CPU and compute-shader wave backends.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;

use super::mesh::{GridMesh, Vertex};
use super::waves::WaveParameterSet;
use crate::error::OceanError;

/// Which evaluator drives the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Sequential per-vertex loop on the host
    Cpu,
    /// Compute-shader dispatch with synchronous readback
    Gpu,
}

impl Backend {
    pub fn toggled(self) -> Self {
        match self {
            Backend::Cpu => Backend::Gpu,
            Backend::Gpu => Backend::Cpu,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "CPU"),
            Backend::Gpu => write!(f, "GPU compute"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Backend::Cpu),
            "gpu" | "compute" | "parallel" => Ok(Backend::Gpu),
            other => Err(format!("unknown backend '{}' (expected cpu or gpu)", other)),
        }
    }
}

/// Evaluates the wave sum over a grid, producing the vertex array to draw.
///
/// Implementations own their per-frame vertex array and any device resources.
/// `initialize` on an already initialized evaluator releases the old
/// resources first.
pub trait WaveEvaluator {
    fn backend(&self) -> Backend;

    /// Allocate resources for `grid`. Fails fast on configuration problems.
    fn initialize(&mut self, grid: &GridMesh) -> Result<(), OceanError>;

    /// Overwrite every position and normal for `time`, then advance the texture scroll.
    fn update(&mut self, waves: &WaveParameterSet, time: f32) -> Result<(), OceanError>;

    /// Current vertex array in draw order. Empty until initialized.
    fn vertices(&self) -> &[Vertex];

    /// Accumulated texture-coordinate offset.
    fn tex_offset(&self) -> Vec2;

    /// Drop every resource; the evaluator must be initialized again before use.
    fn release(&mut self);

    fn is_initialized(&self) -> bool;
}

/// Cold switch from `active` to `next` over the same grid.
///
/// `active` is released before `next` allocates anything. When `next` fails
/// to initialize, `active` is brought back and the original error returned.
/// If that restore fails as well, `active` stays released and reports
/// `OceanError::NotInitialized` on every update until initialized again.
pub fn switch_evaluator(
    active: &mut Box<dyn WaveEvaluator>,
    mut next: Box<dyn WaveEvaluator>,
    grid: &GridMesh,
) -> Result<(), OceanError> {
    let previous = active.backend();
    active.release();

    match next.initialize(grid) {
        Ok(()) => {
            log::info!("Switched wave backend: {} -> {}", previous, next.backend());
            *active = next;
            Ok(())
        }
        Err(err) => {
            log::error!("Failed to switch to {} backend: {}", next.backend(), err);
            if let Err(restore) = active.initialize(grid) {
                log::error!(
                    "Failed to restore {} backend, surface has no active evaluator: {}",
                    previous,
                    restore
                );
            }
            Err(err)
        }
    }
}

/// Texture-coordinate scroll, advanced once per update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TexScroll {
    offset: Vec2,
}

impl TexScroll {
    pub fn advance(&mut self, waves: &WaveParameterSet) {
        self.offset += waves.scroll_step();
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
    }
}
