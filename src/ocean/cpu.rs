//! Sequential CPU wave evaluator.

use glam::Vec2;

use super::evaluator::{Backend, TexScroll, WaveEvaluator};
use super::mesh::{GridMesh, Vertex};
use super::waves::WaveParameterSet;
use crate::error::OceanError;

/// Evaluates every wave at every vertex on the calling thread.
///
/// O(rows · cols · waves) per update.
#[derive(Debug, Default)]
pub struct CpuEvaluator {
    vertices: Vec<Vertex>,
    rest_positions: Vec<Vec2>,
    scroll: TexScroll,
}

impl CpuEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaveEvaluator for CpuEvaluator {
    fn backend(&self) -> Backend {
        Backend::Cpu
    }

    fn initialize(&mut self, grid: &GridMesh) -> Result<(), OceanError> {
        self.release();
        self.vertices = grid.vertices.clone();
        self.rest_positions = grid.rest_positions().to_vec();
        log::info!(
            "CPU evaluator: {}x{} grid ({} vertices)",
            grid.rows(),
            grid.cols(),
            self.vertices.len()
        );
        Ok(())
    }

    fn update(&mut self, waves: &WaveParameterSet, time: f32) -> Result<(), OceanError> {
        if !self.is_initialized() {
            return Err(OceanError::NotInitialized(Backend::Cpu));
        }
        for (vertex, &rest) in self.vertices.iter_mut().zip(&self.rest_positions) {
            let sample = waves.sample(rest, time);
            vertex.position = sample.position.to_array();
            vertex.normal = sample.normal.to_array();
        }
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
        self.vertices = Vec::new();
        self.rest_positions = Vec::new();
        self.scroll.reset();
    }

    fn is_initialized(&self) -> bool {
        !self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::waves::GRAVITY;
    use crate::params::{SurfaceConfig, WaveParameter};
    use glam::Vec3;

    /// Largest deviation of any normal from unit length
    fn max_normal_error(vertices: &[Vertex]) -> f32 {
        vertices
            .iter()
            .map(|v| (Vec3::from_array(v.normal).length() - 1.0).abs())
            .fold(0.0, f32::max)
    }

    fn demo_setup() -> (WaveParameterSet, GridMesh) {
        let config = SurfaceConfig::default();
        let waves =
            WaveParameterSet::configure(config.num_waves, config.total_steepness, &config.waves)
                .unwrap();
        let grid = GridMesh::build(32, 48, config.spatial_step).unwrap();
        (waves, grid)
    }

    #[test]
    fn test_uninitialized_is_empty() {
        let evaluator = CpuEvaluator::new();
        assert!(!evaluator.is_initialized());
        assert!(evaluator.vertices().is_empty());
    }

    #[test]
    fn test_update_is_deterministic() {
        let (waves, grid) = demo_setup();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();

        evaluator.update(&waves, 3.25).unwrap();
        let first = evaluator.vertices().to_vec();
        evaluator.update(&waves, 7.0).unwrap();
        evaluator.update(&waves, 3.25).unwrap();

        assert_eq!(first, evaluator.vertices());
    }

    #[test]
    fn test_rest_state_with_flat_waves() {
        let waves = WaveParameterSet::configure(
            2,
            0.5,
            &[
                WaveParameter::new(45.0, 0.0, 20.0, 0.01),
                WaveParameter::new(0.0, 0.0, 10.0, 0.01),
            ],
        )
        .unwrap();
        let grid = GridMesh::build(16, 16, 1.0).unwrap();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();

        evaluator.update(&waves, 0.0).unwrap();

        for (vertex, rest) in evaluator.vertices().iter().zip(&grid.vertices) {
            assert_eq!(vertex.position, rest.position);
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
            assert_eq!(vertex.uv, rest.uv);
        }
    }

    #[test]
    fn test_normals_unit_length() {
        let (waves, grid) = demo_setup();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();

        for time in [0.0, 1.5, 42.0] {
            evaluator.update(&waves, time).unwrap();
            assert!(max_normal_error(evaluator.vertices()) < 1e-5);
        }
    }

    #[test]
    fn test_concrete_scenario_grid() {
        // ω = 1, phase speed = 1, share = 1, direction +Z
        let waves = WaveParameterSet::configure(
            1,
            1.0,
            &[WaveParameter::new(
                0.0,
                1.0,
                std::f32::consts::TAU,
                1.0 / GRAVITY.sqrt(),
            )],
        )
        .unwrap();
        let grid = GridMesh::build(4, 4, 1.0).unwrap();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();
        evaluator.update(&waves, 0.0).unwrap();

        for (vertex, rest) in evaluator.vertices().iter().zip(grid.rest_positions()) {
            // phase = rest.z for a +Z wave at t = 0
            let phase = rest.y;
            assert!((vertex.position[0] - rest.x).abs() < 1e-5);
            assert!((vertex.position[1] - phase.sin()).abs() < 1e-5);
            assert!((vertex.position[2] - (rest.y + phase.cos())).abs() < 1e-5);
        }
    }

    #[test]
    fn test_scroll_advances_per_update() {
        let (waves, grid) = demo_setup();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();

        for step in 1..=3 {
            evaluator.update(&waves, step as f32 * 0.016).unwrap();
        }

        let expected = waves.scroll_step() * 3.0;
        assert!(evaluator.tex_offset().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_reinitialize_restores_rest_and_scroll() {
        let (waves, grid) = demo_setup();
        let mut evaluator = CpuEvaluator::new();
        evaluator.initialize(&grid).unwrap();
        evaluator.update(&waves, 9.0).unwrap();

        evaluator.initialize(&grid).unwrap();

        assert_eq!(evaluator.vertices(), grid.vertices.as_slice());
        assert_eq!(evaluator.tex_offset(), Vec2::ZERO);

        evaluator.release();
        assert!(!evaluator.is_initialized());
        assert!(matches!(
            evaluator.update(&waves, 10.0),
            Err(OceanError::NotInitialized(Backend::Cpu))
        ));
    }
}
