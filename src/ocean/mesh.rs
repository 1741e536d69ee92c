//! Uniform grid mesh shared by both wave backends.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::error::ConfigError;

/// Vertex data for the ocean mesh (position + normal + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Flat rectangular grid centered on the origin in the XZ plane.
///
/// Row 0 lies at +Z, column 0 at -X. Vertex `(row, col)` lives at index
/// `row * cols + col`.
#[derive(Debug, Clone)]
pub struct GridMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Undisplaced (x, z) of every vertex; never modified after build
    rest_positions: Vec<Vec2>,
    rows: u32,
    cols: u32,
    spatial_step: f32,
}

impl GridMesh {
    /// Build a `rows` x `cols` grid with `spatial_step` between neighbours.
    pub fn build(rows: u32, cols: u32, spatial_step: f32) -> Result<Self, ConfigError> {
        if rows < 2 || cols < 2 {
            return Err(ConfigError::GridTooSmall { rows, cols });
        }
        if !(spatial_step.is_finite() && spatial_step > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "spatial_step",
                value: spatial_step,
            });
        }

        let half_width = (cols - 1) as f32 * spatial_step / 2.0;
        let half_depth = (rows - 1) as f32 * spatial_step / 2.0;
        let vertex_count = (rows * cols) as usize;

        let mut vertices = Vec::with_capacity(vertex_count);
        let mut rest_positions = Vec::with_capacity(vertex_count);

        for row in 0..rows {
            let z = half_depth - row as f32 * spatial_step;
            for col in 0..cols {
                let x = col as f32 * spatial_step - half_width;

                vertices.push(Vertex {
                    position: [x, 0.0, z],
                    normal: [0.0, 1.0, 0.0],
                    uv: [
                        col as f32 / (cols - 1) as f32,
                        row as f32 / (rows - 1) as f32,
                    ],
                });
                rest_positions.push(Vec2::new(x, z));
            }
        }

        // Two counter-clockwise triangles per cell, seen from +Y
        let mut indices = Vec::with_capacity(6 * ((rows - 1) * (cols - 1)) as usize);
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let near_left = row * cols + col;
                let near_right = near_left + 1;
                let far_left = near_left + cols;
                let far_right = far_left + 1;

                indices.extend_from_slice(&[
                    near_left, near_right, far_left, far_left, near_right, far_right,
                ]);
            }
        }

        Ok(Self {
            vertices,
            indices,
            rest_positions,
            rows,
            cols,
            spatial_step,
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn spatial_step(&self) -> f32 {
        self.spatial_step
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Rest snapshot, same order as `vertices`.
    pub fn rest_positions(&self) -> &[Vec2] {
        &self.rest_positions
    }
}
