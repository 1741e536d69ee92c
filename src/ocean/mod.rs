//! Ocean surface simulation: Gerstner wave sum on a uniform grid, evaluated
//! either on the CPU or in a compute shader.

mod cpu;
mod evaluator;
mod mesh;
mod parallel;
mod waves;

// Re-export public types
pub use cpu::CpuEvaluator;
pub use evaluator::{switch_evaluator, Backend, TexScroll, WaveEvaluator};
pub use mesh::{GridMesh, Vertex};
pub use parallel::{check_tile_alignment, ParallelEvaluator, TILE_SIZE};
pub use waves::{DerivedWave, WaveParameterSet, WaveSample, GRAVITY, MAX_WAVES};
