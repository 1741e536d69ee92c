//! Gerstner ocean - wave surface simulation with CPU and compute-shader backends

pub mod camera;
pub mod cli;
pub mod error;
pub mod gpu;
pub mod ocean;
pub mod params;
pub mod rendering;
