//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::OceanError;
use crate::ocean::Backend;
use crate::params::SurfaceConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "gerstner-ocean")]
#[command(about = "Gerstner wave ocean surface with CPU and compute-shader backends", long_about = None)]
pub struct Args {
    /// Surface configuration file (RON); defaults reproduce the demo scene
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wave backend: cpu (default) or gpu
    #[arg(long, value_name = "BACKEND", default_value = "cpu")]
    pub backend: Backend,

    /// Grid rows (overrides the config file)
    #[arg(long, value_name = "N")]
    pub rows: Option<u32>,

    /// Grid columns (overrides the config file)
    #[arg(long, value_name = "N")]
    pub cols: Option<u32>,

    /// Diffuse texture image (overrides the config file)
    #[arg(long, value_name = "FILE")]
    pub texture: Option<PathBuf>,

    /// Start in wireframe mode
    #[arg(long)]
    pub wireframe: bool,
}

impl Args {
    /// Load the config file, if any, and apply command-line overrides on top
    pub fn build_surface_config(&self) -> Result<SurfaceConfig, OceanError> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading surface config from {}", path.display());
                SurfaceConfig::load(path)?
            }
            None => SurfaceConfig::default(),
        };

        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(texture) = &self.texture {
            config.texture_file = Some(texture.clone());
        }

        Ok(config)
    }
}
