//! Explicit GPU device context shared by evaluators and the renderer.

use std::sync::Arc;

use crate::error::OceanError;

/// Device and queue handles. Owned by whoever created the device and passed
/// down as `Arc<GpuContext>`; nothing in the library holds a global.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Arc<Self> {
        Arc::new(Self { device, queue })
    }

    /// Create a context without a window surface (tests, offline tooling).
    pub fn headless() -> Result<Arc<Self>, OceanError> {
        pollster::block_on(Self::headless_async())
    }

    async fn headless_async() -> Result<Arc<Self>, OceanError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(OceanError::AdapterNotFound)?;

        // Same optional features as the windowed device, so wireframe is available here too
        let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Headless Ocean Device"),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!("Headless GPU: {}", adapter.get_info().name);
        Ok(Self::new(device, queue))
    }

    /// Run `create` inside validation and out-of-memory error scopes.
    ///
    /// Any device error raised while creating resources becomes
    /// `OceanError::ResourceAllocation`; the partially built value is dropped.
    pub fn scoped_allocation<T>(
        &self,
        what: &str,
        create: impl FnOnce(&wgpu::Device) -> Result<T, OceanError>,
    ) -> Result<T, OceanError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let created = create(&self.device);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if let Some(error) = out_of_memory.or(validation) {
            log::error!("{}: {}", what, error);
            return Err(OceanError::ResourceAllocation(format!("{}: {}", what, error)));
        }
        created
    }
}
