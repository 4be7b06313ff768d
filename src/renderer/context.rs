//! GPU context
//!
//! Owns the `wgpu` device and queue. The engine renders entirely offscreen
//! and owns no window or surface; an embedding application either hands in
//! its own device/queue or requests a headless context here.

use crate::errors::{EmberError, Result};

/// Device/queue pair shared by every pipeline component.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Wraps an existing device/queue from the embedding application.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Requests a headless high-performance device.
    ///
    /// Adapter or device failures are fatal initialization errors; the
    /// pipeline must not proceed without a context.
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EmberError::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        log::debug!("Headless GPU context created: {:?}", adapter.get_info().name);
        Ok(Self { device, queue })
    }
}
