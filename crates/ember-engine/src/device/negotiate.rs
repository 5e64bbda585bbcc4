//! Adapter and device negotiation.
//!
//! wgpu hands out adapters and devices through futures. The core runs on a
//! single UI thread that has nothing else to do during startup, so both requests
//! are resolved with `pollster::block_on` instead of threading async through the
//! host.

use anyhow::{Context, Result};

use super::GpuInit;

/// Requests an adapter, blocking until the backend answers.
///
/// When `compatible_surface` is given, only adapters able to present to it are
/// considered.
pub fn request_adapter(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
    power_preference: wgpu::PowerPreference,
) -> Result<wgpu::Adapter> {
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference,
        compatible_surface,
        force_fallback_adapter: false,
    }))
        .inspect_err(|e| log::error!("failed to get wgpu adapter: {e}"))
        .context("failed to find a suitable GPU adapter")
}

/// Requests a logical device and its queue, blocking until the backend answers.
///
/// The returned device carries a standing device-lost callback that logs the
/// reason and message. Loss is reported, never recovered from, at this layer.
pub fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("ember device"),
        required_features: init.required_features,
        required_limits: init.required_limits.clone(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
        .inspect_err(|e| log::error!("failed to get wgpu device: {e}"))
        .context("failed to create wgpu device/queue")?;

    device.set_device_lost_callback(|reason, message| {
        log::log!(device_lost_level(reason), "device lost [reason: {reason:?}]: {message}");
    });

    Ok((device, queue))
}

/// `Destroyed` is the normal outcome of dropping the device on release.
fn device_lost_level(reason: wgpu::DeviceLostReason) -> log::Level {
    match reason {
        wgpu::DeviceLostReason::Destroyed => log::Level::Debug,
        _ => log::Level::Error,
    }
}
