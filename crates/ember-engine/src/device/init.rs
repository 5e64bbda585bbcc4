/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may pick adapters from.
    pub backends: wgpu::Backends,

    /// Per-backend instance options.
    pub backend_options: wgpu::BackendOptions,

    /// Adapter preference policy.
    ///
    /// Defaults to the "high performance" power class.
    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: the first format reported by the surface is committed.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is vsync-locked and supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Alpha compositing mode for the surface.
    pub alpha_mode: wgpu::CompositeAlphaMode,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Log adapter, device and surface properties after negotiation.
    pub log_diagnostics: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            backend_options: wgpu::BackendOptions::default(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            log_diagnostics: true,
        }
    }
}

impl GpuInit {
    /// Targets wgpu's no-op backend.
    ///
    /// Every call is validated as usual but no hardware is touched, so this works
    /// on machines without a GPU. Only useful for headless contexts.
    pub fn noop() -> Self {
        Self {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            log_diagnostics: false,
            ..Self::default()
        }
    }
}
