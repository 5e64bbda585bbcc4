use std::borrow::Cow;
use std::rc::Rc;

use anyhow::{Context, Result};

use super::diagnostics;
use super::error_scope::{ErrorScope, ErrorScopes};
use super::negotiate;
use super::surface::{self, SurfaceSize};
use super::GpuInit;

/// Owns the wgpu device, queue and (optional) presentation surface.
///
/// Construction performs the whole negotiation synchronously: adapter, device,
/// then the surface format. The committed `surface_format` never changes for the
/// lifetime of the context. Everything is released when the context is dropped;
/// the surface goes first.
pub struct GpuContext<'w> {
    /// Surface bound to the host window, if any.
    ///
    /// Surface lifetime is tied to the window via `'w`; the host must drop the
    /// context before the window.
    surface: Option<wgpu::Surface<'w>>,

    /// Format committed at construction (`None` for headless contexts).
    surface_format: Option<wgpu::TextureFormat>,

    /// Last configuration submitted to the surface.
    config: Option<wgpu::SurfaceConfiguration>,

    /// Pending validation-scope pops, drained in [`GpuContext::tick`].
    error_scopes: Rc<ErrorScopes>,

    queue: wgpu::Queue,
    device: wgpu::Device,

    init: GpuInit,
}

impl<'w> GpuContext<'w> {
    /// Creates an instance and a surface for `target`, then negotiates.
    pub fn for_window(target: impl Into<wgpu::SurfaceTarget<'w>>, init: GpuInit) -> Result<Self> {
        let instance = create_instance(&init);

        let surface = instance
            .create_surface(target)
            .context("failed to create wgpu surface")?;

        Self::new(instance, Some(surface), init)
    }

    /// Negotiates adapter and device on `instance`.
    ///
    /// With a surface, only compatible adapters are considered and the first
    /// supported surface format is committed (see [`GpuInit::prefer_srgb`]).
    pub fn new(
        instance: wgpu::Instance,
        surface: Option<wgpu::Surface<'w>>,
        init: GpuInit,
    ) -> Result<Self> {
        let adapter =
            negotiate::request_adapter(&instance, surface.as_ref(), init.power_preference)?;
        if init.log_diagnostics {
            diagnostics::log_adapter(&adapter);
        }

        let (device, queue) = negotiate::request_device(&adapter, &init)?;
        if init.log_diagnostics {
            diagnostics::log_device(&device);
        }

        let surface_format = match surface.as_ref() {
            Some(s) => {
                let caps = s.get_capabilities(&adapter);
                if init.log_diagnostics {
                    diagnostics::log_surface_formats(&caps.formats);
                }
                let format = surface::choose_surface_format(&caps, init.prefer_srgb)
                    .context("surface reports no supported formats")?;
                Some(format)
            }
            None => None,
        };

        Ok(Self {
            surface,
            surface_format,
            config: None,
            error_scopes: ErrorScopes::new(),
            queue,
            device,
            init,
        })
    }

    /// Returns the committed surface format (`None` without a surface).
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.surface_format
    }

    /// Returns the last configured size, if the surface was configured.
    pub fn surface_size(&self) -> Option<SurfaceSize> {
        self.config
            .as_ref()
            .map(|c| SurfaceSize::new(c.width, c.height))
    }

    pub fn surface(&self) -> Option<&wgpu::Surface<'w>> {
        self.surface.as_ref()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn error_scopes(&self) -> &Rc<ErrorScopes> {
        &self.error_scopes
    }

    /// Opens a validation scope on this context's device.
    pub fn error_scope(&self, name: impl Into<Cow<'static, str>>) -> ErrorScope {
        ErrorScope::push(&self.device, name, &self.error_scopes)
    }

    /// Configures the surface for `size` with the committed format.
    ///
    /// Must be called before the first present and again whenever the viewport's
    /// pixel size changes. Fails without a surface or for an empty size.
    pub fn configure_surface(&mut self, size: SurfaceSize) -> Result<()> {
        let Some(surface) = self.surface.as_ref() else {
            anyhow::bail!("configure_surface called on a context without a surface");
        };
        anyhow::ensure!(
            !size.is_empty(),
            "cannot configure a {}x{} surface",
            size.width,
            size.height
        );
        let format = self
            .surface_format
            .context("surface format was not committed")?;

        let _scope = ErrorScope::push(&self.device, "configure_surface", &self.error_scopes);

        let config = surface::surface_configuration(
            format,
            size,
            self.init.present_mode,
            self.init.alpha_mode,
            self.init.desired_maximum_frame_latency,
        );
        surface.configure(&self.device, &config);
        self.config = Some(config);

        Ok(())
    }

    /// Re-applies the last configuration after the surface was lost or outdated.
    ///
    /// Returns `false` when there is nothing to re-apply.
    pub fn reconfigure(&self) -> bool {
        let (Some(surface), Some(config)) = (self.surface.as_ref(), self.config.as_ref()) else {
            return false;
        };
        let _scope = ErrorScope::push(&self.device, "reconfigure_surface", &self.error_scopes);
        surface.configure(&self.device, config);
        true
    }

    /// Drives pending device callbacks and reports resolved error scopes.
    pub fn tick(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {e}");
        }
        self.error_scopes.drain();
    }
}

impl GpuContext<'static> {
    /// Negotiates a context without a presentation surface.
    ///
    /// Useful for offscreen work and for tests.
    pub fn headless(init: GpuInit) -> Result<Self> {
        let instance = create_instance(&init);
        Self::new(instance, None, init)
    }
}

fn create_instance(init: &GpuInit) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: init.backends,
        backend_options: init.backend_options.clone(),
        ..Default::default()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Headless context on the no-op backend; available on every machine.
    pub(crate) fn headless_test_context() -> GpuContext<'static> {
        GpuContext::headless(GpuInit::noop()).expect("noop backend must always negotiate")
    }

    #[test]
    fn headless_context_has_no_surface_format() {
        let ctx = headless_test_context();
        assert!(ctx.surface().is_none());
        assert_eq!(ctx.surface_format(), None);
        assert_eq!(ctx.surface_size(), None);
    }

    #[test]
    fn configure_without_surface_is_rejected() {
        let mut ctx = headless_test_context();
        assert!(ctx.configure_surface(SurfaceSize::new(800, 600)).is_err());
        assert!(!ctx.reconfigure());
    }

    #[test]
    fn error_scope_reports_validation_errors() {
        let ctx = headless_test_context();
        {
            let _scope = ctx.error_scope("zero_sized_texture");
            let _t = ctx.device().create_texture(&wgpu::TextureDescriptor {
                label: Some("invalid"),
                size: wgpu::Extent3d {
                    width: 0,
                    height: 0,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
        }
        assert_eq!(ctx.error_scopes().pending(), 1);

        ctx.tick();
        assert_eq!(ctx.error_scopes().pending(), 0);
        assert_eq!(ctx.error_scopes().reported(), 1);
    }
}
