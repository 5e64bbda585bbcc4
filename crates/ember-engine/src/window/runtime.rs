use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::device::{GpuInit, SurfaceSize};
use crate::frame::{FrameConfig, FrameDriver, FrameStatus, WgpuBackend};
use crate::time::FrameTimer;

use super::FailureNotice;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Show fatal startup failures in a modal dialog, not only in the log.
    pub error_dialogs: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ember".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            error_dialogs: true,
        }
    }
}

/// Events posted back into the loop by the driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HostEvent {
    /// Negotiation finished; `true` on success.
    DeviceReady(bool),
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and renders into it until it is closed.
    ///
    /// Returns an error if the device could not be initialized or a frame
    /// failed fatally.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, frame_config: FrameConfig) -> Result<()> {
        let event_loop = EventLoop::<HostEvent>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;
        let proxy = event_loop.create_proxy();
        let mut state = AppState::new(config, gpu_init, frame_config, proxy);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    driver: FrameDriver<WgpuBackend<'this>>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    frame_config: FrameConfig,
    proxy: EventLoopProxy<HostEvent>,

    entry: Option<WindowEntry>,
    timer: Option<FrameTimer>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl AppState {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        frame_config: FrameConfig,
        proxy: EventLoopProxy<HostEvent>,
    ) -> Self {
        Self {
            config,
            gpu_init,
            frame_config,
            proxy,
            entry: None,
            timer: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.shutdown(event_loop);
    }

    /// Releases GPU state before the window goes away, then exits.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            entry.with_driver_mut(|driver| driver.release());
            drop(entry);
        }
        self.timer = None;
        self.request_exit(event_loop);
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let frame_config = self.frame_config.clone();
        let proxy = self.proxy.clone();

        let entry = WindowEntryBuilder {
            window,
            driver_builder: |w| {
                let mut driver = FrameDriver::new(frame_config.clone());
                driver.set_device_ready_handler(move |ok| {
                    if proxy.send_event(HostEvent::DeviceReady(ok)).is_err() {
                        log::warn!("event loop closed before device-ready was delivered");
                    }
                });
                driver.initialize(|| WgpuBackend::connect(w, gpu_init, frame_config));
                driver
            },
        }
        .build();

        self.entry = Some(entry);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let size = SurfaceSize::from(entry.borrow_window().inner_size());
        let status = entry.with_driver_mut(|driver| driver.render_frame(size));

        if status == FrameStatus::Fatal {
            self.fail(event_loop, anyhow!("rendering failed; shutting down"));
        }
    }
}

impl ApplicationHandler<HostEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: HostEvent) {
        match event {
            HostEvent::DeviceReady(true) => {
                let Some(entry) = self.entry.as_mut() else {
                    return;
                };
                let now = Instant::now();
                let (started, interval) =
                    entry.with_driver_mut(|driver| (driver.run(now), driver.frame_interval()));
                if started {
                    self.timer = Some(FrameTimer::new(interval, now));
                    entry.borrow_window().request_redraw();
                }
            }
            HostEvent::DeviceReady(false) => {
                if self.config.error_dialogs {
                    FailureNotice::device_init_failed().show();
                }
                self.fail(event_loop, anyhow!("failed to initialize the GPU device"));
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (Some(entry), Some(timer)) = (self.entry.as_ref(), self.timer.as_mut()) else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let now = Instant::now();
        if timer.is_due(now) {
            entry.borrow_window().request_redraw();
            timer.advance(now);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(timer.deadline()));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_ref() else {
            return;
        };
        if entry.borrow_window().id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            // Render at the new size right away instead of waiting for the timer.
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                entry.borrow_window().request_redraw();
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
