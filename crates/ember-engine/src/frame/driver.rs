use std::time::{Duration, Instant};

use crate::device::{SurfaceErrorAction, SurfaceSize};
use crate::pipeline::QUAD_DRAW;
use crate::time::FrameClock;

use super::{FrameBackend, FrameConfig};

/// Render-loop lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    /// Nothing created yet; waiting for the widget to be shown.
    Uninitialized,
    /// Context negotiated and `on_device_ready(true)` fired; waiting for `run`.
    AwaitingDevice,
    /// Loop started; no frame rendered yet.
    Ready,
    /// At least one tick has run.
    Rendering,
    /// Negotiation failed or a tick hit a fatal error. Terminal.
    Failed,
    /// GPU state released on close. Terminal.
    Released,
}

/// Outcome of one `render_frame` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// A frame was submitted and presented.
    Presented,
    /// The tick did no drawing (zero-sized viewport, transient surface error).
    Skipped,
    /// The loop is not running; nothing was touched.
    Idle,
    /// Unrecoverable; the host should shut down.
    Fatal,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub surface_configurations: u64,
    pub pipeline_builds: u64,
}

type DeviceReadyHandler = Box<dyn FnMut(bool)>;

/// Drives the per-tick render sequence over a [`FrameBackend`].
///
/// Owned resources are dropped in declaration order on release: targets and
/// pipeline first, then the backend (device and surface).
pub struct FrameDriver<B: FrameBackend> {
    targets: Option<B::Targets>,
    pipeline: Option<B::Pipeline>,
    backend: Option<B>,

    state: DriverState,
    committed: Option<SurfaceSize>,
    clock: Option<FrameClock>,
    config: FrameConfig,
    stats: FrameStats,

    on_device_ready: Option<DeviceReadyHandler>,
}

impl<B: FrameBackend> FrameDriver<B> {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            targets: None,
            pipeline: None,
            backend: None,
            state: DriverState::Uninitialized,
            committed: None,
            clock: None,
            config,
            stats: FrameStats::default(),
            on_device_ready: None,
        }
    }

    /// Registers the callback fired once `initialize` has finished.
    pub fn set_device_ready_handler(&mut self, handler: impl FnMut(bool) + 'static) {
        self.on_device_ready = Some(Box::new(handler));
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn frame_interval(&self) -> Duration {
        self.config.frame_interval
    }

    /// Size the surface and targets were last built for.
    pub fn committed_size(&self) -> Option<SurfaceSize> {
        self.committed
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// `true` while timer ticks should be delivered.
    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Ready | DriverState::Rendering)
    }

    /// Builds the backend with `connect` and reports the outcome.
    ///
    /// Runs once; later calls are ignored. The device-ready handler receives
    /// `true` on success and `false` if `connect` failed, in which case the
    /// driver enters [`DriverState::Failed`] and never touches the GPU.
    pub fn initialize<F>(&mut self, connect: F) -> bool
    where
        F: FnOnce() -> anyhow::Result<B>,
    {
        if self.state != DriverState::Uninitialized {
            log::warn!("initialize called in state {:?}; ignored", self.state);
            return self.backend.is_some();
        }

        log::info!("requesting adapter and device...");
        let ok = match connect() {
            Ok(backend) => {
                self.backend = Some(backend);
                self.state = DriverState::AwaitingDevice;
                true
            }
            Err(e) => {
                log::error!("GPU initialization failed: {e:#}");
                self.state = DriverState::Failed;
                false
            }
        };

        if let Some(handler) = self.on_device_ready.as_mut() {
            handler(ok);
        }
        ok
    }

    /// Starts the render loop; `now` is the animation's time origin.
    pub fn run(&mut self, now: Instant) -> bool {
        if self.state != DriverState::AwaitingDevice {
            log::warn!("run called in state {:?}; ignored", self.state);
            return false;
        }
        log::info!("device initialized, starting render loop");
        self.clock = Some(FrameClock::starting_at(now));
        self.state = DriverState::Ready;
        true
    }

    /// Runs one tick for a viewport of `size` physical pixels.
    pub fn render_frame(&mut self, size: SurfaceSize) -> FrameStatus {
        self.render_frame_at(size, Instant::now())
    }

    /// Like [`render_frame`](Self::render_frame) with an explicit timestamp.
    pub fn render_frame_at(&mut self, size: SurfaceSize, now: Instant) -> FrameStatus {
        if !self.is_running() {
            return FrameStatus::Idle;
        }
        if size.is_empty() {
            self.stats.frames_skipped += 1;
            return FrameStatus::Skipped;
        }

        self.state = DriverState::Rendering;

        if let Some(backend) = self.backend.as_mut() {
            backend.begin_tick();
        }
        let status = self.tick(size, now);
        if let Some(backend) = self.backend.as_mut() {
            backend.end_tick();
        }

        if status == FrameStatus::Fatal {
            log::error!("fatal error while rendering; render loop stopped");
            self.state = DriverState::Failed;
        }
        status
    }

    fn tick(&mut self, size: SurfaceSize, now: Instant) -> FrameStatus {
        let Some(backend) = self.backend.as_mut() else {
            return FrameStatus::Idle;
        };

        // 1. Resize: reconfigure before anything touches the surface.
        if self.committed != Some(size) {
            if let Err(e) = backend.configure_surface(size) {
                log::error!("surface configuration failed: {e:#}");
                return FrameStatus::Fatal;
            }
            self.targets = None;
            self.targets = Some(backend.create_targets(size));
            self.committed = Some(size);
            self.stats.surface_configurations += 1;
            log::info!("configured surface: {} x {}", size.width, size.height);
        }

        // 2. Pipeline, once.
        if self.pipeline.is_none() {
            self.pipeline = Some(backend.build_pipeline());
            self.stats.pipeline_builds += 1;
        }

        let (Some(targets), Some(pipeline)) = (self.targets.as_ref(), self.pipeline.as_ref()) else {
            return FrameStatus::Fatal;
        };

        // 3. Uniforms.
        let elapsed = self.clock.map_or(0.0, |c| c.elapsed_at(now));
        backend.write_uniforms(pipeline, elapsed);

        // 4. Acquire, retrying once after a reconfigure.
        let frame = match backend.acquire_frame() {
            Ok(frame) => frame,
            Err(err) => match backend.recover_surface(err) {
                SurfaceErrorAction::Reconfigured => match backend.acquire_frame() {
                    Ok(frame) => frame,
                    Err(err) => {
                        log::warn!("surface still unavailable after reconfigure: {err}");
                        self.stats.frames_skipped += 1;
                        return FrameStatus::Skipped;
                    }
                },
                SurfaceErrorAction::SkipFrame => {
                    self.stats.frames_skipped += 1;
                    return FrameStatus::Skipped;
                }
                SurfaceErrorAction::Fatal => return FrameStatus::Fatal,
            },
        };

        // 5-7. Bind, record, submit; then present.
        backend.submit(&frame, targets, pipeline, &QUAD_DRAW);
        backend.present(frame);

        self.stats.frames_presented += 1;
        FrameStatus::Presented
    }

    /// Releases all GPU state and stops further ticks.
    ///
    /// The host must call this before destroying the native window.
    pub fn release(&mut self) {
        if self.state == DriverState::Released {
            return;
        }
        self.targets = None;
        self.pipeline = None;
        self.backend = None;
        self.clock = None;
        self.committed = None;
        self.state = DriverState::Released;
        log::info!("released GPU resources");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::device::surface_error_action;
    use crate::pipeline::DrawCall;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        BeginTick,
        Configure(SurfaceSize),
        CreateTargets(SurfaceSize),
        BuildPipeline,
        WriteUniforms(f32),
        Acquire,
        Recover(wgpu::SurfaceError),
        Submit { targets: SurfaceSize, draw: DrawCall },
        Present,
        EndTick,
    }

    type CallLog = Rc<RefCell<Vec<Call>>>;

    /// Records every call; acquisition fails with the queued errors first.
    struct FakeBackend {
        log: CallLog,
        acquire_errors: VecDeque<wgpu::SurfaceError>,
        fail_configure: bool,
    }

    impl FakeBackend {
        fn new(log: &CallLog) -> Self {
            Self {
                log: Rc::clone(log),
                acquire_errors: VecDeque::new(),
                fail_configure: false,
            }
        }

        fn push(&self, call: Call) {
            self.log.borrow_mut().push(call);
        }
    }

    impl FrameBackend for FakeBackend {
        type Targets = SurfaceSize;
        type Pipeline = ();
        type Frame = ();

        fn begin_tick(&mut self) {
            self.push(Call::BeginTick);
        }

        fn configure_surface(&mut self, size: SurfaceSize) -> anyhow::Result<()> {
            self.push(Call::Configure(size));
            anyhow::ensure!(!self.fail_configure, "configure failed");
            Ok(())
        }

        fn create_targets(&mut self, size: SurfaceSize) -> SurfaceSize {
            self.push(Call::CreateTargets(size));
            size.clamped()
        }

        fn build_pipeline(&mut self) {
            self.push(Call::BuildPipeline);
        }

        fn write_uniforms(&mut self, _pipeline: &(), elapsed: f32) {
            self.push(Call::WriteUniforms(elapsed));
        }

        fn acquire_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
            self.push(Call::Acquire);
            match self.acquire_errors.pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn recover_surface(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
            let action = surface_error_action(&err);
            self.push(Call::Recover(err));
            action
        }

        fn submit(&mut self, _frame: &(), targets: &SurfaceSize, _pipeline: &(), draw: &DrawCall) {
            self.push(Call::Submit {
                targets: *targets,
                draw: draw.clone(),
            });
        }

        fn present(&mut self, _frame: ()) {
            self.push(Call::Present);
        }

        fn end_tick(&mut self) {
            self.push(Call::EndTick);
        }
    }

    fn running_driver(backend: FakeBackend, t0: Instant) -> FrameDriver<FakeBackend> {
        let mut driver = FrameDriver::new(FrameConfig::default());
        assert!(driver.initialize(|| Ok(backend)));
        assert!(driver.run(t0));
        driver
    }

    fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
        log.borrow().iter().filter(|c| pred(c)).count()
    }

    fn position(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
        log.borrow()
            .iter()
            .position(|c| pred(c))
            .unwrap_or(usize::MAX)
    }

    const SVGA: SurfaceSize = SurfaceSize::new(800, 600);
    const HALF: SurfaceSize = SurfaceSize::new(400, 300);

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn lifecycle_reaches_rendering() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = FrameDriver::new(FrameConfig::default());
        assert_eq!(driver.state(), DriverState::Uninitialized);

        let ready = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&ready);
        driver.set_device_ready_handler(move |ok| seen.borrow_mut().push(ok));

        assert!(driver.initialize(|| Ok(FakeBackend::new(&log))));
        assert_eq!(driver.state(), DriverState::AwaitingDevice);
        assert_eq!(*ready.borrow(), vec![true]);

        assert!(driver.run(t0));
        assert_eq!(driver.state(), DriverState::Ready);

        assert_eq!(driver.render_frame_at(SVGA, t0), FrameStatus::Presented);
        assert_eq!(driver.state(), DriverState::Rendering);
    }

    #[test]
    fn ticks_before_run_are_idle() {
        let log = CallLog::default();
        let mut driver = FrameDriver::new(FrameConfig::default());
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Idle);

        assert!(driver.initialize(|| Ok(FakeBackend::new(&log))));
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Idle);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn initialize_runs_once() {
        let log = CallLog::default();
        let mut driver = FrameDriver::new(FrameConfig::default());
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        driver.set_device_ready_handler(move |_| *seen.borrow_mut() += 1);

        assert!(driver.initialize(|| Ok(FakeBackend::new(&log))));
        assert!(driver.initialize(|| anyhow::bail!("must not be called")));
        assert_eq!(*calls.borrow(), 1);
    }

    // ── negotiation failure ───────────────────────────────────────────────

    #[test]
    fn negotiation_failure_reports_false_and_never_renders() {
        let mut driver: FrameDriver<FakeBackend> = FrameDriver::new(FrameConfig::default());
        let ready = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&ready);
        driver.set_device_ready_handler(move |ok| seen.borrow_mut().push(ok));

        assert!(!driver.initialize(|| anyhow::bail!("no suitable adapter")));
        assert_eq!(*ready.borrow(), vec![false]);
        assert_eq!(driver.state(), DriverState::Failed);

        assert!(!driver.run(Instant::now()));
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Idle);
        assert!(driver.backend().is_none());
        assert_eq!(driver.stats(), FrameStats::default());
    }

    // ── resize handling ───────────────────────────────────────────────────

    #[test]
    fn same_size_twice_recreates_once() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);

        driver.render_frame_at(SVGA, t0);
        driver.render_frame_at(SVGA, t0 + Duration::from_millis(16));

        assert_eq!(count(&log, |c| matches!(c, Call::Configure(_))), 1);
        assert_eq!(count(&log, |c| matches!(c, Call::CreateTargets(_))), 1);
        assert_eq!(driver.stats().surface_configurations, 1);
    }

    #[test]
    fn zero_sized_viewport_is_skipped_without_touching_the_gpu() {
        let log = CallLog::default();
        let mut driver = running_driver(FakeBackend::new(&log), Instant::now());

        assert_eq!(driver.render_frame(SurfaceSize::new(0, 600)), FrameStatus::Skipped);
        assert!(log.borrow().is_empty());
        assert_eq!(driver.committed_size(), None);
    }

    #[test]
    fn configure_failure_is_fatal() {
        let log = CallLog::default();
        let mut backend = FakeBackend::new(&log);
        backend.fail_configure = true;
        let mut driver = running_driver(backend, Instant::now());

        assert_eq!(driver.render_frame(SVGA), FrameStatus::Fatal);
        assert_eq!(driver.state(), DriverState::Failed);
        assert_eq!(count(&log, |c| matches!(c, Call::CreateTargets(_))), 0);
        assert_eq!(log.borrow().last(), Some(&Call::EndTick));
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Idle);
    }

    // ── pipeline ──────────────────────────────────────────────────────────

    #[test]
    fn pipeline_is_built_once_across_ticks_and_resizes() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);

        for i in 0..5u64 {
            let size = if i % 2 == 0 { SVGA } else { HALF };
            driver.render_frame_at(size, t0 + Duration::from_millis(16 * i));
        }

        assert_eq!(count(&log, |c| *c == Call::BuildPipeline), 1);
        assert_eq!(driver.stats().pipeline_builds, 1);
        assert_eq!(driver.stats().surface_configurations, 5);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn tick_order_is_configure_acquire_submit_present() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);
        driver.render_frame_at(SVGA, t0);

        assert_eq!(
            *log.borrow(),
            vec![
                Call::BeginTick,
                Call::Configure(SVGA),
                Call::CreateTargets(SVGA),
                Call::BuildPipeline,
                Call::WriteUniforms(0.0),
                Call::Acquire,
                Call::Submit {
                    targets: SVGA,
                    draw: QUAD_DRAW,
                },
                Call::Present,
                Call::EndTick,
            ]
        );
    }

    #[test]
    fn elapsed_time_is_measured_from_run() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);

        driver.render_frame_at(SVGA, t0 + Duration::from_millis(500));
        driver.render_frame_at(SVGA, t0 + Duration::from_millis(2000));

        let times: Vec<f32> = log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::WriteUniforms(t) => Some(*t),
                _ => None,
            })
            .collect();
        assert_eq!(times.len(), 2);
        assert!((times[0] - 0.5).abs() < 1e-4);
        assert!((times[1] - 2.0).abs() < 1e-4);
    }

    // ── scenario ──────────────────────────────────────────────────────────

    #[test]
    fn resize_scenario_reuses_pipeline_and_recreates_targets() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);

        assert_eq!(driver.render_frame_at(SVGA, t0), FrameStatus::Presented);
        log.borrow_mut().clear();

        assert_eq!(
            driver.render_frame_at(HALF, t0 + Duration::from_millis(16)),
            FrameStatus::Presented
        );

        let configure = position(&log, |c| *c == Call::Configure(HALF));
        let targets = position(&log, |c| *c == Call::CreateTargets(HALF));
        let acquire = position(&log, |c| *c == Call::Acquire);
        let submit = position(&log, |c| matches!(c, Call::Submit { .. }));
        let present = position(&log, |c| *c == Call::Present);

        assert!(configure < targets && targets < acquire);
        assert!(acquire < submit && submit < present);
        assert_eq!(count(&log, |c| *c == Call::BuildPipeline), 0);
        assert_eq!(
            count(&log, |c| *c
                == Call::Submit {
                    targets: HALF,
                    draw: QUAD_DRAW,
                }),
            1
        );
        assert_eq!(driver.committed_size(), Some(HALF));
    }

    // ── surface errors ────────────────────────────────────────────────────

    #[test]
    fn outdated_surface_is_reconfigured_and_retried_once() {
        let log = CallLog::default();
        let mut backend = FakeBackend::new(&log);
        backend.acquire_errors.push_back(wgpu::SurfaceError::Outdated);
        let mut driver = running_driver(backend, Instant::now());

        assert_eq!(driver.render_frame(SVGA), FrameStatus::Presented);
        assert_eq!(count(&log, |c| *c == Call::Acquire), 2);
        assert_eq!(
            count(&log, |c| *c == Call::Recover(wgpu::SurfaceError::Outdated)),
            1
        );
    }

    #[test]
    fn second_acquire_failure_skips_the_frame() {
        let log = CallLog::default();
        let mut backend = FakeBackend::new(&log);
        backend.acquire_errors.push_back(wgpu::SurfaceError::Lost);
        backend.acquire_errors.push_back(wgpu::SurfaceError::Lost);
        let mut driver = running_driver(backend, Instant::now());

        assert_eq!(driver.render_frame(SVGA), FrameStatus::Skipped);
        assert_eq!(count(&log, |c| *c == Call::Acquire), 2);
        assert_eq!(count(&log, |c| *c == Call::Present), 0);
        assert_eq!(log.borrow().last(), Some(&Call::EndTick));
        assert_eq!(driver.state(), DriverState::Rendering);
    }

    #[test]
    fn timeout_skips_and_oom_is_fatal() {
        let log = CallLog::default();
        let mut backend = FakeBackend::new(&log);
        backend.acquire_errors.push_back(wgpu::SurfaceError::Timeout);
        backend.acquire_errors.push_back(wgpu::SurfaceError::OutOfMemory);
        let mut driver = running_driver(backend, Instant::now());

        assert_eq!(driver.render_frame(SVGA), FrameStatus::Skipped);
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Fatal);
        assert_eq!(driver.state(), DriverState::Failed);
        assert_eq!(driver.stats().frames_presented, 0);
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn release_drops_backend_and_suppresses_ticks() {
        let log = CallLog::default();
        let t0 = Instant::now();
        let mut driver = running_driver(FakeBackend::new(&log), t0);
        driver.render_frame_at(SVGA, t0);

        driver.release();
        assert_eq!(driver.state(), DriverState::Released);
        assert!(driver.backend().is_none());
        assert!(!driver.is_running());

        let before = log.borrow().len();
        assert_eq!(driver.render_frame(SVGA), FrameStatus::Idle);
        assert_eq!(log.borrow().len(), before);
    }
}
