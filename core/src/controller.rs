use crate::arena::{ArenaBounds, Filter, Profile};
use crate::device::{ScanSession, SensorDevice, SessionState};
use crate::prelude::{ScanError, ScanResult};
use crate::render::{RenderDispatch, RenderSurface, SurfaceSet, VisualizationMode};
use crate::scheduler::{PollScheduler, DEFAULT_POLL_INTERVAL};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;

/// Upper bound on calibration triggers before giving up.
pub const DEFAULT_CALIBRATION_LIMIT: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub calibration_max_iterations: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            calibration_max_iterations: DEFAULT_CALIBRATION_LIMIT,
        }
    }
}

/// Operator choices applied to the device on the next start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub profile: Profile,
    pub filter: Filter,
    pub bounds: ArenaBounds,
}

impl Default for Selection {
    fn default() -> Self {
        let profile = Profile::default();
        Self {
            profile,
            filter: Filter::default(),
            bounds: profile.defaults(),
        }
    }
}

/// State touched by both the control side and the poll task.
struct ScanCore<D: SensorDevice, S: RenderSurface> {
    session: ScanSession<D>,
    dispatch: RenderDispatch<S>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for the control panel: start, stop, mode and arena edits.
pub struct ScanController<D: SensorDevice, S: RenderSurface> {
    core: Arc<Mutex<ScanCore<D, S>>>,
    scheduler: PollScheduler,
    selection: Selection,
    options: ControllerOptions,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl<D, S> ScanController<D, S>
where
    D: SensorDevice + Send + 'static,
    S: RenderSurface + Send + 'static,
{
    pub fn new(device: D, surfaces: SurfaceSet<S>, options: ControllerOptions) -> Self {
        let logger = LogManager::new();
        let core = ScanCore {
            session: ScanSession::new(device, logger.clone()),
            dispatch: RenderDispatch::new(surfaces),
        };
        Self {
            core: Arc::new(Mutex::new(core)),
            scheduler: PollScheduler::new(options.poll_interval),
            selection: Selection::default(),
            options,
            logger,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn logger(&self) -> &LogManager {
        &self.logger
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.core).session.scanning()
    }

    pub fn session_state(&self) -> SessionState {
        lock(&self.core).session.state()
    }

    pub fn mode(&self) -> VisualizationMode {
        lock(&self.core).dispatch.mode()
    }

    pub fn poll_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Read access to the session and surfaces, e.g. for a status panel.
    pub fn inspect<R>(&self, f: impl FnOnce(&ScanSession<D>, &RenderDispatch<S>) -> R) -> R {
        let core = lock(&self.core);
        f(&core.session, &core.dispatch)
    }

    /// Selects a profile and overwrites all bounds with its defaults.
    pub fn select_profile(&mut self, profile: Profile) -> ScanResult<()> {
        self.ensure_idle("change profile")?;
        self.selection.profile = profile;
        self.selection.bounds = profile.defaults();
        self.logger
            .record(&format!("Loaded {} arena defaults.", profile));
        Ok(())
    }

    pub fn select_filter(&mut self, filter: Filter) -> ScanResult<()> {
        self.ensure_idle("change filter")?;
        self.selection.filter = filter;
        Ok(())
    }

    /// Replaces the arena. Validation happens when the device is configured.
    pub fn set_bounds(&mut self, bounds: ArenaBounds) -> ScanResult<()> {
        self.ensure_idle("edit the arena")?;
        self.selection.bounds = bounds;
        Ok(())
    }

    /// Switches the visualization mode; see [`RenderDispatch::set_mode`].
    pub fn set_mode(&mut self, mode: VisualizationMode) -> bool {
        let mut core = lock(&self.core);
        let scanning = core.session.scanning();
        core.dispatch.set_mode(mode, scanning)
    }

    pub fn start(&mut self) -> ScanResult<()> {
        self.start_with_progress(|_| {})
    }

    /// Connects if needed, configures, calibrates (blocking) and schedules
    /// the poll loop. Ignored while already scanning. On failure the error is
    /// reported and the controller stays idle. Must run inside a tokio
    /// runtime, otherwise fails with [`ScanError::NoRuntime`].
    pub fn start_with_progress<F>(&mut self, on_progress: F) -> ScanResult<()>
    where
        F: FnMut(f64),
    {
        let result = self.begin_scan(on_progress);
        if let Err(err) = &result {
            self.logger.error(&format!("Start failed: {}", err));
        }
        result
    }

    fn begin_scan<F>(&mut self, on_progress: F) -> ScanResult<()>
    where
        F: FnMut(f64),
    {
        {
            let mut core = lock(&self.core);
            if core.session.scanning() {
                return Ok(());
            }
            // The poll task is spawned last; refuse before the device moves.
            if Handle::try_current().is_err() {
                return Err(ScanError::NoRuntime);
            }
            if !core.session.connected() {
                core.session.connect()?;
            }
            let Selection {
                profile,
                filter,
                bounds,
            } = self.selection;
            core.session.configure(profile, filter, bounds)?;
            let triggers = core
                .session
                .calibrate(self.options.calibration_max_iterations, on_progress)?;
            self.metrics.record_calibration(triggers);
        }

        let core = self.core.clone();
        let metrics = self.metrics.clone();
        let logger = self.logger.clone();
        self.scheduler
            .start(move || run_cycle(&core, &metrics, &logger));
        self.logger.record("Scanning started.");
        Ok(())
    }

    /// Cancels the poll schedule, then stops the device. No-op when idle.
    pub fn stop(&mut self) -> bool {
        if !self.is_scanning() {
            return false;
        }
        self.scheduler.cancel();
        lock(&self.core).session.stop()
    }

    /// Stops and releases the device. The controller cannot start again.
    pub fn shutdown(&mut self) {
        self.stop();
        lock(&self.core).session.disconnect();
    }

    fn ensure_idle(&self, operation: &'static str) -> ScanResult<()> {
        if self.is_scanning() {
            return Err(ScanError::InvalidState {
                operation,
                state: SessionState::Scanning.to_string(),
            });
        }
        Ok(())
    }
}

/// Trigger, fetch for the active mode, transform and render. Errors are
/// reported and counted; they never end the schedule.
fn run_cycle<D: SensorDevice, S: RenderSurface>(
    core: &Mutex<ScanCore<D, S>>,
    metrics: &MetricsRecorder,
    logger: &LogManager,
) {
    let mut guard = lock(core);
    let core = &mut *guard;
    if !core.session.scanning() {
        return;
    }

    let kind = core.dispatch.mode().fetch_kind();
    match core.session.poll_once(kind) {
        Ok(frame) => {
            let bounds = *core.session.bounds();
            if core.dispatch.render(frame, &bounds) {
                metrics.record_cycle();
            } else {
                logger.warn("Frame did not match the active view; dropped.");
            }
        }
        Err(err) => {
            metrics.record_error();
            logger.error(&format!("Scanning error: {}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{RawSlice, ScriptedDevice, Target};
    use crate::render::{ArcPrimitive, RawScene, RecordingSurface, Scene, Viewport};
    use ndarray::array;

    type Controller = ScanController<ScriptedDevice, RecordingSurface>;

    fn controller(device: ScriptedDevice) -> Controller {
        let viewport = Viewport::new(400.0, 300.0);
        ScanController::new(
            device,
            SurfaceSet {
                arc: RecordingSurface::new(viewport),
                scatter: RecordingSurface::new(viewport),
                raw: RecordingSurface::new(viewport),
            },
            ControllerOptions::default(),
        )
    }

    async fn first_cycle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn sensor_profile_target_lands_at_ninety_degrees_half_radius() {
        let mut device = ScriptedDevice::new().with_calibration(&[0.0, 50.0, 100.0]);
        device.push_targets(vec![Target::new(0.0, 0.0, 10.5)]);
        let mut controller = controller(device);

        let mut progress = Vec::new();
        controller
            .start_with_progress(|p| progress.push(p))
            .unwrap();
        assert_eq!(progress, vec![50.0, 100.0]);
        assert!(controller.is_scanning());
        assert_eq!(controller.metrics().calibration_triggers, 2);

        first_cycle().await;
        let marker = controller.inspect(|_, dispatch| {
            match dispatch.surface(VisualizationMode::Arc).current() {
                Some(Scene::Arc(scene)) => scene.markers().next().cloned(),
                _ => None,
            }
        });
        match marker {
            Some(ArcPrimitive::Marker { center, .. }) => {
                assert!((center.x - 200.0).abs() < 1e-6);
                assert!((center.y - 222.5).abs() < 1e-6);
            }
            other => panic!("expected a marker, got {:?}", other),
        }
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn raw_mode_renders_two_by_two_grid() {
        let mut device = ScriptedDevice::new();
        device.push_raw(RawSlice::from_grid(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        let mut controller = controller(device);
        assert!(controller.set_mode(VisualizationMode::RawHeatmap));

        controller.start().unwrap();
        first_cycle().await;

        let scene = controller.inspect(|_, dispatch| {
            dispatch
                .surface(VisualizationMode::RawHeatmap)
                .current()
                .cloned()
        });
        match scene {
            Some(Scene::Raw(RawScene::Grid { data, .. })) => {
                assert_eq!(data, array![[1.0f32, 2.0], [3.0, 4.0]]);
            }
            other => panic!("expected a grid, got {:?}", other),
        }
        let fetched_raw = controller.inspect(|session, _| session.device().count("get_raw_slice"));
        assert!(fetched_raw >= 1);
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let mut controller = controller(ScriptedDevice::new());
        assert!(!controller.stop());
        assert_eq!(controller.session_state(), SessionState::Disconnected);
        assert!(!controller.poll_pending());

        controller.start().unwrap();
        assert!(controller.poll_pending());
        assert!(controller.stop());
        assert!(!controller.stop());

        assert!(!controller.poll_pending());
        assert_eq!(controller.session_state(), SessionState::Connected);
        let stops = controller.inspect(|session, _| session.device().count("stop"));
        assert_eq!(stops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_cycles_after_stop_returns() {
        let mut controller = controller(ScriptedDevice::new());
        controller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        controller.stop();
        let triggers = controller.inspect(|session, _| session.device().count("trigger"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let later = controller.inspect(|session, _| session.device().count("trigger"));
        assert_eq!(triggers, later);
        assert_eq!(controller.metrics().cycles, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_device_error_still_leaves_scanning() {
        let mut device = ScriptedDevice::new();
        device.fail_on("stop", "bus error");
        let mut controller = controller(device);
        controller.start().unwrap();

        assert!(controller.stop());
        assert!(!controller.is_scanning());
        let reported = controller
            .logger()
            .history()
            .iter()
            .filter(|l| l.contains("bus error"))
            .count();
        assert_eq!(reported, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_leaves_controller_idle() {
        let mut device = ScriptedDevice::new();
        device.fail_on("connect_any", "no sensor");
        let mut controller = controller(device);

        let err = controller.start().unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable(_)));
        assert_eq!(controller.session_state(), SessionState::Disconnected);
        assert!(!controller.poll_pending());
        let calls = controller.inspect(|session, _| session.device().count("set_profile"));
        assert_eq!(calls, 0);
        assert!(controller
            .logger()
            .last()
            .unwrap()
            .starts_with("Start failed: device unavailable"));
    }

    #[test]
    fn start_outside_runtime_fails_before_touching_device() {
        let mut controller = controller(ScriptedDevice::new());

        assert!(matches!(controller.start(), Err(ScanError::NoRuntime)));
        assert_eq!(controller.session_state(), SessionState::Disconnected);
        assert!(!controller.is_scanning());
        assert!(!controller.poll_pending());
        assert!(!controller.stop());
        let calls = controller.inspect(|session, _| session.device().calls().len());
        assert_eq!(calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn arena_command_failure_leaves_session_connected() {
        let mut device = ScriptedDevice::new();
        device.fail_on("set_arena", "axis rejected");
        let mut controller = controller(device);

        match controller.start() {
            Err(ScanError::DeviceCommand { command, .. }) => assert_eq!(command, "set_arena"),
            other => panic!("expected set_arena failure, got {:?}", other),
        }
        assert_eq!(controller.session_state(), SessionState::Connected);
        assert!(!controller.poll_pending());
        let (arenas, starts, stops) = controller.inspect(|session, _| {
            let device = session.device();
            (device.count("set_arena"), device.count("start"), device.count("stop"))
        });
        assert_eq!((arenas, starts, stops), (1, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn device_start_failure_stops_and_stays_configured() {
        let mut device = ScriptedDevice::new();
        device.fail_on("start", "radar busy");
        let mut controller = controller(device);

        match controller.start() {
            Err(ScanError::DeviceCommand { command, .. }) => assert_eq!(command, "start"),
            other => panic!("expected start failure, got {:?}", other),
        }
        assert_eq!(controller.session_state(), SessionState::Configured);
        assert!(!controller.is_scanning());
        assert!(!controller.poll_pending());
        let (calibrations, stops) = controller.inspect(|session, _| {
            let device = session.device();
            (device.count("start_calibration"), device.count("stop"))
        });
        assert_eq!((calibrations, stops), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn calibration_trigger_failure_aborts_start() {
        let mut device = ScriptedDevice::new().with_calibration(&[0.0, 50.0]);
        device.fail_on("trigger", "comm error");
        let mut controller = controller(device);

        match controller.start() {
            Err(ScanError::DeviceCommand { command, .. }) => assert_eq!(command, "trigger"),
            other => panic!("expected trigger failure, got {:?}", other),
        }
        assert_eq!(controller.session_state(), SessionState::Configured);
        assert!(!controller.poll_pending());
        assert_eq!(controller.metrics().calibration_triggers, 0);
        let stops = controller.inspect(|session, _| session.device().count("stop"));
        assert_eq!(stops, 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.metrics().cycles, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_arena_aborts_start() {
        let mut controller = controller(ScriptedDevice::new());
        let mut bounds = Profile::Sensor.defaults();
        bounds.z.res = -1.0;
        controller.set_bounds(bounds).unwrap();

        assert!(matches!(controller.start(), Err(ScanError::InvalidArena(_))));
        assert_eq!(controller.session_state(), SessionState::Connected);
        assert!(!controller.poll_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_errors_do_not_end_the_schedule() {
        let mut device = ScriptedDevice::new();
        device.fail_times("trigger", 2, "comm error");
        let mut controller = controller(device);
        controller.start().unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let metrics = controller.metrics();
        assert_eq!(metrics.cycle_errors, 2);
        assert_eq!(metrics.cycles, 1);
        assert!(controller.poll_pending());
        assert!(controller.is_scanning());
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_resets_only_when_idle() {
        let mut device = ScriptedDevice::new();
        device.push_targets(vec![Target::new(1.0, 1.0, 5.0)]);
        let mut controller = controller(device);
        controller.set_mode(VisualizationMode::Scatter3D);
        controller.start().unwrap();
        first_cycle().await;

        // Cycles keep repainting the active view, so park on arc before the
        // next one and come back while still scanning.
        controller.set_mode(VisualizationMode::Arc);
        assert!(!controller.set_mode(VisualizationMode::Scatter3D));
        let kept = controller.inspect(|_, d| {
            let scatter = d.surface(VisualizationMode::Scatter3D);
            (scatter.is_blank(), scatter.resets())
        });
        assert_eq!(kept, (false, 1));

        controller.stop();
        assert!(controller.set_mode(VisualizationMode::Scatter3D));
        let blank = controller.inspect(|_, d| d.surface(VisualizationMode::Scatter3D).is_blank());
        assert!(blank);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_is_frozen_while_scanning() {
        let mut controller = controller(ScriptedDevice::new());
        controller.select_profile(Profile::ShortRangeImaging).unwrap();
        assert_eq!(
            controller.selection().bounds,
            Profile::ShortRangeImaging.defaults()
        );
        controller.select_filter(Filter::Derivative).unwrap();
        controller.start().unwrap();

        assert!(matches!(
            controller.select_profile(Profile::Sensor),
            Err(ScanError::InvalidState { .. })
        ));
        assert!(controller.set_bounds(Profile::Sensor.defaults()).is_err());
        let applied = controller.inspect(|session, _| (session.profile(), session.filter()));
        assert_eq!(applied, (Profile::ShortRangeImaging, Filter::Derivative));
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_reconfigures_without_reconnecting() {
        let mut controller = controller(ScriptedDevice::new());
        controller.start().unwrap();
        controller.start().unwrap();
        controller.stop();
        controller.start().unwrap();
        controller.stop();

        let (connects, profiles) = controller.inspect(|session, _| {
            let device = session.device();
            (device.count("connect_any"), device.count("set_profile"))
        });
        assert_eq!(connects, 1);
        assert_eq!(profiles, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_disconnects_for_good() {
        let mut controller = controller(ScriptedDevice::new());
        controller.start().unwrap();
        controller.shutdown();

        assert_eq!(controller.session_state(), SessionState::Closed);
        let disconnects = controller.inspect(|session, _| session.device().count("disconnect"));
        assert_eq!(disconnects, 1);
        assert!(matches!(controller.start(), Err(ScanError::SessionClosed)));
    }
}
