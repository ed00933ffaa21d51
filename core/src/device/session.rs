use crate::arena::{ArenaBounds, Filter, Profile};
use crate::device::sdk::{RawSlice, SensorDevice, Target};
use crate::prelude::{ScanError, ScanResult};
use crate::telemetry::log::LogManager;
use std::fmt;

/// Lifecycle of the sensor session. A stopped session is back in `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Configured,
    Calibrating,
    Scanning,
    /// Disconnected at shutdown; terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Configured => "configured",
            SessionState::Calibrating => "calibrating",
            SessionState::Scanning => "scanning",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What a poll cycle asks the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Targets,
    RawSlice,
}

/// Data fetched by one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanFrame {
    Targets(Vec<Target>),
    Raw(RawSlice),
}

impl ScanFrame {
    pub fn kind(&self) -> FetchKind {
        match self {
            ScanFrame::Targets(_) => FetchKind::Targets,
            ScanFrame::Raw(_) => FetchKind::RawSlice,
        }
    }
}

/// State machine around a single sensor device.
///
/// Only this type mutates the session state. Profile, filter and bounds are
/// the values applied by the last successful [`ScanSession::configure`].
pub struct ScanSession<D: SensorDevice> {
    device: D,
    state: SessionState,
    profile: Profile,
    filter: Filter,
    bounds: ArenaBounds,
    logger: LogManager,
}

impl<D: SensorDevice> ScanSession<D> {
    pub fn new(device: D, logger: LogManager) -> Self {
        Self {
            device,
            state: SessionState::Disconnected,
            profile: Profile::default(),
            filter: Filter::default(),
            bounds: ArenaBounds::default(),
            logger,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connected(&self) -> bool {
        !matches!(
            self.state,
            SessionState::Disconnected | SessionState::Closed
        )
    }

    pub fn scanning(&self) -> bool {
        self.state == SessionState::Scanning
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Initializes the SDK and binds to any local device.
    pub fn connect(&mut self) -> ScanResult<()> {
        match self.state {
            SessionState::Disconnected => {}
            SessionState::Closed => return Err(ScanError::SessionClosed),
            _ => return Ok(()),
        }

        self.device
            .init()
            .and_then(|_| self.device.set_settings_location())
            .and_then(|_| self.device.connect_any())
            .map_err(|err| ScanError::DeviceUnavailable(err.message))?;

        self.state = SessionState::Connected;
        self.logger.record("Sensor connected.");
        Ok(())
    }

    /// Applies profile, filter and arena. Safe to repeat before every start.
    pub fn configure(
        &mut self,
        profile: Profile,
        filter: Filter,
        bounds: ArenaBounds,
    ) -> ScanResult<()> {
        if !matches!(
            self.state,
            SessionState::Connected | SessionState::Configured
        ) {
            return Err(self.invalid("configure"));
        }
        bounds.validate()?;

        self.device
            .set_profile(profile)
            .map_err(ScanError::command("set_profile"))?;
        self.device
            .set_dynamic_filter(filter)
            .map_err(ScanError::command("set_dynamic_filter"))?;
        for (axis, axis_bounds) in bounds.axes() {
            self.device
                .set_arena(axis, axis_bounds.min, axis_bounds.max, axis_bounds.res)
                .map_err(ScanError::command("set_arena"))?;
        }

        self.profile = profile;
        self.filter = filter;
        self.bounds = bounds;
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Starts the device and blocks on calibration until it finishes.
    ///
    /// `on_progress` sees the progress reported after every calibration
    /// trigger. More than `max_iterations` triggers is a
    /// [`ScanError::CalibrationTimeout`]. On failure the device is stopped and
    /// the session stays `Configured`. Returns the number of triggers used.
    pub fn calibrate<F>(&mut self, max_iterations: usize, mut on_progress: F) -> ScanResult<usize>
    where
        F: FnMut(f64),
    {
        if self.state != SessionState::Configured {
            return Err(self.invalid("calibrate"));
        }

        self.state = SessionState::Calibrating;
        match self.run_calibration(max_iterations, &mut on_progress) {
            Ok(iterations) => {
                self.state = SessionState::Scanning;
                Ok(iterations)
            }
            Err(err) => {
                if let Err(stop_err) = self.device.stop() {
                    self.logger
                        .warn(&format!("Stop after failed calibration: {}", stop_err));
                }
                self.state = SessionState::Configured;
                Err(err)
            }
        }
    }

    fn run_calibration(
        &mut self,
        max_iterations: usize,
        on_progress: &mut dyn FnMut(f64),
    ) -> ScanResult<usize> {
        self.device.start().map_err(ScanError::command("start"))?;
        self.device
            .start_calibration()
            .map_err(ScanError::command("start_calibration"))?;

        let mut status = self
            .device
            .get_status()
            .map_err(ScanError::command("get_status"))?;
        let mut iterations = 0;
        while status.is_calibrating() {
            if iterations >= max_iterations {
                return Err(ScanError::CalibrationTimeout { iterations });
            }
            self.device
                .trigger()
                .map_err(ScanError::command("trigger"))?;
            status = self
                .device
                .get_status()
                .map_err(ScanError::command("get_status"))?;
            iterations += 1;
            on_progress(status.progress);
            self.logger
                .record(&format!("Calibrating... {:.0}%", status.progress));
        }
        Ok(iterations)
    }

    /// Triggers one measurement and fetches the requested data.
    pub fn poll_once(&mut self, kind: FetchKind) -> ScanResult<ScanFrame> {
        if !self.scanning() {
            return Err(self.invalid("poll"));
        }

        self.device
            .trigger()
            .map_err(ScanError::command("trigger"))?;
        match kind {
            FetchKind::Targets => self
                .device
                .get_targets(self.profile)
                .map(ScanFrame::Targets)
                .map_err(ScanError::command("get_targets")),
            FetchKind::RawSlice => self
                .device
                .get_raw_slice()
                .map(ScanFrame::Raw)
                .map_err(ScanError::command("get_raw_slice")),
        }
    }

    /// Stops scanning. The state always leaves `Scanning`, even when the
    /// device rejects the stop. Returns whether anything was stopped.
    pub fn stop(&mut self) -> bool {
        if !self.scanning() {
            return false;
        }
        self.state = SessionState::Connected;
        if let Err(err) = self.device.stop() {
            self.logger.error(&format!("Error stopping: {}", err));
        }
        self.logger.record("Stopped scanning.");
        true
    }

    /// Best-effort release of the device at shutdown.
    pub fn disconnect(&mut self) {
        if self.scanning() {
            self.stop();
        }
        if self.connected() {
            if let Err(err) = self.device.disconnect() {
                self.logger.warn(&format!("Disconnect failed: {}", err));
            }
        }
        self.state = SessionState::Closed;
    }

    fn invalid(&self, operation: &'static str) -> ScanError {
        ScanError::InvalidState {
            operation,
            state: self.state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::AxisBounds;
    use crate::device::ScriptedDevice;

    fn session(device: ScriptedDevice) -> ScanSession<ScriptedDevice> {
        ScanSession::new(device, LogManager::new())
    }

    fn scanning_session(device: ScriptedDevice) -> ScanSession<ScriptedDevice> {
        let mut session = session(device);
        session.connect().unwrap();
        session
            .configure(Profile::Sensor, Filter::Mti, Profile::Sensor.defaults())
            .unwrap();
        session.calibrate(10, |_| {}).unwrap();
        session
    }

    #[test]
    fn connect_failure_stays_disconnected() {
        let mut device = ScriptedDevice::new();
        device.fail_on("connect_any", "no device found");
        let mut session = session(device);

        let err = session.connect().unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable(ref m) if m == "no device found"));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.connected());
    }

    #[test]
    fn configure_applies_profile_filter_and_three_axes() {
        let mut session = session(ScriptedDevice::new());
        session.connect().unwrap();
        session
            .configure(
                Profile::ShortRangeImaging,
                Filter::Derivative,
                Profile::ShortRangeImaging.defaults(),
            )
            .unwrap();

        let calls = session.device().calls();
        assert!(calls.contains(&"set_profile(PROF_SHORT_RANGE_IMAGING)".to_string()));
        assert!(calls.contains(&"set_dynamic_filter(FILTER_TYPE_DERIVATIVE)".to_string()));
        assert!(calls.contains(&"set_arena(z, 1, 10, 0.5)".to_string()));
        assert_eq!(session.device().count("set_arena"), 3);
        assert_eq!(session.state(), SessionState::Configured);

        session
            .configure(Profile::Sensor, Filter::None, Profile::Sensor.defaults())
            .unwrap();
        assert_eq!(session.profile(), Profile::Sensor);
    }

    #[test]
    fn configure_rejects_invalid_arena_before_touching_device() {
        let mut session = session(ScriptedDevice::new());
        session.connect().unwrap();
        let mut bounds = Profile::Sensor.defaults();
        bounds.x = AxisBounds::new(5.0, -5.0, 1.0);

        let err = session
            .configure(Profile::Sensor, Filter::Mti, bounds)
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidArena(_)));
        assert_eq!(session.device().count("set_profile"), 0);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn configure_requires_connection() {
        let mut session = session(ScriptedDevice::new());
        let err = session
            .configure(Profile::Sensor, Filter::Mti, Profile::Sensor.defaults())
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidState { operation: "configure", .. }));
    }

    #[test]
    fn calibration_loops_until_progress_reaches_hundred() {
        let device = ScriptedDevice::new().with_calibration(&[0.0, 40.0, 80.0, 100.0]);
        let mut session = session(device);
        session.connect().unwrap();
        session
            .configure(Profile::Sensor, Filter::Mti, Profile::Sensor.defaults())
            .unwrap();

        let mut seen = Vec::new();
        let iterations = session.calibrate(10, |p| seen.push(p)).unwrap();

        assert_eq!(iterations, 3);
        assert_eq!(seen, vec![40.0, 80.0, 100.0]);
        assert_eq!(session.device().count("trigger"), 3);
        assert!(session.scanning());
    }

    #[test]
    fn calibration_timeout_returns_to_configured() {
        let device = ScriptedDevice::new().with_calibration(&[0.0; 50]);
        let mut session = session(device);
        session.connect().unwrap();
        session
            .configure(Profile::Sensor, Filter::Mti, Profile::Sensor.defaults())
            .unwrap();

        let err = session.calibrate(5, |_| {}).unwrap_err();
        assert!(matches!(err, ScanError::CalibrationTimeout { iterations: 5 }));
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(session.device().count("stop"), 1);
    }

    #[test]
    fn poll_once_fetches_profile_targets() {
        let mut device = ScriptedDevice::new();
        device.push_targets(vec![Target::new(1.0, 2.0, 3.0)]);
        let mut session = scanning_session(device);

        let frame = session.poll_once(FetchKind::Targets).unwrap();
        assert_eq!(frame, ScanFrame::Targets(vec![Target::new(1.0, 2.0, 3.0)]));
        assert!(session
            .device()
            .calls()
            .contains(&"get_targets(PROF_SENSOR)".to_string()));
    }

    #[test]
    fn poll_once_requires_scanning() {
        let mut session = session(ScriptedDevice::new());
        assert!(session.poll_once(FetchKind::RawSlice).is_err());
    }

    #[test]
    fn stop_always_leaves_scanning_and_is_idempotent() {
        let mut device = ScriptedDevice::new();
        device.fail_on("stop", "bus error");
        let mut session = scanning_session(device);

        assert!(session.stop());
        assert_eq!(session.state(), SessionState::Connected);
        assert!(!session.stop());
        assert_eq!(session.device().count("stop"), 1);
    }

    #[test]
    fn disconnect_is_terminal() {
        let mut device = ScriptedDevice::new();
        device.fail_on("disconnect", "already gone");
        let mut session = scanning_session(device);

        session.disconnect();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.connect(), Err(ScanError::SessionClosed)));
    }
}
