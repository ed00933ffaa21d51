use crate::arena::{Axis, Filter, Profile};
use crate::device::sdk::{
    DeviceError, DeviceResult, DeviceState, DeviceStatus, RawSlice, SensorDevice, Target,
};
use std::collections::{HashMap, VecDeque};

/// In-memory sensor that replays scripted statuses and frames.
///
/// Every SDK call is appended to [`ScriptedDevice::calls`]; failures can be
/// injected per call name, either permanently or for the next N calls.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    calls: Vec<String>,
    statuses: VecDeque<DeviceStatus>,
    target_frames: VecDeque<Vec<Target>>,
    raw_frames: VecDeque<RawSlice>,
    failures: HashMap<&'static str, Failure>,
}

#[derive(Debug)]
struct Failure {
    error: DeviceError,
    remaining: Option<usize>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibration progress sequence; each value is one `get_status` answer.
    /// The last entry is followed by `Scanning` at 100%.
    pub fn with_calibration(mut self, progress: &[f64]) -> Self {
        self.statuses.extend(
            progress
                .iter()
                .map(|&p| DeviceStatus::new(DeviceState::Calibrating, p)),
        );
        self
    }

    pub fn push_targets(&mut self, targets: Vec<Target>) {
        self.target_frames.push_back(targets);
    }

    pub fn push_raw(&mut self, slice: RawSlice) {
        self.raw_frames.push_back(slice);
    }

    /// Makes every call named `call` fail.
    pub fn fail_on(&mut self, call: &'static str, message: &str) {
        self.failures.insert(
            call,
            Failure {
                error: DeviceError::new(message),
                remaining: None,
            },
        );
    }

    /// Makes the next `times` calls named `call` fail.
    pub fn fail_times(&mut self, call: &'static str, times: usize, message: &str) {
        self.failures.insert(
            call,
            Failure {
                error: DeviceError::new(message),
                remaining: Some(times),
            },
        );
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls
            .iter()
            .filter(|entry| entry.split('(').next() == Some(call))
            .count()
    }

    fn invoke(&mut self, call: &'static str, entry: String) -> DeviceResult<()> {
        self.calls.push(entry);
        let Some(failure) = self.failures.get_mut(call) else {
            return Ok(());
        };
        let error = failure.error.clone();
        match failure.remaining.as_mut() {
            None => Err(error),
            Some(0) => Ok(()),
            Some(left) => {
                *left -= 1;
                Err(error)
            }
        }
    }
}

impl SensorDevice for ScriptedDevice {
    fn init(&mut self) -> DeviceResult<()> {
        self.invoke("init", "init".into())
    }

    fn set_settings_location(&mut self) -> DeviceResult<()> {
        self.invoke("set_settings_location", "set_settings_location".into())
    }

    fn connect_any(&mut self) -> DeviceResult<()> {
        self.invoke("connect_any", "connect_any".into())
    }

    fn set_profile(&mut self, profile: Profile) -> DeviceResult<()> {
        self.invoke("set_profile", format!("set_profile({})", profile))
    }

    fn set_dynamic_filter(&mut self, filter: Filter) -> DeviceResult<()> {
        self.invoke("set_dynamic_filter", format!("set_dynamic_filter({})", filter))
    }

    fn set_arena(&mut self, axis: Axis, min: f64, max: f64, res: f64) -> DeviceResult<()> {
        self.invoke(
            "set_arena",
            format!("set_arena({}, {}, {}, {})", axis, min, max, res),
        )
    }

    fn start(&mut self) -> DeviceResult<()> {
        self.invoke("start", "start".into())
    }

    fn start_calibration(&mut self) -> DeviceResult<()> {
        self.invoke("start_calibration", "start_calibration".into())
    }

    fn get_status(&mut self) -> DeviceResult<DeviceStatus> {
        self.invoke("get_status", "get_status".into())?;
        Ok(self
            .statuses
            .pop_front()
            .unwrap_or(DeviceStatus::new(DeviceState::Scanning, 100.0)))
    }

    fn trigger(&mut self) -> DeviceResult<()> {
        self.invoke("trigger", "trigger".into())
    }

    fn get_targets(&mut self, profile: Profile) -> DeviceResult<Vec<Target>> {
        self.invoke("get_targets", format!("get_targets({})", profile))?;
        Ok(self.target_frames.pop_front().unwrap_or_default())
    }

    fn get_raw_slice(&mut self) -> DeviceResult<RawSlice> {
        self.invoke("get_raw_slice", "get_raw_slice".into())?;
        Ok(self
            .raw_frames
            .pop_front()
            .unwrap_or_else(|| RawSlice::from_grid(Vec::new())))
    }

    fn stop(&mut self) -> DeviceResult<()> {
        self.invoke("stop", "stop".into())
    }

    fn disconnect(&mut self) -> DeviceResult<()> {
        self.invoke("disconnect", "disconnect".into())
    }
}
