use crate::arena::{Axis, Filter, Profile};
use serde::{Deserialize, Serialize};

/// Error raised by the sensor SDK on any failed call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// One reflection reported by the sensor for a single trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x_pos_cm: f64,
    pub y_pos_cm: f64,
    pub z_pos_cm: f64,
    /// Carried through from the SDK; none of the views use it.
    pub amplitude: f64,
}

impl Target {
    pub fn new(x_pos_cm: f64, y_pos_cm: f64, z_pos_cm: f64) -> Self {
        Self {
            x_pos_cm,
            y_pos_cm,
            z_pos_cm,
            amplitude: 0.0,
        }
    }
}

/// Device-side status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Disconnected,
    Connected,
    Scanning,
    Calibrating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub state: DeviceState,
    /// Calibration progress in percent.
    pub progress: f64,
}

impl DeviceStatus {
    pub fn new(state: DeviceState, progress: f64) -> Self {
        Self { state, progress }
    }

    /// True while the device still needs calibration triggers.
    pub fn is_calibrating(&self) -> bool {
        self.state == DeviceState::Calibrating && self.progress < 100.0
    }
}

/// Raw amplitude slice at a fixed depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSlice {
    /// Row-major intensities. Rows are expected to share a length but the
    /// device does not guarantee it.
    pub grid: Vec<Vec<f32>>,
    pub size_x: usize,
    pub size_y: usize,
    pub slice_depth: f64,
    pub power: f64,
}

impl RawSlice {
    pub fn from_grid(grid: Vec<Vec<f32>>) -> Self {
        let size_x = grid.len();
        let size_y = grid.first().map(Vec::len).unwrap_or(0);
        Self {
            grid,
            size_x,
            size_y,
            slice_depth: 0.0,
            power: 0.0,
        }
    }
}

/// Call contract of the ranging-sensor SDK.
///
/// Implementations wrap the vendor library; tests use
/// [`ScriptedDevice`](crate::device::ScriptedDevice).
pub trait SensorDevice {
    fn init(&mut self) -> DeviceResult<()>;
    fn set_settings_location(&mut self) -> DeviceResult<()>;
    fn connect_any(&mut self) -> DeviceResult<()>;
    fn set_profile(&mut self, profile: Profile) -> DeviceResult<()>;
    fn set_dynamic_filter(&mut self, filter: Filter) -> DeviceResult<()>;
    fn set_arena(&mut self, axis: Axis, min: f64, max: f64, res: f64) -> DeviceResult<()>;
    fn start(&mut self) -> DeviceResult<()>;
    fn start_calibration(&mut self) -> DeviceResult<()>;
    fn get_status(&mut self) -> DeviceResult<DeviceStatus>;
    fn trigger(&mut self) -> DeviceResult<()>;
    /// Sensor and imaging profiles answer different target queries.
    fn get_targets(&mut self, profile: Profile) -> DeviceResult<Vec<Target>>;
    fn get_raw_slice(&mut self) -> DeviceResult<RawSlice>;
    fn stop(&mut self) -> DeviceResult<()>;
    fn disconnect(&mut self) -> DeviceResult<()>;
}
