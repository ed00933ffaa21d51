pub mod scripted;
pub mod sdk;
pub mod session;

pub use scripted::ScriptedDevice;
pub use sdk::{
    DeviceError, DeviceResult, DeviceState, DeviceStatus, RawSlice, SensorDevice, Target,
};
pub use session::{FetchKind, ScanFrame, ScanSession, SessionState};
