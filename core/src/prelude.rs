use crate::device::DeviceError;

/// Common error type for session, configuration and scheduling operations.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("device command `{command}` failed: {source}")]
    DeviceCommand {
        command: &'static str,
        #[source]
        source: DeviceError,
    },
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
    #[error("unknown visualization mode: {0}")]
    UnknownMode(String),
    #[error("invalid arena: {0}")]
    InvalidArena(String),
    #[error("calibration did not finish after {iterations} triggers")]
    CalibrationTimeout { iterations: usize },
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
    #[error("session closed; reconnecting is not supported")]
    SessionClosed,
    #[error("scanning needs a tokio runtime to schedule polling")]
    NoRuntime,
}

impl ScanError {
    pub(crate) fn command(command: &'static str) -> impl FnOnce(DeviceError) -> ScanError {
        move |source| ScanError::DeviceCommand { command, source }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
