use crate::generator::sensor::SensorConfig;
use anyhow::Context;
use arcscancore::arena::{ArenaBounds, Filter, Profile};
use arcscancore::controller::{ControllerOptions, DEFAULT_CALIBRATION_LIMIT};
use arcscancore::render::{Viewport, VisualizationMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

/// One simulated scan run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub profile: Profile,
    pub filter: Filter,
    pub mode: VisualizationMode,
    /// Overrides the profile's default arena when set.
    pub bounds: Option<ArenaBounds>,
    /// Poll cycles (successful or not) to run before shutting down.
    pub cycles: usize,
    pub interval_ms: u64,
    pub calibration_limit: usize,
    pub viewport: ViewportConfig,
    pub sensor: SensorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            filter: Filter::default(),
            mode: VisualizationMode::default(),
            bounds: None,
            cycles: 20,
            interval_ms: 100,
            calibration_limit: DEFAULT_CALIBRATION_LIMIT,
            viewport: ViewportConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scan config {}", path_ref.display()))?;
        let config: ScanConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scan config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        profile: &str,
        filter: &str,
        mode: &str,
        cycles: usize,
        interval_ms: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            profile: profile.parse().context("parsing --profile")?,
            filter: filter.parse().context("parsing --filter")?,
            mode: mode.parse().context("parsing --mode")?,
            cycles,
            interval_ms,
            ..Self::default()
        })
    }

    pub fn arena(&self) -> ArenaBounds {
        self.bounds.unwrap_or_else(|| self.profile.defaults())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            poll_interval: Duration::from_millis(self.interval_ms),
            calibration_max_iterations: self.calibration_limit,
        }
    }
}
