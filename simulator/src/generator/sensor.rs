use arcscancore::arena::{ArenaBounds, Axis, AxisBounds, Filter, Profile};
use arcscancore::device::{
    DeviceError, DeviceResult, DeviceState, DeviceStatus, RawSlice, SensorDevice, Target,
};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MAX_RAW_BINS: usize = 64;

/// Behavior of the simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub targets: usize,
    pub seed: u64,
    /// Calibration progress gained per trigger, in percent.
    pub calibration_step: f64,
    /// Random-walk step of each target per trigger, in centimeters.
    pub drift_cm: f64,
    pub noise: f32,
    /// Probability that a trigger fails with a communication error.
    pub fault_rate: f64,
    /// Refuse `connect_any`, as when no sensor is plugged in.
    pub absent: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            targets: 3,
            seed: 0,
            calibration_step: 20.0,
            drift_cm: 0.4,
            noise: 0.05,
            fault_rate: 0.0,
            absent: false,
        }
    }
}

/// Ranging sensor simulated in process: targets wander inside the arena and
/// the raw slice shows a blob per target.
pub struct SimulatedDevice {
    config: SensorConfig,
    rng: StdRng,
    connected: bool,
    started: bool,
    calibration: Option<f64>,
    profile: Profile,
    filter: Filter,
    arena: ArenaBounds,
    targets: Vec<Target>,
}

impl SimulatedDevice {
    pub fn new(config: SensorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            connected: false,
            started: false,
            calibration: None,
            profile: Profile::default(),
            filter: Filter::default(),
            arena: ArenaBounds::default(),
            targets: Vec::new(),
        }
    }

    fn ensure_connected(&self) -> DeviceResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(DeviceError::new("sensor not connected"))
        }
    }

    fn ensure_started(&self) -> DeviceResult<()> {
        self.ensure_connected()?;
        if self.started {
            Ok(())
        } else {
            Err(DeviceError::new("sensor not started"))
        }
    }

    fn sample_axis(rng: &mut StdRng, axis: &AxisBounds) -> f64 {
        if axis.max > axis.min {
            rng.gen_range(axis.min..axis.max)
        } else {
            axis.min
        }
    }

    fn spawn_targets(&mut self) {
        let arena = self.arena;
        let rng = &mut self.rng;
        self.targets = (0..self.config.targets)
            .map(|_| Target {
                x_pos_cm: Self::sample_axis(rng, &arena.x),
                y_pos_cm: Self::sample_axis(rng, &arena.y),
                z_pos_cm: Self::sample_axis(rng, &arena.z),
                amplitude: rng.gen_range(0.2..1.0),
            })
            .collect();
    }

    fn drift_targets(&mut self) {
        let step = self.config.drift_cm;
        if step <= 0.0 {
            return;
        }
        let arena = self.arena;
        for target in &mut self.targets {
            target.x_pos_cm = arena.x.clamp(target.x_pos_cm + self.rng.gen_range(-step..step));
            target.y_pos_cm = arena.y.clamp(target.y_pos_cm + self.rng.gen_range(-step..step));
            target.z_pos_cm = arena.z.clamp(target.z_pos_cm + self.rng.gen_range(-step..step));
        }
    }

    fn bins(axis: &AxisBounds) -> usize {
        let bins = ((axis.max - axis.min) / axis.res).round();
        if bins.is_finite() && bins >= 1.0 {
            (bins as usize + 1).min(MAX_RAW_BINS)
        } else {
            1
        }
    }
}

impl SensorDevice for SimulatedDevice {
    fn init(&mut self) -> DeviceResult<()> {
        Ok(())
    }

    fn set_settings_location(&mut self) -> DeviceResult<()> {
        Ok(())
    }

    fn connect_any(&mut self) -> DeviceResult<()> {
        if self.config.absent {
            return Err(DeviceError::new("no sensor found on any port"));
        }
        self.connected = true;
        Ok(())
    }

    fn set_profile(&mut self, profile: Profile) -> DeviceResult<()> {
        self.ensure_connected()?;
        self.profile = profile;
        Ok(())
    }

    fn set_dynamic_filter(&mut self, filter: Filter) -> DeviceResult<()> {
        self.ensure_connected()?;
        self.filter = filter;
        Ok(())
    }

    fn set_arena(&mut self, axis: Axis, min: f64, max: f64, res: f64) -> DeviceResult<()> {
        self.ensure_connected()?;
        let bounds = AxisBounds::new(min, max, res);
        match axis {
            Axis::X => self.arena.x = bounds,
            Axis::Y => self.arena.y = bounds,
            Axis::Z => self.arena.z = bounds,
        }
        Ok(())
    }

    fn start(&mut self) -> DeviceResult<()> {
        self.ensure_connected()?;
        self.started = true;
        self.spawn_targets();
        debug!(
            "simulated sensor started: {} / {} with {} targets",
            self.profile,
            self.filter,
            self.targets.len()
        );
        Ok(())
    }

    fn start_calibration(&mut self) -> DeviceResult<()> {
        self.ensure_started()?;
        self.calibration = Some(0.0);
        Ok(())
    }

    fn get_status(&mut self) -> DeviceResult<DeviceStatus> {
        let status = match (self.connected, self.started, self.calibration) {
            (false, _, _) => DeviceStatus::new(DeviceState::Disconnected, 0.0),
            (true, false, _) => DeviceStatus::new(DeviceState::Connected, 0.0),
            (true, true, Some(progress)) if progress < 100.0 => {
                DeviceStatus::new(DeviceState::Calibrating, progress)
            }
            (true, true, _) => DeviceStatus::new(DeviceState::Scanning, 100.0),
        };
        Ok(status)
    }

    fn trigger(&mut self) -> DeviceResult<()> {
        self.ensure_started()?;
        if self.config.fault_rate > 0.0 && self.rng.gen_bool(self.config.fault_rate.min(1.0)) {
            return Err(DeviceError::new("simulated communication error"));
        }
        match self.calibration {
            Some(progress) if progress < 100.0 => {
                self.calibration = Some((progress + self.config.calibration_step).min(100.0));
            }
            _ => self.drift_targets(),
        }
        Ok(())
    }

    fn get_targets(&mut self, profile: Profile) -> DeviceResult<Vec<Target>> {
        self.ensure_started()?;
        if profile != self.profile {
            return Err(DeviceError::new(format!(
                "target query for {} while running {}",
                profile, self.profile
            )));
        }
        Ok(self.targets.clone())
    }

    fn get_raw_slice(&mut self) -> DeviceResult<RawSlice> {
        self.ensure_started()?;
        let arena = self.arena;
        let rows = Self::bins(&arena.x);
        let cols = Self::bins(&arena.z);
        let sigma = (arena.x.res.max(arena.z.res) * 1.5).max(f64::EPSILON);
        let noise = self.config.noise;

        let mut grid = Vec::with_capacity(rows);
        for row in 0..rows {
            let x = arena.x.min + row as f64 * arena.x.res;
            let mut line = Vec::with_capacity(cols);
            for col in 0..cols {
                let z = arena.z.min + col as f64 * arena.z.res;
                let echo: f64 = self
                    .targets
                    .iter()
                    .map(|t| {
                        let d2 = (t.x_pos_cm - x).powi(2) + (t.z_pos_cm - z).powi(2);
                        t.amplitude * (-d2 / (2.0 * sigma * sigma)).exp()
                    })
                    .sum();
                let jitter = if noise > 0.0 {
                    self.rng.gen_range(-noise..noise)
                } else {
                    0.0
                };
                line.push(echo as f32 + jitter);
            }
            grid.push(line);
        }

        let power: f64 = grid.iter().flatten().map(|v| (*v as f64).powi(2)).sum();
        Ok(RawSlice {
            grid,
            size_x: rows,
            size_y: cols,
            slice_depth: (arena.y.min + arena.y.max) / 2.0,
            power,
        })
    }

    fn stop(&mut self) -> DeviceResult<()> {
        self.ensure_connected()?;
        self.started = false;
        self.calibration = None;
        Ok(())
    }

    fn disconnect(&mut self) -> DeviceResult<()> {
        self.connected = false;
        self.started = false;
        Ok(())
    }
}
