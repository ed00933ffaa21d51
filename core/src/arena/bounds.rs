use crate::arena::profile::Profile;
use crate::prelude::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena axis as addressed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Span and sampling resolution of one arena axis, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
    pub res: f64,
}

impl AxisBounds {
    pub const fn new(min: f64, max: f64, res: f64) -> Self {
        Self { min, max, res }
    }

    /// `max - min`, with `1.0` substituted for an empty span.
    pub fn span_or_unit(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            1.0
        } else {
            span
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    fn validate(&self, axis: Axis) -> ScanResult<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.res.is_finite()) {
            return Err(ScanError::InvalidArena(format!(
                "{} bounds must be finite",
                axis
            )));
        }
        if self.min >= self.max {
            return Err(ScanError::InvalidArena(format!(
                "{} min {} must be below max {}",
                axis, self.min, self.max
            )));
        }
        if self.res <= 0.0 {
            return Err(ScanError::InvalidArena(format!(
                "{} resolution {} must be positive",
                axis, self.res
            )));
        }
        Ok(())
    }
}

/// The sensing volume: three axes with bounds and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub x: AxisBounds,
    pub y: AxisBounds,
    pub z: AxisBounds,
}

impl ArenaBounds {
    pub fn axis(&self, axis: Axis) -> &AxisBounds {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn axes(&self) -> [(Axis, AxisBounds); 3] {
        [(Axis::X, self.x), (Axis::Y, self.y), (Axis::Z, self.z)]
    }

    /// Rejects inverted or empty spans and non-positive resolutions.
    pub fn validate(&self) -> ScanResult<()> {
        for (axis, bounds) in self.axes() {
            bounds.validate(axis)?;
        }
        Ok(())
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Profile::default().defaults()
    }
}

/// Looks up the default arena for a profile by its wire name.
pub fn defaults_for(profile_id: &str) -> ScanResult<ArenaBounds> {
    let profile: Profile = profile_id.parse()?;
    Ok(profile.defaults())
}
