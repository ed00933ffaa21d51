use crate::arena::bounds::{ArenaBounds, AxisBounds};
use crate::prelude::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor operating profile. Also decides which target query the device answers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    #[serde(rename = "PROF_SENSOR")]
    Sensor,
    #[serde(rename = "PROF_SHORT_RANGE_IMAGING")]
    ShortRangeImaging,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Sensor, Profile::ShortRangeImaging];

    pub fn wire_name(self) -> &'static str {
        match self {
            Profile::Sensor => "PROF_SENSOR",
            Profile::ShortRangeImaging => "PROF_SHORT_RANGE_IMAGING",
        }
    }

    /// Factory arena for the profile.
    pub fn defaults(self) -> ArenaBounds {
        match self {
            Profile::Sensor => ArenaBounds {
                x: AxisBounds::new(-10.0, 10.0, 1.0),
                y: AxisBounds::new(-10.0, 10.0, 1.0),
                z: AxisBounds::new(1.0, 20.0, 1.0),
            },
            Profile::ShortRangeImaging => ArenaBounds {
                x: AxisBounds::new(-5.0, 5.0, 0.5),
                y: AxisBounds::new(-5.0, 5.0, 0.5),
                z: AxisBounds::new(1.0, 10.0, 0.5),
            },
        }
    }
}

impl FromStr for Profile {
    type Err = ScanError;

    fn from_str(s: &str) -> ScanResult<Self> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.wire_name() == s)
            .ok_or_else(|| ScanError::UnknownProfile(s.to_string()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Dynamic image filter applied by the device between frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Filter {
    #[serde(rename = "FILTER_TYPE_NONE")]
    None,
    /// Moving-target indicator; the operator panel preselects it.
    #[default]
    #[serde(rename = "FILTER_TYPE_MTI")]
    Mti,
    #[serde(rename = "FILTER_TYPE_DERIVATIVE")]
    Derivative,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::None, Filter::Mti, Filter::Derivative];

    pub fn wire_name(self) -> &'static str {
        match self {
            Filter::None => "FILTER_TYPE_NONE",
            Filter::Mti => "FILTER_TYPE_MTI",
            Filter::Derivative => "FILTER_TYPE_DERIVATIVE",
        }
    }
}

impl FromStr for Filter {
    type Err = ScanError;

    fn from_str(s: &str) -> ScanResult<Self> {
        Filter::ALL
            .into_iter()
            .find(|filter| filter.wire_name() == s)
            .ok_or_else(|| ScanError::UnknownFilter(s.to_string()))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
