pub mod bounds;
pub mod profile;

pub use bounds::{defaults_for, ArenaBounds, Axis, AxisBounds};
pub use profile::{Filter, Profile};
