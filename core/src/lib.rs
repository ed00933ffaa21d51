//! Core of the arcscan target viewer.
//!
//! Drives a single ranging-sensor session (connect, configure, calibrate,
//! poll) and turns each cycle's targets or raw amplitude slice into drawable
//! scenes for one of three views: a polar arc, a 3D scatter and a raw
//! heatmap. Painting the scenes is left to whatever implements
//! [`render::RenderSurface`].

pub mod arena;
pub mod controller;
pub mod device;
pub mod math;
pub mod prelude;
pub mod render;
pub mod scheduler;
pub mod telemetry;
pub mod transform;

pub use controller::ScanController;
pub use prelude::{ScanError, ScanResult};
