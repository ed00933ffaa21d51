//! Pure mappings from sensor data plus arena bounds to drawable scenes.

pub mod arc;
pub mod raw;
pub mod scatter;

pub use arc::{arc_scene, place_target, ArcGeometry, ArcPlacement};
pub use raw::raw_scene;
pub use scatter::scatter_scene;
