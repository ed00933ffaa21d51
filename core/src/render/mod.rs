pub mod dispatch;
pub mod scene;
pub mod surface;

pub use dispatch::{RenderDispatch, SurfaceSet, VisualizationMode};
pub use scene::{
    ArcPrimitive, ArcScene, AxisRange, Point, RawScene, Rgb, ScatterScene, Scene, Viewport,
};
pub use surface::{RecordingSurface, RenderSurface};
