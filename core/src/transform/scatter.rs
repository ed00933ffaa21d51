use crate::arena::{ArenaBounds, AxisBounds};
use crate::device::Target;
use crate::render::scene::{AxisRange, ScatterScene};

pub const SCATTER_TITLE: &str = "3D (x,y,z)";

fn range(axis: &AxisBounds) -> AxisRange {
    AxisRange {
        min: axis.min,
        max: axis.max,
    }
}

/// Axis ranges follow the arena; points pass through untouched, so targets
/// outside the arena plot outside the nominal box.
pub fn scatter_scene(targets: &[Target], bounds: &ArenaBounds) -> ScatterScene {
    ScatterScene {
        title: SCATTER_TITLE.to_string(),
        x_range: range(&bounds.x),
        y_range: range(&bounds.y),
        z_range: range(&bounds.z),
        points: targets
            .iter()
            .map(|t| [t.x_pos_cm, t.y_pos_cm, t.z_pos_cm])
            .collect(),
    }
}
