use crate::device::RawSlice;
use crate::math::stats::StatsHelper;
use crate::render::scene::RawScene;
use log::debug;
use ndarray::Array2;

pub const RAW_TITLE: &str = "Raw Image Slice (2D Heatmap)";

/// Heatmap when the slice is a proper `rows x cols` grid, otherwise a line
/// plot of the flattened samples.
///
/// `cols` is taken from the first row. A ragged grid only falls back when its
/// total element count disagrees with `rows * cols`.
pub fn raw_scene(slice: &RawSlice) -> RawScene {
    let flat: Vec<f32> = slice.grid.iter().flatten().copied().collect();
    let rows = slice.grid.len();
    let cols = slice.grid.first().map(Vec::len).unwrap_or(0);

    if rows > 0 && cols > 0 && rows * cols == flat.len() {
        let (min, max) = StatsHelper::min_max(&flat).unwrap_or((0.0, 0.0));
        if let Ok(data) = Array2::from_shape_vec((rows, cols), flat.clone()) {
            return RawScene::Grid {
                title: RAW_TITLE.to_string(),
                data,
                min,
                max,
            };
        }
    }

    debug!(
        "raw slice {}x{} with {} samples drawn as a line",
        rows,
        cols,
        flat.len()
    );
    RawScene::Line {
        title: RAW_TITLE.to_string(),
        samples: flat,
    }
}
