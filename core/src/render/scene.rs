use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Pixel coordinate on a drawing surface, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawable size of a surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
}

/// Draw call for the arc view, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArcPrimitive {
    /// Wipe everything and paint the background.
    Clear { background: Rgb },
    FillPolygon { points: Vec<Point>, fill: Rgb },
    Line {
        from: Point,
        to: Point,
        color: Rgb,
        width: f64,
    },
    Marker {
        center: Point,
        radius: f64,
        fill: Rgb,
        outline: Rgb,
    },
    Label {
        at: Point,
        text: String,
        color: Rgb,
        bold: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArcScene {
    pub primitives: Vec<ArcPrimitive>,
}

impl ArcScene {
    pub fn markers(&self) -> impl Iterator<Item = &ArcPrimitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, ArcPrimitive::Marker { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterScene {
    pub title: String,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub z_range: AxisRange,
    pub points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawScene {
    /// Heatmap image; `min`/`max` span the finite intensities for color scaling.
    Grid {
        title: String,
        data: Array2<f32>,
        min: f32,
        max: f32,
    },
    /// Fallback for grids whose shape does not add up.
    Line { title: String, samples: Vec<f32> },
}

/// Output of one transform, pushed to the surface of its mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scene {
    Arc(ArcScene),
    Scatter(ScatterScene),
    Raw(RawScene),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn raw_grid_scene_serializes_with_shape() {
        let scene = Scene::Raw(RawScene::Grid {
            title: "raw".into(),
            data: array![[1.0f32, 2.0], [3.0, 4.0]],
            min: 1.0,
            max: 4.0,
        });
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["Raw"]["Grid"]["data"]["dim"], serde_json::json!([2, 2]));

        let back: Scene = serde_json::from_value(json).unwrap();
        assert_eq!(back, scene);
    }
}
