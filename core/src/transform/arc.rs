use crate::arena::ArenaBounds;
use crate::device::Target;
use crate::math::polar::PolarHelper;
use crate::render::scene::{ArcPrimitive, ArcScene, Point, Rgb, Viewport};

/// Slices used to approximate the filled half-disc.
pub const WEDGE_SLICES: usize = 100;
/// Angular divisions for the radial guide lines; both edges get a spoke.
pub const GUIDE_DIVISIONS: usize = 6;
pub const MARKER_RADIUS_PX: f64 = 10.0;
const BOTTOM_MARGIN_PX: f64 = 10.0;
const RADIUS_FILL: f64 = 0.9;
const GUIDE_WIDTH_PX: f64 = 2.0;

/// Pixel anchor of the half-disc inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: Point,
    pub radius_px: f64,
}

impl ArcGeometry {
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            center: Point::new(viewport.width / 2.0, viewport.height - BOTTOM_MARGIN_PX),
            radius_px: viewport.width.min(viewport.height) * RADIUS_FILL / 2.0,
        }
    }
}

/// Polar placement of one target before it is turned into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPlacement {
    pub angle_deg: f64,
    pub radius_fraction: f64,
}

/// Angle from x and radius fraction from clamped z.
///
/// Empty spans are divided by one instead of zero, so degenerate arenas still
/// give a deterministic placement.
pub fn place_target(target: &Target, bounds: &ArenaBounds) -> ArcPlacement {
    let frac_x = (target.x_pos_cm - bounds.x.min) / bounds.x.span_or_unit();
    let z = bounds.z.clamp(target.z_pos_cm);
    let frac_z = ((z - bounds.z.min) / bounds.z.span_or_unit()).clamp(0.0, 1.0);
    ArcPlacement {
        angle_deg: PolarHelper::half_turn_angle(frac_x),
        radius_fraction: frac_z,
    }
}

/// Builds the complete arc view: background wedge, guides, then one marker
/// and 1-based label per target.
pub fn arc_scene(targets: &[Target], bounds: &ArenaBounds, viewport: Viewport) -> ArcScene {
    let geometry = ArcGeometry::for_viewport(viewport);
    let mut primitives =
        Vec::with_capacity(1 + WEDGE_SLICES + GUIDE_DIVISIONS + 1 + 2 * targets.len());
    primitives.push(ArcPrimitive::Clear {
        background: Rgb::BLACK,
    });
    push_background(&mut primitives, &geometry);

    for (index, target) in targets.iter().enumerate() {
        let placement = place_target(target, bounds);
        let center = PolarHelper::to_screen(
            geometry.center,
            geometry.radius_px * placement.radius_fraction,
            placement.angle_deg,
        );
        primitives.push(ArcPrimitive::Marker {
            center,
            radius: MARKER_RADIUS_PX,
            fill: Rgb::RED,
            outline: Rgb::BLACK,
        });
        primitives.push(ArcPrimitive::Label {
            at: center,
            text: (index + 1).to_string(),
            color: Rgb::BLACK,
            bold: true,
        });
    }

    ArcScene { primitives }
}

fn push_background(primitives: &mut Vec<ArcPrimitive>, geometry: &ArcGeometry) {
    for slice in 0..WEDGE_SLICES {
        let start = PolarHelper::half_turn_angle(slice as f64 / WEDGE_SLICES as f64);
        let end = PolarHelper::half_turn_angle((slice + 1) as f64 / WEDGE_SLICES as f64);
        primitives.push(ArcPrimitive::FillPolygon {
            points: vec![
                geometry.center,
                PolarHelper::to_screen(geometry.center, geometry.radius_px, start),
                PolarHelper::to_screen(geometry.center, geometry.radius_px, end),
            ],
            fill: Rgb::GREEN,
        });
    }

    for division in 0..=GUIDE_DIVISIONS {
        let angle = PolarHelper::half_turn_angle(division as f64 / GUIDE_DIVISIONS as f64);
        primitives.push(ArcPrimitive::Line {
            from: geometry.center,
            to: PolarHelper::to_screen(geometry.center, geometry.radius_px, angle),
            color: Rgb::BLACK,
            width: GUIDE_WIDTH_PX,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{AxisBounds, Profile};

    const EPS: f64 = 1e-9;

    fn sensor_bounds() -> ArenaBounds {
        Profile::Sensor.defaults()
    }

    #[test]
    fn centered_target_sits_straight_up_at_half_radius() {
        let placement = place_target(&Target::new(0.0, 0.0, 10.5), &sensor_bounds());
        assert!((placement.angle_deg - 90.0).abs() < EPS);
        assert!((placement.radius_fraction - 0.5).abs() < EPS);
    }

    #[test]
    fn angle_decreases_across_the_x_span() {
        let bounds = sensor_bounds();
        let mut previous = f64::INFINITY;
        for step in 0..=40 {
            let x = -10.0 + step as f64 * 0.5;
            let angle = place_target(&Target::new(x, 0.0, 5.0), &bounds).angle_deg;
            assert!((0.0..=180.0).contains(&angle), "angle {} out of range", angle);
            assert!(angle < previous);
            previous = angle;
        }
        assert!(previous.abs() < EPS);
    }

    #[test]
    fn radius_fraction_is_clamped_for_out_of_range_depth() {
        let bounds = sensor_bounds();
        for z in [-100.0, 0.0, 1.0, 7.3, 20.0, 55.0, 1e9] {
            let frac = place_target(&Target::new(0.0, 0.0, z), &bounds).radius_fraction;
            assert!((0.0..=1.0).contains(&frac), "z {} gave {}", z, frac);
        }
        assert_eq!(
            place_target(&Target::new(0.0, 0.0, 99.0), &bounds).radius_fraction,
            1.0
        );
    }

    #[test]
    fn degenerate_spans_fall_back_to_unit_denominator() {
        let bounds = ArenaBounds {
            x: AxisBounds::new(2.0, 2.0, 1.0),
            y: AxisBounds::new(-1.0, 1.0, 1.0),
            z: AxisBounds::new(4.0, 4.0, 1.0),
        };
        let first = place_target(&Target::new(2.0, 0.0, 9.0), &bounds);
        let second = place_target(&Target::new(2.0, 0.0, 9.0), &bounds);
        assert_eq!(first, second);
        assert!(first.angle_deg.is_finite());
        assert_eq!(first.angle_deg, 180.0);
        assert_eq!(first.radius_fraction, 0.0);
    }

    #[test]
    fn geometry_is_anchored_bottom_center() {
        let geometry = ArcGeometry::for_viewport(Viewport::new(400.0, 300.0));
        assert_eq!(geometry.center, Point::new(200.0, 290.0));
        assert!((geometry.radius_px - 135.0).abs() < EPS);
    }

    #[test]
    fn scene_contains_background_and_labelled_markers() {
        let targets = [Target::new(0.0, 0.0, 10.5), Target::new(-10.0, 0.0, 20.0)];
        let scene = arc_scene(&targets, &sensor_bounds(), Viewport::new(400.0, 300.0));

        assert_eq!(
            scene.primitives[0],
            ArcPrimitive::Clear {
                background: Rgb::BLACK
            }
        );
        let wedges = scene
            .primitives
            .iter()
            .filter(|p| matches!(p, ArcPrimitive::FillPolygon { .. }))
            .count();
        let guides = scene
            .primitives
            .iter()
            .filter(|p| matches!(p, ArcPrimitive::Line { .. }))
            .count();
        assert_eq!(wedges, WEDGE_SLICES);
        assert_eq!(guides, GUIDE_DIVISIONS + 1);

        let markers: Vec<_> = scene.markers().collect();
        assert_eq!(markers.len(), 2);
        if let ArcPrimitive::Marker { center, radius, .. } = markers[0] {
            // 90 degrees at half of the 135 px radius, straight above the anchor.
            assert!((center.x - 200.0).abs() < 1e-6);
            assert!((center.y - (290.0 - 67.5)).abs() < 1e-6);
            assert_eq!(*radius, MARKER_RADIUS_PX);
        } else {
            panic!("expected a marker");
        }
        if let ArcPrimitive::Marker { center, .. } = markers[1] {
            // x at xMin lands on the left edge of the arc.
            assert!((center.x - 65.0).abs() < 1e-6);
            assert!((center.y - 290.0).abs() < 1e-6);
        }

        let labels: Vec<_> = scene
            .primitives
            .iter()
            .filter_map(|p| match p {
                ArcPrimitive::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["1", "2"]);
    }
}
