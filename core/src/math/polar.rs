use crate::render::scene::Point;

pub struct PolarHelper;

impl PolarHelper {
    /// Screen point at `radius` pixels from `center` along `angle_deg`,
    /// measured counter-clockwise from the positive x axis. Screen y grows
    /// downward, so the sine term is subtracted.
    pub fn to_screen(center: Point, radius: f64, angle_deg: f64) -> Point {
        let angle = angle_deg.to_radians();
        Point::new(
            center.x + radius * angle.cos(),
            center.y - radius * angle.sin(),
        )
    }

    /// Maps `fraction` of a half turn onto degrees, 0 -> 180 and 1 -> 0.
    pub fn half_turn_angle(fraction: f64) -> f64 {
        180.0 * (1.0 - fraction)
    }
}
