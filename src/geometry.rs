//! Small 2D helpers shared by the selection controller, the scene layers and
//! the zoom controller.

use glam::DVec2;

use crate::types::Dimensions;

/// Angle in degrees swept from `from` to `to`, in `[0, 360)`.
///
/// A negative cross product means the sweep goes the long way round, so the
/// reflex angle is returned. Parallel vectors give exactly 0 and degenerate
/// (zero length) vectors yield 0.
pub fn get_angle(from: DVec2, to: DVec2) -> f64 {
    if from.length() * to.length() <= f64::EPSILON {
        return 0.0;
    }
    let signed = from.perp_dot(to).atan2(from.dot(to));
    normalize_degrees(signed.to_degrees())
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotate a vector by `angle` radians
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(v)
}

/// Largest size with the design's aspect ratio that fits in `available`
/// after removing `padding` from every side.
pub fn compute_view_size(available: Dimensions, design: Dimensions, padding: f64) -> Dimensions {
    let room = DVec2::new(
        (available.width - padding * 2.0).max(1.0),
        (available.height - padding * 2.0).max(1.0),
    );
    if design.width <= 0.0 || design.height <= 0.0 {
        return Dimensions::from(room);
    }
    let ratio = (room.x / design.width).min(room.y / design.height);
    Dimensions::new(design.width * ratio, design.height * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_get_angle_quarter_turns() {
        let right = DVec2::new(1.0, 0.0);
        let down = DVec2::new(0.0, 1.0);
        assert!((get_angle(right, down) - 90.0).abs() < EPS);
        // clockwise the other way round is the reflex angle
        assert!((get_angle(down, right) - 270.0).abs() < EPS);
        assert!((get_angle(right, -right) - 180.0).abs() < EPS);
    }

    #[test]
    fn test_get_angle_ignores_vector_length() {
        let a = DVec2::new(3.0, 0.0);
        let b = DVec2::new(10.0, 10.0);
        assert!((get_angle(a, b) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_get_angle_degenerate_vectors() {
        assert_eq!(get_angle(DVec2::ZERO, DVec2::new(1.0, 0.0)), 0.0);
        assert_eq!(get_angle(DVec2::new(1.0, 1.0), DVec2::ZERO), 0.0);
        assert_eq!(get_angle(DVec2::new(2.0, 2.0), DVec2::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert!(normalize_degrees(-1e-15) < 360.0);
    }

    #[test]
    fn test_compute_view_size_keeps_aspect_ratio() {
        let view = compute_view_size(
            Dimensions::new(780.0, 580.0),
            Dimensions::new(1080.0, 720.0),
            40.0,
        );
        // room is 700x500, width is the limiting side
        assert!((view.width - 700.0).abs() < EPS);
        assert!((view.height - 700.0 * 720.0 / 1080.0).abs() < EPS);
    }

    #[test]
    fn test_compute_view_size_tall_design() {
        let view = compute_view_size(
            Dimensions::new(500.0, 500.0),
            Dimensions::new(100.0, 400.0),
            0.0,
        );
        assert!((view.height - 500.0).abs() < EPS);
        assert!((view.width - 125.0).abs() < EPS);
    }
}
