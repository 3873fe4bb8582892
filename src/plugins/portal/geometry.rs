//! Frame transforms and footprint interval math used by the portal placement code.
//!
//! Wall-local frames follow the Bevy convention: X is lateral, Y is vertical and +Z is the
//! surface normal.

use bevy::prelude::*;

/// Maximum distance along the surface normal for two footprints to be considered on the same
/// plane.
pub const COPLANAR_EPSILON: f32 = 0.01;

/// Express a world space point in the local basis of `frame`, ignoring the frame scale.
pub fn world_to_local_no_scale(frame: &Transform, point: Vec3) -> Vec3 {
    frame.rotation.inverse().mul_vec3(point - frame.translation)
}

/// Inverse of [`world_to_local_no_scale`].
pub fn local_to_world_no_scale(frame: &Transform, point: Vec3) -> Vec3 {
    frame.translation + frame.rotation.mul_vec3(point)
}

/// Clamp `value` to `[min, max]`.
///
/// An empty interval (`min > max`) collapses to its midpoint instead of panicking like
/// [`f32::clamp`] does.
pub fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        return (min + max) / 2.;
    }
    value.max(min).min(max)
}

/// Whether two wall-local rectangles overlap.
///
/// The lateral (X) and vertical (Y) intervals must overlap strictly, so rectangles that share an
/// edge do not overlap. The centers must also lie on the same plane along Z.
pub fn rectangles_overlap(
    center_a: Vec3,
    half_extents_a: Vec2,
    center_b: Vec3,
    half_extents_b: Vec2,
) -> bool {
    let delta = (center_a - center_b).abs();
    let reach = half_extents_a + half_extents_b;
    delta.x < reach.x && delta.y < reach.y && delta.z <= COPLANAR_EPSILON
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn local_round_trip_ignores_scale() {
        let frame = Transform {
            translation: Vec3::new(10., 20., -5.),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            scale: Vec3::splat(4.),
        };
        let local = world_to_local_no_scale(&frame, Vec3::new(10., 20., -15.));
        // The frame is turned a quarter turn, so world -Z is local -X, unscaled.
        assert!(local.abs_diff_eq(Vec3::new(-10., 0., 0.), 1e-4));
        let world = local_to_world_no_scale(&frame, local);
        assert!(world.abs_diff_eq(Vec3::new(10., 20., -15.), 1e-4));
    }

    #[test]
    fn clamp_axis_behaves_like_clamp() {
        assert_eq!(clamp_axis(5., 0., 10.), 5.);
        assert_eq!(clamp_axis(-5., 0., 10.), 0.);
        assert_eq!(clamp_axis(15., 0., 10.), 10.);
    }

    #[test]
    fn clamp_axis_on_empty_interval_is_midpoint() {
        assert_eq!(clamp_axis(60., 0., -40.), -20.);
        assert_eq!(clamp_axis(3., 0., 0.), 0.);
    }

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let half = Vec2::new(90., 124.5);
        let a = Vec3::new(-90., 0., 5.);
        let b = Vec3::new(90., 0., 5.);
        assert!(!rectangles_overlap(a, half, b, half));
        let b = Vec3::new(89.9, 0., 5.);
        assert!(rectangles_overlap(a, half, b, half));
    }

    #[test]
    fn overlap_requires_same_plane() {
        let half = Vec2::new(90., 124.5);
        let a = Vec3::new(0., 0., 5.);
        assert!(rectangles_overlap(a, half, Vec3::new(0., 0., 5.005), half));
        assert!(!rectangles_overlap(a, half, Vec3::new(0., 0., 5.5), half));
    }

    #[test]
    fn overlap_is_symmetric() {
        let half = Vec2::new(90., 124.5);
        let points = [
            Vec3::new(0., 0., 5.),
            Vec3::new(179., 10., 5.),
            Vec3::new(180., 0., 5.),
            Vec3::new(-50., 248., 5.),
            Vec3::new(-50., -249., 5.),
            Vec3::new(10., 10., 50.),
        ];
        for a in points {
            for b in points {
                assert_eq!(
                    rectangles_overlap(a, half, b, half),
                    rectangles_overlap(b, half, a, half)
                );
            }
        }
    }
}
