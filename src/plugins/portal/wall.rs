use bevy::{prelude::*, reflect::FromReflect};

use super::geometry::*;

/// Size of the area a portal occupies on a wall, lateral extent first.
pub const PORTAL_FOOTPRINT: Vec2 = Vec2::new(180., 249.);

/// Distance between the wall surface and a placed portal, along the wall normal.
pub const PORTAL_SURFACE_OFFSET: f32 = 5.;

#[derive(Debug, Clone, Component, Reflect, FromReflect)]
#[reflect(Component)]
/// A surface portals can be shot onto. The wall's local frame is the entity's global transform,
/// with the surface facing local +Z.
pub struct PortalWall {
    pub width: f32,
    pub height: f32,
}

impl Default for PortalWall {
    fn default() -> Self {
        PortalWall {
            width: 100.,
            height: 100.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Outcome of clamping a portal placement onto a wall.
pub struct ClampedPlacement {
    /// World transform of the portal, oriented like the wall.
    pub transform: Transform,
    /// Whether the placement would cover the linked portal. Portals must not be placed when set.
    pub overlaps_sibling: bool,
}

impl PortalWall {
    pub fn new(width: f32, height: f32) -> PortalWall {
        PortalWall { width, height }
    }

    /// Largest distance from the wall center a portal center may have on each axis. Never
    /// negative: walls smaller than the footprint pin portals to their center.
    pub fn clamp_bounds(&self) -> Vec2 {
        let extents = Vec2::new(self.width, self.height).max(Vec2::ZERO);
        ((extents - PORTAL_FOOTPRINT) / 2.).max(Vec2::ZERO)
    }

    /// Whether the wall is too small to fit a portal on at least one axis.
    pub fn is_degenerate(&self) -> bool {
        self.width <= PORTAL_FOOTPRINT.x || self.height <= PORTAL_FOOTPRINT.y
    }

    /// Move a candidate portal position inside the wall bounds and check it against the linked
    /// portal.
    ///
    /// `wall_frame` is the wall world transform (scale is ignored), `point` the world space
    /// candidate, usually a raycast impact, and `sibling` the world transform of the other
    /// portal, if any.
    pub fn clamp_portal_position(
        &self,
        wall_frame: &Transform,
        point: Vec3,
        sibling: Option<&Transform>,
    ) -> ClampedPlacement {
        let local = world_to_local_no_scale(wall_frame, point);
        let bounds = self.clamp_bounds();

        let clamped_local = Vec3::new(
            clamp_axis(local.x.abs(), 0., bounds.x).copysign(local.x),
            clamp_axis(local.y.abs(), 0., bounds.y).copysign(local.y),
            PORTAL_SURFACE_OFFSET,
        );

        let overlaps_sibling = sibling.map_or(false, |sibling| {
            let sibling_local = world_to_local_no_scale(wall_frame, sibling.translation);
            rectangles_overlap(
                sibling_local,
                PORTAL_FOOTPRINT / 2.,
                clamped_local,
                PORTAL_FOOTPRINT / 2.,
            )
        });

        ClampedPlacement {
            transform: Transform::from_translation(local_to_world_no_scale(
                wall_frame,
                clamped_local,
            ))
            .with_rotation(wall_frame.rotation),
            overlaps_sibling,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn turned_wall_frame() -> Transform {
        Transform::from_xyz(300., 150., -1000.).with_rotation(Quat::from_rotation_y(FRAC_PI_2))
    }

    #[test]
    fn default_wall_is_100_by_100() {
        let wall = PortalWall::default();
        assert_eq!(wall.width, 100.);
        assert_eq!(wall.height, 100.);
    }

    #[test]
    fn clamped_position_stays_within_bounds() {
        let wall = PortalWall::new(1000., 600.);
        let frame = turned_wall_frame();
        let bounds = wall.clamp_bounds();
        assert_eq!(bounds, Vec2::new(410., 175.5));

        for x in [-5000., -411., -10., 0., 3., 409., 2000.] {
            for y in [-900., -176., 0., 12., 175., 176., 10_000.] {
                let point = local_to_world_no_scale(&frame, Vec3::new(x, y, -37.));
                let placement = wall.clamp_portal_position(&frame, point, None);
                let local = world_to_local_no_scale(&frame, placement.transform.translation);
                assert!(local.x.abs() <= bounds.x + 1e-3, "x = {}", local.x);
                assert!(local.y.abs() <= bounds.y + 1e-3, "y = {}", local.y);
                assert!((local.z - PORTAL_SURFACE_OFFSET).abs() < 1e-3);
                assert!(!placement.overlaps_sibling);
            }
        }
    }

    #[test]
    fn placement_keeps_sign_and_wall_orientation() {
        let wall = PortalWall::new(1000., 600.);
        let frame = turned_wall_frame();
        let point = local_to_world_no_scale(&frame, Vec3::new(-800., 20., 0.));
        let placement = wall.clamp_portal_position(&frame, point, None);
        let local = world_to_local_no_scale(&frame, placement.transform.translation);
        assert!(local.abs_diff_eq(Vec3::new(-410., 20., PORTAL_SURFACE_OFFSET), 1e-3));
        assert_eq!(placement.transform.rotation, frame.rotation);
    }

    #[test]
    fn clamping_is_pure() {
        let wall = PortalWall::new(700., 500.);
        let frame = turned_wall_frame();
        let point = Vec3::new(310., 400., -1234.);
        assert_eq!(
            wall.clamp_portal_position(&frame, point, None),
            wall.clamp_portal_position(&frame, point, None)
        );
    }

    #[test]
    fn small_wall_pins_portal_to_center() {
        // Half width 50 minus half footprint 90 is negative, the bound is floored at zero.
        let wall = PortalWall::default();
        assert!(wall.is_degenerate());
        assert_eq!(wall.clamp_bounds(), Vec2::ZERO);

        let frame = Transform::IDENTITY;
        let placement = wall.clamp_portal_position(&frame, Vec3::new(60., 10., 0.), None);
        assert!(placement
            .transform
            .translation
            .abs_diff_eq(Vec3::new(0., 0., PORTAL_SURFACE_OFFSET), 1e-5));
        assert!(!placement.overlaps_sibling);
    }

    #[test]
    fn overlapping_sibling_is_reported() {
        let wall = PortalWall::new(2000., 400.);
        let frame = turned_wall_frame();
        let sibling = wall
            .clamp_portal_position(&frame, local_to_world_no_scale(&frame, Vec3::ZERO), None)
            .transform;

        let near = local_to_world_no_scale(&frame, Vec3::new(100., 0., 0.));
        assert!(wall.clamp_portal_position(&frame, near, Some(&sibling)).overlaps_sibling);

        let far = local_to_world_no_scale(&frame, Vec3::new(400., 0., 0.));
        assert!(!wall.clamp_portal_position(&frame, far, Some(&sibling)).overlaps_sibling);
    }

    #[test]
    fn touching_footprints_are_accepted() {
        let wall = PortalWall::new(2000., 400.);
        let frame = Transform::IDENTITY;
        let sibling = wall
            .clamp_portal_position(&frame, Vec3::new(-90., 0., 0.), None)
            .transform;
        let placement = wall.clamp_portal_position(&frame, Vec3::new(90., 0., 0.), Some(&sibling));
        assert!(!placement.overlaps_sibling);
    }

    #[test]
    fn sibling_on_another_wall_never_overlaps() {
        let wall = PortalWall::new(2000., 400.);
        let frame = Transform::IDENTITY;
        let sibling = Transform::from_xyz(0., 0., 500.);
        let placement = wall.clamp_portal_position(&frame, Vec3::ZERO, Some(&sibling));
        assert!(!placement.overlaps_sibling);
    }
}
