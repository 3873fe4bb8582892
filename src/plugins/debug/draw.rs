use bevy::prelude::*;
use bevy_prototype_debug_lines::DebugLines;

use crate::plugins::portal::{
    geometry::local_to_world_no_scale, Portal, PortalWall, PORTAL_FOOTPRINT,
};

#[derive(Debug, Default, Resource)]
/// Toggled with F3.
pub struct DebugDrawSettings {
    pub enabled: bool,
}

pub fn toggle_debug_draw(keys: Res<Input<KeyCode>>, mut settings: ResMut<DebugDrawSettings>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.enabled = !settings.enabled;
    }
}

/// Draw a rectangle in the XY plane of `frame`, at depth `z`.
pub fn draw_frame_rectangle(
    frame: &Transform,
    half_extents: Vec2,
    z: f32,
    color: Color,
    lines: &mut DebugLines,
) {
    let corners = [
        Vec3::new(-half_extents.x, -half_extents.y, z),
        Vec3::new(half_extents.x, -half_extents.y, z),
        Vec3::new(half_extents.x, half_extents.y, z),
        Vec3::new(-half_extents.x, half_extents.y, z),
    ]
    .map(|corner| local_to_world_no_scale(frame, corner));

    for i in 0..corners.len() {
        lines.line_colored(corners[i], corners[(i + 1) % corners.len()], 0., color);
    }
}

/// Outline the area portal centers are clamped to on every portal wall, and the footprint of
/// open portals.
pub fn draw_portal_bounds(
    settings: Res<DebugDrawSettings>,
    walls: Query<(&PortalWall, &GlobalTransform)>,
    portals: Query<&GlobalTransform, With<Portal>>,
    mut lines: ResMut<DebugLines>,
) {
    if !settings.enabled {
        return;
    }
    for (wall, transform) in &walls {
        let frame = transform.compute_transform();
        let color = if wall.is_degenerate() {
            Color::RED
        } else {
            Color::GREEN
        };
        // Degenerate walls clamp to a single point, keep it visible
        let bounds = wall.clamp_bounds().max(Vec2::splat(2.));
        draw_frame_rectangle(&frame, bounds, 1., color, &mut lines);
    }
    for transform in &portals {
        draw_frame_rectangle(
            &transform.compute_transform(),
            PORTAL_FOOTPRINT / 2.,
            1.,
            Color::YELLOW,
            &mut lines,
        );
    }
}
