use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::plugins::grab::GrabLabels;

mod handle;
mod raycast;

pub use handle::*;
pub use raycast::*;

pub const WALLS_GROUP: Group = Group::GROUP_1;
pub const PROPS_GROUP: Group = Group::GROUP_2;
pub const PLAYER_GROUP: Group = Group::GROUP_4;
pub const RAYCAST_GROUP: Group = Group::GROUP_5;
pub const GROUND_GROUP: Group = Group::GROUP_6;
pub const PORTAL_SURFACE_GROUP: Group = Group::GROUP_7;
pub const ALL_GROUPS: Group = Group::ALL;

/// Everything that stops a portal shot. Only hits on portal walls lead to a placement.
pub const PORTAL_TRACE_GROUPS: Group = WALLS_GROUP
    .union(GROUND_GROUP)
    .union(PORTAL_SURFACE_GROUP);

/// Everything that stops a grab trace. Only hits on props lead to a grab, so props behind walls
/// are out of reach.
pub const GRAB_TRACE_GROUPS: Group = PROPS_GROUP.union(WALLS_GROUP).union(GROUND_GROUP);

/// Everything the player can stand on.
pub const STANDABLE_GROUPS: Group = PROPS_GROUP.union(WALLS_GROUP).union(GROUND_GROUP);

/// Gravity in game units, which are centimeters.
pub const GRAVITY: Vec3 = Vec3::new(0., -980., 0.);

pub struct PhysicsPlugin;

#[derive(Debug, SystemLabel)]
pub enum PhysicsLabels {
    DriveHandles,
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PhysicsHandle>()
            .add_startup_system(configure_rapier)
            .add_system(
                drive_physics_handles
                    .label(PhysicsLabels::DriveHandles)
                    .after(GrabLabels::Retarget),
            );
    }
}

fn configure_rapier(mut config: ResMut<RapierConfiguration>) {
    config.gravity = GRAVITY;
    // Extra CCD substeps because thrown props can go fast
    config.timestep_mode = TimestepMode::Variable {
        max_dt: 1. / 20.,
        time_scale: 1.,
        substeps: 4,
    }
}
