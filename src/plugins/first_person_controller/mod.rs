//! This module contains the first person controller plugin.
//!
//! The controller owns everything the player interacts with the world through: the portal pair,
//! the grab session and the physics handle are all components of the player root entity.

use std::f32::consts::FRAC_PI_2;

use bevy::{prelude::*, reflect::FromReflect, render::camera::Projection};
use bevy_rapier3d::prelude::*;
use euclid::Angle;
use leafwing_input_manager::prelude::*;

use crate::plugins::{
    camera::FieldOfView,
    config::GameplayConfig,
    grab::Grabber,
    input::{default_input_map, Actions},
    physics::*,
    portal::PortalPair,
};

/// Half height of the player capsule, hemispheres included.
pub const PLAYER_HALF_HEIGHT: f32 = 88.;
pub const PLAYER_RADIUS: f32 = 32.;
/// Height of the eye above the center of the player body.
pub const EYE_HEIGHT: f32 = 60.;

#[derive(Debug)]
/// First person controller plugin, which registers the required systems to use the first person
/// controller also provided by this module.
pub struct FirstPersonControllerPlugin;

impl Plugin for FirstPersonControllerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FirstPersonCamera>()
            .register_type::<FirstPersonControllerSpawner>()
            .add_system(spawn_controller.label(FirstPersonLabels::SpawnControllers))
            .add_system(process_controller_inputs.label(FirstPersonLabels::ProcessInputs));
    }
}

#[derive(Debug, SystemLabel)]
/// Labels for the first person controller systems.
pub enum FirstPersonLabels {
    SpawnControllers,
    ProcessInputs,
}

#[derive(Debug, Component)]
/// First person controller component.
pub struct FirstPersonController {
    /// Heading, applied to the player root.
    pub yaw: Angle<f32>,
    /// Look up/down angle, applied to the camera only.
    pub pitch: Angle<f32>,
    /// The first person camera, child of the player root.
    pub camera: Entity,
}

impl FirstPersonController {
    pub fn new(camera: Entity) -> FirstPersonController {
        FirstPersonController {
            yaw: Angle::zero(),
            pitch: Angle::zero(),
            camera,
        }
    }
}

#[derive(Debug, Default, Component, Reflect, FromReflect)]
#[reflect(Component)]
/// Marker for first person cameras.
pub struct FirstPersonCamera;

#[derive(Debug, Component, Default, Reflect, FromReflect)]
#[reflect(Component)]
pub struct FirstPersonControllerSpawner {}

#[derive(Debug, Bundle, Default)]
pub struct FirstPersonControllerBundle {
    #[bundle]
    pub spatial: SpatialBundle,
    pub spawner: FirstPersonControllerSpawner,
}

fn spawn_controller(
    mut commands: Commands,
    config: Res<GameplayConfig>,
    spawners_query: Query<(&FirstPersonControllerSpawner, Entity)>,
) {
    for (_spawner, id) in &spawners_query {
        let fov = config.camera.default_fov_degrees.to_radians();
        let camera = commands
            .spawn(Camera3dBundle {
                projection: Projection::Perspective(PerspectiveProjection {
                    fov,
                    aspect_ratio: 16. / 9.,
                    near: 1.,
                    far: 100_000.,
                }),
                transform: Transform::from_xyz(0., EYE_HEIGHT, 0.),
                ..default()
            })
            .insert((
                Name::from("Player camera"),
                FirstPersonCamera,
                FieldOfView::new(fov),
            ))
            .id();

        commands
            .entity(id)
            .insert(InputManagerBundle {
                action_state: ActionState::default(),
                input_map: default_input_map(),
            })
            .insert((
                RigidBody::Dynamic,
                Collider::capsule_y(PLAYER_HALF_HEIGHT - PLAYER_RADIUS, PLAYER_RADIUS),
                LockedAxes::ROTATION_LOCKED,
                Velocity::default(),
                Name::from("Player"),
                CollisionGroups::new(PLAYER_GROUP, ALL_GROUPS),
            ))
            .insert((
                FirstPersonController::new(camera),
                Grabber::default(),
                PhysicsHandle::with_stiffness(
                    config.grab.linear_stiffness,
                    config.grab.angular_stiffness,
                ),
                PortalPair::default(),
            ))
            .add_child(camera)
            .remove::<FirstPersonControllerSpawner>();

        info!("Spawned first person controller {:?}", id);
    }
}

const PLAYER_SPEED: f32 = 500.;
const MOUSE_SENSITIVITY: f32 = 0.004;
const SPRINT_MULTIPLIER: f32 = 2.;
/// Vertical speed a jump starts with.
pub const JUMP_VELOCITY: f32 = 550.;
/// How far below the feet the ground still counts as underfoot.
const GROUND_TOLERANCE: f32 = 5.;

/// Whether the body centered at `position` stands on something.
fn is_grounded(rapier: &RapierContext, body: Entity, position: Vec3) -> bool {
    cast_view_ray(
        rapier,
        position,
        Vec3::NEG_Y,
        PLAYER_HALF_HEIGHT + GROUND_TOLERANCE,
        STANDABLE_GROUPS,
        body,
    )
    .is_some()
}

/// Vertical velocity after the jump input. Jumping is only possible from the ground.
fn vertical_velocity(current: f32, jump: bool, grounded: bool) -> f32 {
    if jump && grounded {
        JUMP_VELOCITY
    } else {
        current
    }
}

/// Horizontal velocity for the movement inputs, relative to the player `forward` and `left`
/// directions.
fn walk_velocity(input_state: &ActionState<Actions>, forward: Vec3, left: Vec3) -> Vec3 {
    let k = if input_state.pressed(Actions::Sprint) {
        SPRINT_MULTIPLIER
    } else {
        1.
    };
    let mut direction = Vec3::ZERO;
    match (
        input_state.pressed(Actions::Forward),
        input_state.pressed(Actions::Backwards),
    ) {
        (true, false) => direction += forward,
        (false, true) => direction -= forward,
        _ => {}
    }
    match (
        input_state.pressed(Actions::StrafeLeft),
        input_state.pressed(Actions::StrafeRight),
    ) {
        (true, false) => direction += left,
        (false, true) => direction -= left,
        _ => {}
    }
    direction.y = 0.;
    direction.normalize_or_zero() * PLAYER_SPEED * k
}

fn process_controller_inputs(
    rapier: Res<RapierContext>,
    mut player_query: Query<(
        Entity,
        &ActionState<Actions>,
        &mut FirstPersonController,
        &mut Velocity,
        &mut Transform,
    )>,
    mut camera_query: Query<&mut Transform, Without<FirstPersonController>>,
) {
    for (id, input_state, mut controller, mut velocity, mut transform) in &mut player_query {
        // Keep the vertical velocity so gravity still applies
        let walk = walk_velocity(input_state, transform.forward(), transform.left());
        velocity.linvel.x = walk.x;
        velocity.linvel.z = walk.z;

        if input_state.just_pressed(Actions::Jump) {
            let grounded = is_grounded(&rapier, id, transform.translation);
            velocity.linvel.y = vertical_velocity(velocity.linvel.y, true, grounded);
            if !grounded {
                debug!("Can't jump while airborne");
            }
        }

        // Process mouse movement. We handle the rotation components separately:
        // * Rotation around the vertical axis (e.g. aiming left or right) is applied to the
        //   player root node.
        // * Rotation around the horizontal axis (e.g. aiming up or down) is applied directly to
        //   the perspective camera in order to keep the vertical orientation neutral on the root
        //   node.
        if let Some(mouse_movement) = input_state.axis_pair(Actions::Aim) {
            controller.yaw -= Angle::radians(mouse_movement.x() * MOUSE_SENSITIVITY);
            controller.pitch -= Angle::radians(mouse_movement.y() * MOUSE_SENSITIVITY);
            controller.pitch.radians = controller.pitch.radians.clamp(-FRAC_PI_2, FRAC_PI_2);
        }
        transform.rotation = Quat::from_rotation_y(controller.yaw.radians);

        if let Ok(mut camera_transform) = camera_query.get_mut(controller.camera) {
            camera_transform.rotation = Quat::from_rotation_x(controller.pitch.radians);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walking_is_horizontal_and_normalized() {
        let mut input_state = ActionState::<Actions>::default();
        input_state.press(Actions::Forward);
        input_state.press(Actions::StrafeLeft);
        let velocity = walk_velocity(&input_state, Vec3::NEG_Z, Vec3::NEG_X);
        assert!((velocity.length() - PLAYER_SPEED).abs() < 1e-3);
        assert!(velocity.x < 0. && velocity.z < 0.);
        assert_eq!(velocity.y, 0.);

        input_state.press(Actions::Sprint);
        let velocity = walk_velocity(&input_state, Vec3::NEG_Z, Vec3::NEG_X);
        assert!((velocity.length() - PLAYER_SPEED * SPRINT_MULTIPLIER).abs() < 1e-3);
    }

    #[test]
    fn opposite_inputs_cancel_out() {
        let mut input_state = ActionState::<Actions>::default();
        input_state.press(Actions::Forward);
        input_state.press(Actions::Backwards);
        assert_eq!(
            walk_velocity(&input_state, Vec3::NEG_Z, Vec3::NEG_X),
            Vec3::ZERO
        );
    }

    #[test]
    fn jumping_requires_ground() {
        assert_eq!(vertical_velocity(0., true, true), JUMP_VELOCITY);
        assert_eq!(vertical_velocity(-200., true, false), -200.);
        assert_eq!(vertical_velocity(-200., false, true), -200.);
    }

    #[test]
    fn airborne_player_does_not_jump() {
        let mut app = App::new();
        app.insert_resource(RapierContext::default())
            .add_system(process_controller_inputs);

        let camera = app.world.spawn(Transform::default()).id();
        let mut input_state = ActionState::<Actions>::default();
        input_state.press(Actions::Jump);
        let player = app
            .world
            .spawn((
                input_state,
                FirstPersonController::new(camera),
                Velocity::linear(Vec3::new(0., -300., 0.)),
                Transform::from_xyz(0., 500., 0.),
            ))
            .id();

        app.update();

        assert_eq!(app.world.get::<Velocity>(player).unwrap().linvel.y, -300.);
    }
}
