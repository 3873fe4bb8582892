//! Picking up props.
//!
//! A grab starts with a short trace from the eye. The hit prop is animated to a pose in front of
//! the player, then handed to the player's [`PhysicsHandle`] which keeps pulling it in front of
//! the eye until the player lets go, or the prop ends up too far away.

use std::time::Duration;

use bevy::{app::AppExit, prelude::*, reflect::FromReflect};
use bevy_rapier3d::prelude::*;
use leafwing_input_manager::prelude::*;
use thiserror::Error;

use crate::plugins::{
    config::{GameplayConfig, GrabConfig},
    first_person_controller::*,
    input::Actions,
    lerp::{LerpJob, LerpStep, LerpTimer, Pose},
    physics::*,
};

#[derive(Debug, Default, Component, Clone, Reflect, FromReflect)]
#[reflect(Component)]
/// Marker for props the player can pick up.
pub struct Grabbable;

#[derive(Debug, Default, Component, Clone, Reflect, FromReflect)]
#[reflect(Component)]
/// Marker for laser reflecting cubes. They are held upright, facing the player.
pub struct LaserCube;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrabError {
    #[error("nothing to grab in reach")]
    NoHit,
    #[error("{0:?} cannot be grabbed")]
    NotGrabbable(Entity),
}

#[derive(Debug, Clone, Copy)]
/// Where the player looks from, and which way.
pub struct Viewpoint {
    pub eye: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Heading of the player body, in radians.
    pub yaw: f32,
}

impl Viewpoint {
    pub fn new(camera: &GlobalTransform, yaw: f32) -> Viewpoint {
        Viewpoint {
            eye: camera.translation(),
            forward: camera.forward(),
            up: camera.up(),
            yaw,
        }
    }

    /// Rotation following the player heading, with pitch and roll zeroed.
    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Pose held objects are pulled towards.
    pub fn hold_pose(&self, config: &GrabConfig) -> Pose {
        Pose::new(
            self.eye + self.forward * config.hold_distance,
            self.yaw_rotation(),
        )
    }

    /// Pose a freshly grabbed object is animated to, from its `current` pose.
    pub fn approach_pose(
        &self,
        kind: HitKind,
        current: &Pose,
        config: &GrabConfig,
    ) -> Option<Pose> {
        match kind {
            HitKind::ReflectiveProp => Some(Pose::new(
                self.eye + self.forward * config.reflective_approach_distance
                    - self.up * config.reflective_drop,
                self.yaw_rotation(),
            )),
            HitKind::Grabbable => Some(Pose::new(
                self.eye + self.forward * config.approach_distance,
                current.rotation,
            )),
            HitKind::Wall | HitKind::Other => None,
        }
    }
}

#[derive(Debug, Default)]
pub enum GrabState {
    #[default]
    Idle,
    /// The target is being brought in front of the player.
    Approaching {
        target: Entity,
        animation: LerpTimer<Pose>,
    },
    Holding {
        target: Entity,
    },
}

#[derive(Debug, Default, Component)]
/// Grab session of a player.
pub struct Grabber {
    state: GrabState,
}

impl Grabber {
    pub fn is_idle(&self) -> bool {
        matches!(self.state, GrabState::Idle)
    }

    /// The object currently held, once its approach is over.
    pub fn held(&self) -> Option<Entity> {
        match self.state {
            GrabState::Holding { target } => Some(target),
            _ => None,
        }
    }

    /// Start bringing `target` in front of the player along `job`. Any ongoing session is dropped.
    pub fn begin_approach(&mut self, target: Entity, job: LerpJob<Pose>) {
        self.state = GrabState::Approaching {
            target,
            animation: LerpTimer::new(job),
        };
    }

    /// Advance the approach animation by a frame delta.
    ///
    /// Returns the approached entity and the latest animation step, if a step ran this frame.
    pub fn advance_approach(&mut self, delta: Duration) -> Option<(Entity, LerpStep<Pose>)> {
        match &mut self.state {
            GrabState::Approaching { target, animation } => {
                animation.advance(delta).map(|step| (*target, step))
            }
            _ => None,
        }
    }

    /// Switch to holding `target`.
    pub fn hold(&mut self, target: Entity) {
        self.state = GrabState::Holding { target };
    }

    /// End the session whatever its state, dropping a pending animation. Returns the entity the
    /// session was about. Calling this while idle does nothing.
    pub fn release(&mut self) -> Option<Entity> {
        match std::mem::take(&mut self.state) {
            GrabState::Idle => None,
            GrabState::Approaching { target, .. } | GrabState::Holding { target } => Some(target),
        }
    }

    /// Release the held object if it is `distance` away from its holder and that exceeds
    /// `tether_distance`. Returns the released entity.
    pub fn enforce_tether(&mut self, distance: f32, tether_distance: f32) -> Option<Entity> {
        if self.held().is_some() && distance > tether_distance {
            self.release()
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct GrabPlugin;

#[derive(Debug, SystemLabel)]
/// Grab systems run in this order every frame.
pub enum GrabLabels {
    ProcessInput,
    Approach,
    Tether,
    Retarget,
}

impl Plugin for GrabPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Grabbable>()
            .register_type::<LaserCube>()
            .add_system(
                toggle_grab
                    .label(GrabLabels::ProcessInput)
                    .after(FirstPersonLabels::ProcessInputs),
            )
            .add_system(
                advance_grab_approach
                    .label(GrabLabels::Approach)
                    .after(GrabLabels::ProcessInput),
            )
            .add_system(
                enforce_grab_tether
                    .label(GrabLabels::Tether)
                    .after(GrabLabels::Approach),
            )
            .add_system(
                retarget_held_objects
                    .label(GrabLabels::Retarget)
                    .after(GrabLabels::Tether),
            )
            .add_system(end_grab_sessions_on_exit);
    }
}

/// Work out what the grab trace `hit` picks up, and where it should be brought to.
fn grab_target(
    hit: Option<RayHit>,
    view: &Viewpoint,
    config: &GrabConfig,
    targets: &HitTargets,
    props: &Query<&Transform, Without<Grabber>>,
) -> Result<(Entity, Pose, Pose), GrabError> {
    let hit = hit.ok_or(GrabError::NoHit)?;

    let start = props
        .get(hit.entity)
        .map(Pose::from)
        .map_err(|_| GrabError::NotGrabbable(hit.entity))?;
    let end = view
        .approach_pose(HitKind::of(hit.entity, targets), &start, config)
        .ok_or(GrabError::NotGrabbable(hit.entity))?;
    Ok((hit.entity, start, end))
}

/// On grab input, pick up what's in front of the player or let go of what's held.
fn toggle_grab(
    rapier: Res<RapierContext>,
    config: Res<GameplayConfig>,
    mut players: Query<(
        Entity,
        &ActionState<Actions>,
        &FirstPersonController,
        &mut Grabber,
        &mut PhysicsHandle,
    )>,
    cameras: Query<&GlobalTransform, With<FirstPersonCamera>>,
    targets: HitTargets,
    props: Query<&Transform, Without<Grabber>>,
) {
    for (holder, input_state, controller, mut grabber, mut handle) in &mut players {
        if !input_state.just_pressed(Actions::Grab) {
            continue;
        }

        if !grabber.is_idle() {
            handle.release();
            if let Some(target) = grabber.release() {
                info!("Letting go of {:?}", target);
            }
            continue;
        }

        if let Ok(camera) = cameras.get(controller.camera) {
            let view = Viewpoint::new(camera, controller.yaw.radians);
            let hit = cast_view_ray(
                &rapier,
                view.eye,
                view.forward,
                config.grab.trace_distance,
                GRAB_TRACE_GROUPS,
                holder,
            );
            match grab_target(hit, &view, &config.grab, &targets, &props) {
                Ok((target, start, end)) => {
                    info!("Grabbing {:?}", target);
                    grabber.begin_approach(
                        target,
                        LerpJob::with_timing(start, end, config.lerp.duration, config.lerp.steps),
                    );
                }
                Err(err) => debug!("Grab aborted: {}", err),
            }
        }
    }
}

/// Move approaching props along their animation, and start holding them once it is over.
fn advance_grab_approach(
    time: Res<Time>,
    config: Res<GameplayConfig>,
    mut players: Query<(&FirstPersonController, &mut Grabber, &mut PhysicsHandle)>,
    cameras: Query<&GlobalTransform, With<FirstPersonCamera>>,
    mut props: Query<(&mut Transform, Option<&mut Velocity>), Without<Grabber>>,
) {
    for (controller, mut grabber, mut handle) in &mut players {
        if let Some((target, step)) = grabber.advance_approach(time.delta()) {
            let (mut transform, velocity) = match props.get_mut(target) {
                Ok(prop) => prop,
                Err(_) => {
                    info!("Grabbed object {:?} vanished during its approach", target);
                    grabber.release();
                    continue;
                }
            };
            step.value().apply_to(&mut transform);
            if let Some(mut velocity) = velocity {
                *velocity = Velocity::zero();
            }

            if step.is_finished() {
                if let Ok(camera) = cameras.get(controller.camera) {
                    let hold = Viewpoint::new(camera, controller.yaw.radians)
                        .hold_pose(&config.grab);
                    handle.grab(target, hold.translation, hold.rotation);
                    grabber.hold(target);
                    info!("Holding {:?}", target);
                } else {
                    grabber.release();
                }
            }
        }
    }
}

/// Let go of held objects which drifted too far from their holder.
fn enforce_grab_tether(
    config: Res<GameplayConfig>,
    mut players: Query<(&GlobalTransform, &mut Grabber, &mut PhysicsHandle)>,
    props: Query<&GlobalTransform, Without<Grabber>>,
) {
    for (holder, mut grabber, mut handle) in &mut players {
        if let Some(target) = grabber.held() {
            let distance = match props.get(target) {
                Ok(prop) => prop.translation().distance(holder.translation()),
                // A despawned object is as good as infinitely far.
                Err(_) => f32::INFINITY,
            };
            if grabber
                .enforce_tether(distance, config.grab.tether_distance)
                .is_some()
            {
                info!("{:?} is out of reach ({}), letting go", target, distance);
                handle.release();
            }
        }
    }
}

/// Keep held objects in front of the eye.
fn retarget_held_objects(
    config: Res<GameplayConfig>,
    mut players: Query<(&FirstPersonController, &Grabber, &mut PhysicsHandle)>,
    cameras: Query<&GlobalTransform, With<FirstPersonCamera>>,
) {
    for (controller, grabber, mut handle) in &mut players {
        if grabber.held().is_none() {
            continue;
        }
        if let Ok(camera) = cameras.get(controller.camera) {
            let hold = Viewpoint::new(camera, controller.yaw.radians).hold_pose(&config.grab);
            handle.set_target(hold.translation, hold.rotation);
        }
    }
}

fn end_grab_sessions_on_exit(
    mut exit_events: EventReader<AppExit>,
    mut players: Query<(&mut Grabber, &mut PhysicsHandle)>,
) {
    if exit_events.iter().next().is_some() {
        for (mut grabber, mut handle) in &mut players {
            grabber.release();
            handle.release();
        }
    }
}
