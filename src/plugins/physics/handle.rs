//! A physics handle: holds a rigid body at a target pose by steering its velocity.

use std::f32::consts::PI;

use bevy::{prelude::*, reflect::FromReflect};
use bevy_rapier3d::prelude::*;

/// Default rate at which positional error is turned into linear velocity, per second.
pub const DEFAULT_LINEAR_STIFFNESS: f32 = 20.;
/// Default rate at which angular error is turned into angular velocity, per second.
pub const DEFAULT_ANGULAR_STIFFNESS: f32 = 15.;
/// Speed cap for held bodies, in units per second.
pub const MAX_HANDLE_SPEED: f32 = 3000.;

#[derive(Debug, Component, Clone, Reflect, FromReflect)]
#[reflect(Component)]
pub struct PhysicsHandle {
    grabbed: Option<Entity>,
    target_translation: Vec3,
    target_rotation: Quat,
    pub linear_stiffness: f32,
    pub angular_stiffness: f32,
}

impl Default for PhysicsHandle {
    fn default() -> Self {
        PhysicsHandle {
            grabbed: None,
            target_translation: Vec3::ZERO,
            target_rotation: Quat::IDENTITY,
            linear_stiffness: DEFAULT_LINEAR_STIFFNESS,
            angular_stiffness: DEFAULT_ANGULAR_STIFFNESS,
        }
    }
}

impl PhysicsHandle {
    pub fn with_stiffness(linear: f32, angular: f32) -> PhysicsHandle {
        PhysicsHandle {
            linear_stiffness: linear,
            angular_stiffness: angular,
            ..default()
        }
    }

    /// Start holding `entity` at the given pose. A previously held body is let go.
    pub fn grab(&mut self, entity: Entity, translation: Vec3, rotation: Quat) {
        self.grabbed = Some(entity);
        self.set_target(translation, rotation);
    }

    pub fn set_target(&mut self, translation: Vec3, rotation: Quat) {
        self.target_translation = translation;
        self.target_rotation = rotation;
    }

    /// Let go of the held body, returning it. Releasing an empty handle does nothing.
    pub fn release(&mut self) -> Option<Entity> {
        self.grabbed.take()
    }

    pub fn grabbed(&self) -> Option<Entity> {
        self.grabbed
    }

    pub fn target(&self) -> Transform {
        Transform::from_translation(self.target_translation).with_rotation(self.target_rotation)
    }

    /// Velocity which brings a body at `current` towards the handle target.
    pub fn pursuit_velocity(&self, current: &Transform) -> Velocity {
        let target = self.target();
        let linvel = ((target.translation - current.translation) * self.linear_stiffness)
            .clamp_length_max(MAX_HANDLE_SPEED);

        let mut delta = target.rotation * current.rotation.inverse();
        // Take the short way around
        if delta.w < 0. {
            delta = -delta;
        }
        let (axis, mut angle) = delta.to_axis_angle();
        if angle > PI {
            angle -= 2. * PI;
        }
        let angvel = if angle.abs() > f32::EPSILON {
            axis * angle * self.angular_stiffness
        } else {
            Vec3::ZERO
        };

        Velocity { linvel, angvel }
    }
}

/// Steer every held body towards its handle target, letting go of bodies which no longer exist.
pub(super) fn drive_physics_handles(
    mut handles: Query<&mut PhysicsHandle>,
    mut bodies: Query<(&Transform, &mut Velocity), Without<PhysicsHandle>>,
) {
    for mut handle in &mut handles {
        if let Some(entity) = handle.grabbed() {
            match bodies.get_mut(entity) {
                Ok((transform, mut velocity)) => {
                    *velocity = handle.pursuit_velocity(transform);
                }
                Err(_) => {
                    info!("Held body {:?} is gone, releasing physics handle", entity);
                    handle.release();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use bevy::ecs::system::SystemState;

    use super::*;

    #[test]
    fn grab_and_release() {
        let mut handle = PhysicsHandle::default();
        let entity = Entity::from_raw(7);
        assert_eq!(handle.release(), None);

        handle.grab(entity, Vec3::X, Quat::IDENTITY);
        assert_eq!(handle.grabbed(), Some(entity));
        handle.set_target(Vec3::Y, Quat::from_rotation_y(1.));
        assert_eq!(handle.target().translation, Vec3::Y);

        assert_eq!(handle.release(), Some(entity));
        assert_eq!(handle.release(), None);
    }

    #[test]
    fn pursuit_points_at_target() {
        let mut handle = PhysicsHandle::with_stiffness(10., 10.);
        handle.grab(
            Entity::from_raw(1),
            Vec3::new(0., 0., -10.),
            Quat::from_rotation_y(FRAC_PI_2),
        );
        let velocity = handle.pursuit_velocity(&Transform::IDENTITY);
        assert!(velocity.linvel.abs_diff_eq(Vec3::new(0., 0., -100.), 1e-3));
        assert!(velocity
            .angvel
            .abs_diff_eq(Vec3::new(0., FRAC_PI_2 * 10., 0.), 1e-3));
    }

    #[test]
    fn pursuit_speed_is_capped() {
        let mut handle = PhysicsHandle::default();
        handle.grab(Entity::from_raw(1), Vec3::splat(1e6), Quat::IDENTITY);
        let velocity = handle.pursuit_velocity(&Transform::IDENTITY);
        assert!(velocity.linvel.length() <= MAX_HANDLE_SPEED + 1e-2);
        assert_eq!(velocity.angvel, Vec3::ZERO);
    }

    #[test]
    fn missing_body_releases_handle() {
        let mut world = World::new();
        let body = world
            .spawn((Transform::IDENTITY, Velocity::default()))
            .id();
        let mut handle = PhysicsHandle::default();
        handle.grab(body, Vec3::new(0., 10., 0.), Quat::IDENTITY);
        let holder = world.spawn(handle).id();

        let mut state: SystemState<(
            Query<&mut PhysicsHandle>,
            Query<(&Transform, &mut Velocity), Without<PhysicsHandle>>,
        )> = SystemState::new(&mut world);

        let (handles, bodies) = state.get_mut(&mut world);
        drive_physics_handles(handles, bodies);
        let velocity = world.get::<Velocity>(body).unwrap();
        assert!(velocity.linvel.y > 0.);

        world.despawn(body);
        let (handles, bodies) = state.get_mut(&mut world);
        drive_physics_handles(handles, bodies);
        assert_eq!(world.get::<PhysicsHandle>(holder).unwrap().grabbed(), None);
    }
}
