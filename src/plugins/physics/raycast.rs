use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::plugins::{
    grab::{Grabbable, LaserCube},
    portal::PortalWall,
};

use super::RAYCAST_GROUP;

#[derive(Debug, Clone, Copy, PartialEq)]
/// A blocking hit reported by [`cast_view_ray`].
pub struct RayHit {
    /// Entity owning the collider that was hit.
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Cast a ray from `origin` along `direction`, against colliders belonging to `groups`.
///
/// The colliders of `holder` are ignored so the player never blocks its own traces.
pub fn cast_view_ray(
    rapier: &RapierContext,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    groups: Group,
    holder: Entity,
) -> Option<RayHit> {
    let direction = direction.try_normalize()?;
    let filter = QueryFilter {
        groups: Some(CollisionGroups::new(RAYCAST_GROUP, groups).into()),
        exclude_rigid_body: Some(holder),
        ..default()
    };
    let (entity, distance) = rapier.cast_ray(origin, direction, max_distance, true, filter)?;
    Some(RayHit {
        entity,
        point: origin + direction * distance,
        distance,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a trace ran into, as far as the interaction code is concerned.
pub enum HitKind {
    Wall,
    Grabbable,
    /// A laser cube: picked up like other props, but held upright facing the player.
    ReflectiveProp,
    Other,
}

/// Markers needed to resolve a [`HitKind`].
pub type HitTargets<'w, 's> = Query<
    'w,
    's,
    (
        Option<&'static PortalWall>,
        Option<&'static Grabbable>,
        Option<&'static LaserCube>,
    ),
>;

impl HitKind {
    pub fn from_markers(wall: bool, grabbable: bool, reflective: bool) -> HitKind {
        match (wall, grabbable, reflective) {
            (_, _, true) => HitKind::ReflectiveProp,
            (_, true, false) => HitKind::Grabbable,
            (true, false, false) => HitKind::Wall,
            _ => HitKind::Other,
        }
    }

    /// Resolve the kind of a hit entity. Entities lacking every marker, including despawned
    /// ones, are [`HitKind::Other`].
    pub fn of(entity: Entity, targets: &HitTargets) -> HitKind {
        targets
            .get(entity)
            .map(|(wall, grabbable, reflective)| {
                HitKind::from_markers(wall.is_some(), grabbable.is_some(), reflective.is_some())
            })
            .unwrap_or(HitKind::Other)
    }
}
