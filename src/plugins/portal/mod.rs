use bevy::{ecs::system::SystemParam, prelude::*, reflect::FromReflect};
use bevy_rapier3d::prelude::*;
use leafwing_input_manager::prelude::*;
use thiserror::Error;

pub mod geometry;
mod wall;

pub use wall::*;

use super::{
    config::GameplayConfig,
    first_person_controller::*,
    input::Actions,
    physics::*,
};

#[derive(Debug)]
pub struct PortalPlugin;

#[derive(Debug, Default, Resource)]
pub struct PortalResources {
    mesh: Handle<Mesh>,
    materials: [Handle<StandardMaterial>; 2],
    placement_sounds: [Option<Handle<AudioSource>>; 2],
}

impl PortalResources {
    fn material(&self, slot: PortalSlot) -> Handle<StandardMaterial> {
        self.materials[slot.index()].clone()
    }

    fn placement_sound(&self, slot: PortalSlot) -> Option<Handle<AudioSource>> {
        self.placement_sounds[slot.index()].clone()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Reflect, FromReflect)]
/// The two portals a player can have open.
pub enum PortalSlot {
    #[default]
    A,
    B,
}

impl PortalSlot {
    pub const ALL: [PortalSlot; 2] = [PortalSlot::A, PortalSlot::B];

    pub fn other(self) -> PortalSlot {
        match self {
            PortalSlot::A => PortalSlot::B,
            PortalSlot::B => PortalSlot::A,
        }
    }

    pub fn action(self) -> Actions {
        match self {
            PortalSlot::A => Actions::FirePortalA,
            PortalSlot::B => Actions::FirePortalB,
        }
    }

    fn index(self) -> usize {
        match self {
            PortalSlot::A => 0,
            PortalSlot::B => 1,
        }
    }
}

#[derive(Debug, Default, Component, Clone, Reflect, FromReflect)]
#[reflect(Component)]
pub struct Portal {
    pub slot: PortalSlot,
    /// The other portal of the pair, if open.
    pub linked_portal: Option<Entity>,
}

#[derive(Debug, Default, Component, Clone, Reflect, FromReflect)]
#[reflect(Component)]
/// The portals opened by a player, at most one per slot.
pub struct PortalPair {
    a: Option<Entity>,
    b: Option<Entity>,
}

impl PortalPair {
    pub fn get(&self, slot: PortalSlot) -> Option<Entity> {
        match slot {
            PortalSlot::A => self.a,
            PortalSlot::B => self.b,
        }
    }

    /// Put `portal` in `slot`, returning the previous occupant.
    fn replace(&mut self, slot: PortalSlot, portal: Entity) -> Option<Entity> {
        match slot {
            PortalSlot::A => self.a.replace(portal),
            PortalSlot::B => self.b.replace(portal),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("the portal shot did not hit anything")]
    NoHit,
    #[error("{0:?} is not a portal wall")]
    NotAPortalWall(Entity),
    #[error("the portal would overlap its linked portal")]
    OverlapsSibling,
}

#[derive(Debug, SystemLabel)]
pub enum PortalLabels {
    ShootPortals,
}

#[derive(Bundle)]
pub struct PortalBundle {
    #[bundle]
    pub mesh_bundle: PbrBundle,
    pub portal: Portal,
    pub name: Name,
}

impl Plugin for PortalPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Portal>()
            .register_type::<PortalPair>()
            .register_type::<PortalWall>()
            .add_startup_system(load_portal_assets)
            .add_system(
                fire_portals
                    .label(PortalLabels::ShootPortals)
                    .after(FirstPersonLabels::ProcessInputs),
            );
    }
}

/// Load the assets required to show the portals and play their sounds.
fn load_portal_assets(
    mut commands: Commands,
    assets: Res<AssetServer>,
    config: Res<GameplayConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(
        shape::Quad {
            size: PORTAL_FOOTPRINT,
            flip: false,
        }
        .into(),
    );
    let portal_material = |color: Color| StandardMaterial {
        base_color: color,
        emissive: color,
        unlit: true,
        ..default()
    };
    let materials = [
        materials.add(portal_material(Color::rgb(0.1, 0.45, 1.))),
        materials.add(portal_material(Color::rgb(1., 0.5, 0.05))),
    ];
    let placement_sounds = [&config.portal.sound_a, &config.portal.sound_b]
        .map(|path| path.as_ref().map(|path| assets.load(path.as_str())));

    commands.insert_resource(PortalResources {
        mesh,
        materials,
        placement_sounds,
    });
}

/// Work out where a portal shot landing at `hit` opens.
///
/// `wall` is the hit portal wall and its world transform, if the hit entity is one, and
/// `sibling` the world transform of the other portal of the pair.
pub fn placement_on_wall(
    hit: &RayHit,
    kind: HitKind,
    wall: Option<(&PortalWall, Transform)>,
    sibling: Option<&Transform>,
) -> Result<Transform, PlacementError> {
    let (wall, wall_frame) = match (kind, wall) {
        (HitKind::Wall, Some(wall)) => wall,
        _ => return Err(PlacementError::NotAPortalWall(hit.entity)),
    };
    if wall.is_degenerate() {
        debug!(
            "Wall {:?} is smaller than a portal, pinning the portal to its center",
            hit.entity
        );
    }
    let placement = wall.clamp_portal_position(&wall_frame, hit.point, sibling);
    if placement.overlaps_sibling {
        return Err(PlacementError::OverlapsSibling);
    }
    Ok(placement.transform)
}

/// Open the portal of `slot` at `transform`, closing the one previously in that slot and linking
/// the new portal with the other one of the pair.
pub fn spawn_portal(
    commands: &mut Commands,
    pair: &mut PortalPair,
    slot: PortalSlot,
    transform: Transform,
    resources: &PortalResources,
) -> Entity {
    let linked_portal = pair
        .get(slot.other())
        .filter(|&other| commands.get_entity(other).is_some());

    let portal = commands
        .spawn(PortalBundle {
            mesh_bundle: PbrBundle {
                mesh: resources.mesh.clone(),
                material: resources.material(slot),
                transform,
                ..default()
            },
            portal: Portal {
                slot,
                linked_portal,
            },
            name: Name::from(format!("Portal {:?}", slot)),
        })
        .id();

    if let Some(other) = linked_portal {
        commands.entity(other).insert(Portal {
            slot: slot.other(),
            linked_portal: Some(portal),
        });
    }

    if let Some(previous) = pair.replace(slot, portal) {
        if let Some(mut previous) = commands.get_entity(previous) {
            info!("Despawning previous portal {:?}", slot);
            previous.despawn_recursive();
        }
    }
    portal
}

/// What portal shots can land on, and the portals already open.
#[derive(SystemParam)]
pub struct PortalSurfaces<'w, 's> {
    targets: HitTargets<'w, 's>,
    walls: Query<'w, 's, (&'static PortalWall, &'static GlobalTransform)>,
    portals: Query<'w, 's, &'static GlobalTransform, With<Portal>>,
}

impl<'w, 's> PortalSurfaces<'w, 's> {
    fn placement(
        &self,
        hit: &RayHit,
        sibling: Option<&Transform>,
    ) -> Result<Transform, PlacementError> {
        let wall = self
            .walls
            .get(hit.entity)
            .ok()
            .map(|(wall, frame)| (wall, frame.compute_transform()));
        placement_on_wall(hit, HitKind::of(hit.entity, &self.targets), wall, sibling)
    }

    fn open_portal(&self, portal: Entity) -> Option<Transform> {
        self.portals
            .get(portal)
            .ok()
            .map(GlobalTransform::compute_transform)
    }
}

#[derive(Debug, Default)]
/// Portals opened by a player during the current frame. Their spawn is still pending, so queries
/// don't see them yet.
pub struct FramePlacements([Option<Transform>; 2]);

impl FramePlacements {
    fn get(&self, slot: PortalSlot) -> Option<Transform> {
        self.0[slot.index()]
    }

    fn record(&mut self, slot: PortalSlot, transform: Transform) {
        self.0[slot.index()] = Some(transform);
    }
}

/// Open the portal of `slot` where the shot `hit` landed, if it is a valid placement.
///
/// The placement is checked against the other portal of the pair, preferring one opened earlier
/// in the same frame over the one currently open. A refused placement leaves every portal as is.
pub fn shoot_portal(
    commands: &mut Commands,
    pair: &mut PortalPair,
    slot: PortalSlot,
    hit: Option<RayHit>,
    surfaces: &PortalSurfaces,
    placed: &mut FramePlacements,
    resources: &PortalResources,
) -> Result<Entity, PlacementError> {
    let hit = hit.ok_or(PlacementError::NoHit)?;
    debug!(
        "Portal {:?} shot hit {:?}, {:.0} units away",
        slot, hit.entity, hit.distance
    );

    let sibling = placed.get(slot.other()).or_else(|| {
        pair.get(slot.other())
            .and_then(|other| surfaces.open_portal(other))
    });
    let transform = surfaces.placement(&hit, sibling.as_ref())?;

    info!("Spawning portal {:?} at {}", slot, transform.translation);
    placed.record(slot, transform);
    Ok(spawn_portal(commands, pair, slot, transform, resources))
}

/// On left click/right click, shoot a portal.
fn fire_portals(
    mut commands: Commands,
    rapier: Res<RapierContext>,
    config: Res<GameplayConfig>,
    audio: Res<Audio>,
    resources: Res<PortalResources>,
    mut players: Query<(
        Entity,
        &ActionState<Actions>,
        &FirstPersonController,
        &mut PortalPair,
    )>,
    cameras: Query<&GlobalTransform, With<FirstPersonCamera>>,
    surfaces: PortalSurfaces,
) {
    for (player, input_state, controller, mut pair) in &mut players {
        let eye = match cameras.get(controller.camera) {
            Ok(eye) => eye,
            Err(_) => continue,
        };
        let mut placed = FramePlacements::default();
        for slot in PortalSlot::ALL {
            if !input_state.just_pressed(slot.action()) {
                continue;
            }
            info!("Shooting portal {:?}", slot);

            let hit = cast_view_ray(
                &rapier,
                eye.translation(),
                eye.forward(),
                config.portal.trace_distance,
                PORTAL_TRACE_GROUPS,
                player,
            );
            match shoot_portal(
                &mut commands,
                &mut pair,
                slot,
                hit,
                &surfaces,
                &mut placed,
                &resources,
            ) {
                Ok(_) => {
                    if let Some(sound) = resources.placement_sound(slot) {
                        audio.play(sound);
                    }
                }
                Err(err) => debug!("Portal {:?} not placed: {}", slot, err),
            }
        }
    }
}
