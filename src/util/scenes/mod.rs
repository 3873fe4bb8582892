use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::plugins::{
    grab::{Grabbable, LaserCube},
    physics::*,
    portal::PortalWall,
};

const WALL_THICKNESS: f32 = 4.;

/// Setup a test room in a square flat arena format of specified size, in centimeters.
///
/// The four outer walls accept portals. Inside the arena stand a plain wall portals can't be
/// shot on, a panel too small for a portal, a few props and a laser cube.
pub fn make_test_arena(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    length: f32,
    height: f32,
) {
    let walls_materials = [
        materials.add(StandardMaterial::from(Color::ANTIQUE_WHITE)),
        materials.add(StandardMaterial::from(Color::GRAY)),
        materials.add(StandardMaterial::from(Color::ANTIQUE_WHITE)),
        materials.add(StandardMaterial::from(Color::GRAY)),
    ];
    let ground_material = materials.add(StandardMaterial::from(Color::DARK_GRAY));

    let half_len = length / 2.;
    let wall_mesh = meshes.add(wall_box(length, height));
    let ground_mesh = meshes.add(
        shape::Box {
            min_x: -half_len * 1.1,
            max_x: half_len * 1.1,
            min_y: -WALL_THICKNESS / 2.,
            max_y: WALL_THICKNESS / 2.,
            min_z: -half_len * 1.1,
            max_z: half_len * 1.1,
        }
        .into(),
    );

    let mut ground = commands.spawn(PbrBundle {
        mesh: ground_mesh.clone(),
        material: ground_material.clone(),
        transform: Transform::from_xyz(0., -WALL_THICKNESS / 2., 0.),
        ..default()
    });
    ground.insert((
        Name::from("Ground"),
        RigidBody::Fixed,
        Collider::cuboid(half_len * 1.1, WALL_THICKNESS / 2., half_len * 1.1),
        CollisionGroups::new(GROUND_GROUP, ALL_GROUPS),
    ));

    ground.with_children(|parent| {
        // Outer walls, facing the arena center
        for (i, mat) in walls_materials.into_iter().enumerate() {
            let mut transform =
                Transform::from_xyz(0., height / 2., -(half_len + WALL_THICKNESS / 2.));
            transform.rotate_around(
                Vec3::new(0., height / 2., 0.),
                Quat::from_axis_angle(Vec3::Y, i as f32 * FRAC_PI_2),
            );
            parent
                .spawn(PbrBundle {
                    mesh: wall_mesh.clone(),
                    material: mat,
                    transform,
                    ..default()
                })
                .insert((
                    Name::from(format!("Wall_{}", i)),
                    PortalWall::new(length, height),
                    RigidBody::Fixed,
                    Collider::cuboid(half_len, height / 2., WALL_THICKNESS / 2.),
                    CollisionGroups::new(WALLS_GROUP.union(PORTAL_SURFACE_GROUP), ALL_GROUPS),
                ));
        }
        parent
            .spawn(PbrBundle {
                mesh: ground_mesh,
                material: ground_material,
                transform: Transform::from_translation(Vec3::Y * height),
                ..default()
            })
            .insert((
                Name::from("Ceiling"),
                RigidBody::Fixed,
                Collider::cuboid(half_len * 1.1, WALL_THICKNESS / 2., half_len * 1.1),
                CollisionGroups::new(GROUND_GROUP, ALL_GROUPS),
            ));

        // Blocks portal shots without accepting portals
        let plain_wall = Vec2::new(length / 4., height / 2.);
        parent
            .spawn(PbrBundle {
                mesh: meshes.add(wall_box(plain_wall.x, plain_wall.y)),
                material: materials.add(StandardMaterial::from(Color::MAROON)),
                transform: Transform::from_xyz(-length / 4., plain_wall.y / 2., 0.),
                ..default()
            })
            .insert((
                Name::from("Plain wall"),
                RigidBody::Fixed,
                Collider::cuboid(plain_wall.x / 2., plain_wall.y / 2., WALL_THICKNESS / 2.),
                CollisionGroups::new(WALLS_GROUP, ALL_GROUPS),
            ));

        // Portals shot on this one always open at its center
        let small_panel = PortalWall::new(120., 120.);
        parent
            .spawn(PbrBundle {
                mesh: meshes.add(wall_box(small_panel.width, small_panel.height)),
                material: materials.add(StandardMaterial::from(Color::SILVER)),
                transform: Transform::from_xyz(length / 4., 150., -length / 4.)
                    .with_rotation(Quat::from_rotation_y(-FRAC_PI_2 / 2.)),
                ..default()
            })
            .insert((
                Name::from("Small panel"),
                RigidBody::Fixed,
                Collider::cuboid(
                    small_panel.width / 2.,
                    small_panel.height / 2.,
                    WALL_THICKNESS / 2.,
                ),
                CollisionGroups::new(WALLS_GROUP.union(PORTAL_SURFACE_GROUP), ALL_GROUPS),
                small_panel,
            ));
    });

    spawn_props(commands, meshes, materials);
}

/// Box mesh for a wall of the given size, its surface facing +Z.
fn wall_box(width: f32, height: f32) -> Mesh {
    shape::Box {
        min_x: -width / 2.,
        max_x: width / 2.,
        min_y: -height / 2.,
        max_y: height / 2.,
        min_z: -WALL_THICKNESS / 2.,
        max_z: WALL_THICKNESS / 2.,
    }
    .into()
}

fn spawn_props(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    const PROP_SIZE: f32 = 40.;
    const LASER_CUBE_SIZE: f32 = 50.;

    let prop_mesh = meshes.add(shape::Cube { size: PROP_SIZE }.into());
    let prop_material = materials.add(StandardMaterial::from(Color::ORANGE));
    for (i, position) in [
        Vec3::new(200., PROP_SIZE, -300.),
        Vec3::new(-150., PROP_SIZE, -400.),
        Vec3::new(350., PROP_SIZE, 250.),
    ]
    .into_iter()
    .enumerate()
    {
        commands
            .spawn(PbrBundle {
                mesh: prop_mesh.clone(),
                material: prop_material.clone(),
                transform: Transform::from_translation(position),
                ..default()
            })
            .insert((
                Name::from(format!("Prop_{}", i)),
                Grabbable,
                RigidBody::Dynamic,
                Collider::cuboid(PROP_SIZE / 2., PROP_SIZE / 2., PROP_SIZE / 2.),
                Velocity::default(),
                CollisionGroups::new(PROPS_GROUP, ALL_GROUPS),
            ));
    }

    commands
        .spawn(PbrBundle {
            mesh: meshes.add(shape::Cube { size: LASER_CUBE_SIZE }.into()),
            material: materials.add(StandardMaterial {
                base_color: Color::AQUAMARINE,
                metallic: 0.8,
                perceptual_roughness: 0.2,
                ..default()
            }),
            transform: Transform::from_xyz(0., LASER_CUBE_SIZE, -250.)
                .with_rotation(Quat::from_rotation_y(0.6)),
            ..default()
        })
        .insert((
            Name::from("Laser cube"),
            Grabbable,
            LaserCube,
            RigidBody::Dynamic,
            Collider::cuboid(
                LASER_CUBE_SIZE / 2.,
                LASER_CUBE_SIZE / 2.,
                LASER_CUBE_SIZE / 2.,
            ),
            Velocity::default(),
            CollisionGroups::new(PROPS_GROUP, ALL_GROUPS),
        ));
}
