use bevy::prelude::*;
use constants::simulation::{SIM_FLOOR_COLOUR, SIM_FLOOR_HALF_SIZE};

use crate::xr::simulated::SimulatedDevice;

#[derive(Component)]
pub struct SimulatedFloor;

/// Draw the plane the simulated hit tests resolve against.
pub fn spawn_simulated_floor(
    mut commands: Commands,
    device: Option<Res<SimulatedDevice>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(device) = device else {
        return;
    };
    let height = device.snapshot().floor_height;

    commands.spawn((
        Name::new("SimulatedFloor"),
        SimulatedFloor,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(
            SIM_FLOOR_HALF_SIZE * 2.0,
            SIM_FLOOR_HALF_SIZE * 2.0,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: SIM_FLOOR_COLOUR,
            perceptual_roughness: 1.0,
            ..default()
        })),
        // Sink slightly so the reticle never z-fights with it.
        Transform::from_xyz(0.0, height - 0.002, 0.0),
    ));
}
