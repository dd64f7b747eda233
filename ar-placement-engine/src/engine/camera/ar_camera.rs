use bevy::prelude::*;

use crate::engine::core::settings::ArSettings;
use crate::xr::platform::CurrentFrame;

#[derive(Component, Debug, Default)]
pub struct ArCamera;

pub fn spawn_ar_camera(mut commands: Commands, settings: Res<ArSettings>) {
    let camera = &settings.camera;
    info!(
        "AR camera: fov {}°, near {}, far {}",
        camera.fov_degrees, camera.near, camera.far
    );

    commands.spawn((
        Name::new("ArCamera"),
        ArCamera,
        Camera3d::default(),
        Camera {
            clear_color: clear_colour(),
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        Transform::default(),
    ));
}

/// Transparent on the web so the passthrough feed shows behind the scene.
fn clear_colour() -> ClearColorConfig {
    #[cfg(target_arch = "wasm32")]
    {
        ClearColorConfig::Custom(Color::NONE)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        ClearColorConfig::Custom(constants::simulation::SIM_BACKGROUND_COLOUR)
    }
}

/// Follow the viewer pose of the current frame. Frames without one leave the camera in place.
pub fn sync_camera_to_viewer(
    current: Res<CurrentFrame>,
    mut cameras: Query<&mut Transform, With<ArCamera>>,
) {
    let Some(viewer) = current.0.as_ref().and_then(|frame| frame.viewer) else {
        return;
    };

    for mut transform in &mut cameras {
        *transform = viewer.to_transform();
    }
}
