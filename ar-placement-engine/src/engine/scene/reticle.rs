use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use constants::reticle::RETICLE_COLOUR;

use crate::engine::core::settings::{ArSettings, ReticleSettings};
use crate::xr::hit_test::SurfacePoseSample;
use crate::xr::pose::Pose;
use crate::xr::session::{ArSessionEnded, ArSessionStarted};

/// Marker ring showing where a tap would place the model.
///
/// The platform matrix is kept verbatim; `Transform` is derived from it for
/// rendering only. The reticle is always a root entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Reticle {
    matrix: Mat4,
    visible: bool,
}

impl Reticle {
    /// Show the reticle at `pose`, or hide it and keep the last matrix.
    pub fn set_pose(&mut self, pose: Option<Pose>) {
        match pose {
            Some(pose) => {
                self.matrix = pose.matrix();
                self.visible = true;
            }
            None => self.visible = false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current pose, never the stale one left behind while hidden.
    pub fn pose(&self) -> Option<Pose> {
        self.visible.then(|| Pose::from_matrix(self.matrix))
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

pub fn spawn_reticle(
    mut commands: Commands,
    settings: Res<ArSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Reticle"),
        Reticle::default(),
        Mesh3d(meshes.add(reticle_mesh(&settings.reticle))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: RETICLE_COLOUR,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
    ));
}

/// Flat ring facing +Y in the surface's frame.
fn reticle_mesh(ring: &ReticleSettings) -> Mesh {
    Annulus::new(ring.inner_radius, ring.outer_radius)
        .mesh()
        .resolution(ring.segments)
        .build()
        .rotated_by(Quat::from_rotation_x(-FRAC_PI_2))
}

/// Apply this frame's surface sample. Frames without tracking data leave the
/// reticle as it was.
pub fn apply_surface_pose(
    mut samples: EventReader<SurfacePoseSample>,
    mut reticles: Query<(&mut Reticle, &mut Transform, &mut Visibility)>,
) {
    let Some(SurfacePoseSample(pose)) = samples.read().last().copied() else {
        return;
    };

    for (mut reticle, mut transform, mut visibility) in &mut reticles {
        reticle.set_pose(pose);
        match pose {
            Some(pose) => {
                *transform = pose.to_transform();
                *visibility = Visibility::Visible;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

/// A session boundary invalidates whatever the reticle showed.
pub fn reset_reticle_on_session_change(
    mut started: EventReader<ArSessionStarted>,
    mut ended: EventReader<ArSessionEnded>,
    mut reticles: Query<(&mut Reticle, &mut Visibility)>,
) {
    if started.read().count() + ended.read().count() == 0 {
        return;
    }
    for (mut reticle, mut visibility) in &mut reticles {
        reticle.set_pose(None);
        *visibility = Visibility::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;
    use constants::reticle::RETICLE_OUTER_RADIUS;

    fn pose_at(translation: Vec3, yaw: f32) -> Pose {
        Pose::from_translation_rotation(translation, Quat::from_rotation_y(yaw))
    }

    fn reticle_app() -> (App, Entity) {
        let mut app = App::new();
        app.add_event::<SurfacePoseSample>()
            .add_event::<ArSessionStarted>()
            .add_event::<ArSessionEnded>()
            .add_systems(
                Update,
                (apply_surface_pose, reset_reticle_on_session_change).chain(),
            );
        let entity = app
            .world_mut()
            .spawn((Reticle::default(), Transform::default(), Visibility::Hidden))
            .id();
        (app, entity)
    }

    #[test]
    fn found_pose_is_copied_verbatim() {
        let mut reticle = Reticle::default();
        let pose = pose_at(Vec3::new(0.3, -1.2, -2.0), 0.7);

        reticle.set_pose(Some(pose));

        assert!(reticle.is_visible());
        assert_eq!(reticle.matrix(), pose.matrix());
        assert_eq!(reticle.pose(), Some(pose));
    }

    #[test]
    fn missing_pose_hides_and_keeps_matrix() {
        let mut reticle = Reticle::default();
        let pose = pose_at(Vec3::new(1.0, 0.0, -1.0), 0.0);
        reticle.set_pose(Some(pose));

        reticle.set_pose(None);

        assert!(!reticle.is_visible());
        assert_eq!(reticle.matrix(), pose.matrix());
        assert_eq!(reticle.pose(), None);
    }

    #[test]
    fn ring_mesh_follows_configured_segments() {
        let ring = ReticleSettings {
            segments: 48,
            ..default()
        };

        let mesh = reticle_mesh(&ring);

        // One inner and one outer vertex per step, plus the duplicated seam pair.
        assert_eq!(mesh.count_vertices(), (48 + 1) * 2);
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("ring mesh has no positions");
        };
        assert!(positions.iter().all(|p| p[1].abs() < 1e-6));
        assert!(
            positions
                .iter()
                .all(|p| Vec2::new(p[0], p[2]).length() <= RETICLE_OUTER_RADIUS + 1e-6)
        );
    }

    #[test]
    fn samples_drive_visibility_and_transform() {
        let (mut app, entity) = reticle_app();
        let pose = pose_at(Vec3::new(0.0, 0.0, -1.5), 0.0);

        app.world_mut().send_event(SurfacePoseSample(Some(pose)));
        app.update();
        let world = app.world();
        assert_eq!(world.get::<Visibility>(entity), Some(&Visibility::Visible));
        assert_eq!(
            world.get::<Transform>(entity).map(|t| t.translation),
            Some(Vec3::new(0.0, 0.0, -1.5))
        );

        app.world_mut().send_event(SurfacePoseSample(None));
        app.update();
        let world = app.world();
        assert_eq!(world.get::<Visibility>(entity), Some(&Visibility::Hidden));
        assert_eq!(
            world.get::<Reticle>(entity).map(Reticle::matrix),
            Some(pose.matrix())
        );
    }

    #[test]
    fn frames_without_tracking_data_change_nothing() {
        let (mut app, entity) = reticle_app();
        let pose = pose_at(Vec3::new(0.5, 0.0, -0.5), 0.0);
        app.world_mut().send_event(SurfacePoseSample(Some(pose)));
        app.update();

        app.update();
        app.update();

        let reticle = app.world().get::<Reticle>(entity).copied();
        assert_eq!(reticle.and_then(|r| r.pose()), Some(pose));
    }

    #[test]
    fn session_end_hides_the_reticle() {
        let (mut app, entity) = reticle_app();
        app.world_mut().send_event(SurfacePoseSample(Some(pose_at(Vec3::ZERO, 0.0))));
        app.update();

        app.world_mut()
            .send_event(ArSessionEnded(crate::xr::platform::SessionId(1)));
        app.update();

        assert_eq!(app.world().get::<Visibility>(entity), Some(&Visibility::Hidden));
        assert!(!app.world().get::<Reticle>(entity).is_some_and(Reticle::is_visible));
    }
}
