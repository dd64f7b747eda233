use bevy::asset::LoadState;
use bevy::prelude::*;

use super::animation::PlacedAnimations;
use super::state::{
    LoadedModel, ModelLoadOutcome, PendingPlacement, PlacedObject, PlacementAnchor,
    PlacementState,
};
use crate::engine::core::settings::ArSettings;
use crate::engine::scene::reticle::Reticle;
use crate::xr::error::ArError;
use crate::xr::input::SelectEvent;
use crate::xr::platform::SessionId;
use crate::xr::pose::Pose;
use crate::xr::session::ArSession;

/// Why a select did not start a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectSkip {
    NoSession,
    ReticleHidden,
    AlreadyPlaced,
    LoadPending,
}

/// Session and pose to place at, or the reason the select is a no-op.
pub fn placement_decision(
    session: Option<&ArSession>,
    reticle_pose: Option<Pose>,
    state: &PlacementState,
) -> Result<(SessionId, Pose), SelectSkip> {
    let session = session.ok_or(SelectSkip::NoSession)?;
    let pose = reticle_pose.ok_or(SelectSkip::ReticleHidden)?;
    if session.placed_object().is_some() {
        return Err(SelectSkip::AlreadyPlaced);
    }
    if state.is_loading() {
        return Err(SelectSkip::LoadPending);
    }
    Ok((session.id(), pose))
}

/// Where the model goes. Only the translation of the chosen pose is used.
///
/// With [`PlacementAnchor::LoadCompletion`] a reticle hidden at completion
/// falls back to the pose seen at trigger time.
pub fn placement_translation(
    anchor: PlacementAnchor,
    reticle_pose: Option<Pose>,
    trigger_pose: Pose,
) -> Vec3 {
    match (anchor, reticle_pose) {
        (PlacementAnchor::LoadCompletion, Some(current)) => current.translation(),
        _ => trigger_pose.translation(),
    }
}

pub fn handle_select(
    mut selects: EventReader<SelectEvent>,
    session: Option<Res<ArSession>>,
    reticles: Query<&Reticle>,
    settings: Res<ArSettings>,
    asset_server: Res<AssetServer>,
    mut state: ResMut<PlacementState>,
) {
    for _ in selects.read() {
        let reticle_pose = reticles.iter().find_map(Reticle::pose);
        match placement_decision(session.as_deref(), reticle_pose, &state) {
            Ok((session, trigger_pose)) => {
                info!("Loading {} for placement", settings.model_path);
                state.begin(PendingPlacement {
                    session,
                    path: settings.model_path.clone(),
                    model: asset_server.load(settings.model_path.clone()),
                    trigger_pose,
                });
            }
            Err(skip) => debug!("Select ignored: {:?}", skip),
        }
    }
}

/// Report the pending load once it resolves either way.
pub fn poll_model_load(
    state: Res<PlacementState>,
    gltfs: Res<Assets<Gltf>>,
    asset_server: Res<AssetServer>,
    mut outcomes: EventWriter<ModelLoadOutcome>,
) {
    let Some(pending) = state.pending() else {
        return;
    };

    if let Some(gltf) = gltfs.get(&pending.model) {
        let scene = gltf
            .default_scene
            .clone()
            .or_else(|| gltf.scenes.first().cloned());
        let outcome = match scene {
            Some(scene) => ModelLoadOutcome::Loaded(LoadedModel {
                scene,
                clips: gltf.animations.clone(),
            }),
            None => ModelLoadOutcome::Failed(ArError::AssetLoad {
                path: pending.path.clone(),
                reason: "model contains no scene".into(),
            }),
        };
        outcomes.write(outcome);
    } else if let LoadState::Failed(err) = asset_server.load_state(&pending.model) {
        outcomes.write(ModelLoadOutcome::Failed(ArError::AssetLoad {
            path: pending.path.clone(),
            reason: err.to_string(),
        }));
    }
}

/// Spawn the loaded model, or re-arm the trigger after a failure.
///
/// Loads are not cancelled by session end: a model arriving after its session
/// is gone is still spawned, but no session records it.
pub fn complete_placement(
    mut outcomes: EventReader<ModelLoadOutcome>,
    mut state: ResMut<PlacementState>,
    mut session: Option<ResMut<ArSession>>,
    reticles: Query<&Reticle>,
    settings: Res<ArSettings>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    mut commands: Commands,
) {
    for outcome in outcomes.read() {
        let Some(pending) = state.take() else {
            continue;
        };

        let model = match outcome {
            ModelLoadOutcome::Loaded(model) => model,
            ModelLoadOutcome::Failed(err) => {
                warn!("{}, select again to retry", err);
                continue;
            }
        };

        let translation = placement_translation(
            settings.placement_anchor,
            reticles.iter().find_map(Reticle::pose),
            pending.trigger_pose,
        );

        let mut placed = commands.spawn((
            Name::new("PlacedObject"),
            PlacedObject {
                session: pending.session,
            },
            SceneRoot(model.scene.clone()),
            Transform::from_translation(translation)
                .with_scale(Vec3::splat(settings.model_scale)),
        ));
        if !model.clips.is_empty() {
            placed.insert(PlacedAnimations::from_clips(
                model.clips.iter().cloned(),
                &mut graphs,
            ));
        }
        let entity = placed.id();

        match session.as_deref_mut() {
            Some(active) if active.id() == pending.session => {
                info!(
                    "Placed {} at {:?} in session {}",
                    pending.path, translation, pending.session
                );
                active.mark_placed(entity);
            }
            _ => warn!(
                "Session {} ended before {} loaded, {:?} stays in the scene unowned",
                pending.session, pending.path, entity
            ),
        }
    }
}
