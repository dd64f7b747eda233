use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::placement::{MODEL_ASSET_PATH, MODEL_SCALE, SETTINGS_PATH};
use constants::render_settings::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR};
use constants::reticle::{RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS, RETICLE_SEGMENTS};
use serde::{Deserialize, Serialize};

use super::app_state::AppState;
use crate::placement::state::PlacementAnchor;

/// Runtime settings read from `config/scene.ar.json`.
/// Every field is optional in the file and falls back to the compiled-in default.
#[derive(Resource, Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArSettings {
    /// glTF model placed on tap, relative to the asset root.
    pub model_path: String,
    pub model_scale: f32,
    pub placement_anchor: PlacementAnchor,
    pub reticle: ReticleSettings,
    pub camera: CameraSettings,
}

impl Default for ArSettings {
    fn default() -> Self {
        Self {
            model_path: MODEL_ASSET_PATH.to_string(),
            model_scale: MODEL_SCALE,
            placement_anchor: PlacementAnchor::default(),
            reticle: ReticleSettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleSettings {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
}

impl Default for ReticleSettings {
    fn default() -> Self {
        Self {
            inner_radius: RETICLE_INNER_RADIUS,
            outer_radius: RETICLE_OUTER_RADIUS,
            segments: RETICLE_SEGMENTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        }
    }
}

#[derive(Resource, Default)]
pub struct SettingsLoader {
    handle: Option<Handle<ArSettings>>,
}

pub fn start_loading(mut loader: ResMut<SettingsLoader>, asset_server: Res<AssetServer>) {
    info!("Loading settings from: {}", SETTINGS_PATH);
    loader.handle = Some(asset_server.load(SETTINGS_PATH));
}

/// Publish the settings resource and enter `AppState::Running`.
/// A missing or unreadable file falls back to defaults.
pub fn load_settings_system(
    loader: Res<SettingsLoader>,
    settings_assets: Res<Assets<ArSettings>>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(ref handle) = loader.handle else {
        return;
    };

    let settings = if let Some(settings) = settings_assets.get(handle) {
        info!("✓ Settings loaded: {:?}", settings);
        settings.clone()
    } else if let LoadState::Failed(err) = asset_server.load_state(handle) {
        warn!("Settings unavailable ({}), using defaults", err);
        ArSettings::default()
    } else {
        return;
    };

    commands.insert_resource(settings);
    info!("→ Transitioning to Running state");
    next_state.set(AppState::Running);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let settings: ArSettings = serde_json::from_str(
            r#"{ "model_scale": 0.5, "reticle": { "segments": 64 } }"#,
        )
        .unwrap();

        assert_eq!(settings.model_scale, 0.5);
        assert_eq!(settings.reticle.segments, 64);
        assert_eq!(settings.reticle.inner_radius, RETICLE_INNER_RADIUS);
        assert_eq!(settings.model_path, MODEL_ASSET_PATH);
        assert_eq!(settings.placement_anchor, PlacementAnchor::LoadCompletion);
        assert_eq!(settings.camera, CameraSettings::default());
    }

    #[test]
    fn anchor_policy_is_snake_case() {
        let settings: ArSettings =
            serde_json::from_str(r#"{ "placement_anchor": "trigger" }"#).unwrap();
        assert_eq!(settings.placement_anchor, PlacementAnchor::Trigger);
    }

    #[test]
    fn bundled_settings_file_parses() {
        let raw = include_str!("../../../assets/config/scene.ar.json");
        let settings: ArSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings, ArSettings::default());
    }
}
