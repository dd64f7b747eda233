use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::placement::SETTINGS_EXTENSION;
use constants::render_settings::{
    AMBIENT_BRIGHTNESS, DEFAULT_LOG_FILTER, GROUND_LIGHT_COLOUR, KEY_LIGHT_ILLUMINANCE,
    SKY_LIGHT_COLOUR,
};

use crate::engine::camera::ar_camera::{spawn_ar_camera, sync_camera_to_viewer};
use crate::engine::core::app_state::AppState;
use crate::engine::core::settings::{
    ArSettings, SettingsLoader, load_settings_system, start_loading,
};
use crate::engine::core::window_config::create_window_config;
use crate::engine::scene::reticle::{
    apply_surface_pose, reset_reticle_on_session_change, spawn_reticle,
};
use crate::placement::PlacementPlugin;
use crate::xr::{ArFrameSet, XrPlugin};

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::scene::floor::spawn_simulated_floor;
#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::hud::{
    fps_text_update_system, session_button_interaction, session_button_label, spawn_hud,
    status_text_update_system,
};
#[cfg(not(target_arch = "wasm32"))]
use crate::xr::simulated::{simulated_input_bindings, simulated_viewer_controller};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers ArSettings as a loadable asset type from `*.ar.json` files.
        .add_plugins(JsonAssetPlugin::<ArSettings>::new(&[SETTINGS_EXTENSION]))
        .add_plugins(XrPlugin)
        .add_plugins(PlacementPlugin);

    app.init_resource::<SettingsLoader>();

    // Settings first; the AR frame sets only run once they are in place.
    app.add_systems(Startup, (setup, start_loading))
        .add_systems(
            Update,
            load_settings_system.run_if(in_state(AppState::Loading)),
        )
        .add_systems(
            OnEnter(AppState::Running),
            (spawn_ar_camera, spawn_reticle),
        )
        .add_systems(
            Update,
            (
                apply_surface_pose,
                reset_reticle_on_session_change,
                sync_camera_to_viewer,
            )
                .chain()
                .in_set(ArFrameSet::Present),
        );

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(OnEnter(AppState::Running), spawn_simulated_floor)
            .add_systems(
                Update,
                (
                    session_button_interaction,
                    simulated_input_bindings,
                    simulated_viewer_controller,
                )
                    .before(ArFrameSet::Ingest)
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(
                Update,
                (
                    fps_text_update_system,
                    session_button_label,
                    status_text_update_system,
                )
                    .after(ArFrameSet::Place)
                    .run_if(in_state(AppState::Running)),
            );
    }

    app
}

fn setup(mut commands: Commands) {
    info!("=== AR PLACEMENT ENGINE ===");
    spawn_lighting(&mut commands);

    #[cfg(not(target_arch = "wasm32"))]
    {
        spawn_hud(&mut commands);
    }
}

/// Cool ambient fill from below, white key light from above.
fn spawn_lighting(commands: &mut Commands) {
    commands.insert_resource(AmbientLight {
        color: GROUND_LIGHT_COLOUR,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            color: SKY_LIGHT_COLOUR,
            illuminance: KEY_LIGHT_ILLUMINANCE,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    // RUST_LOG overrides the filter when set.
    let log_config = LogPlugin {
        level: Level::INFO,
        filter: DEFAULT_LOG_FILTER.into(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
