//! Headless frame-loop harness shared by the app-level tests.

use std::cell::RefCell;
use std::rc::Rc;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::engine::core::app_state::AppState;
use crate::engine::core::settings::ArSettings;
use crate::engine::scene::reticle::{
    Reticle, apply_surface_pose, reset_reticle_on_session_change,
};
use crate::placement::PlacementPlugin;
use crate::xr::platform::{
    ArFrame, ArPlatform, CancelToken, Platform, PlatformMessages, SessionId, SessionRequest,
};
use crate::xr::{ArFrameSet, XrPlugin};

/// What the frame loop asked of the platform, and what it will answer.
#[derive(Default)]
pub struct Script {
    pub session_requests: usize,
    pub hit_test_requests: Vec<(SessionId, CancelToken)>,
    pub ended: Vec<SessionId>,
    /// Returned by every `poll_frame` until changed.
    pub frame: Option<ArFrame>,
}

/// Platform double that records requests and never answers on its own.
/// Tests push the completions they want onto `PlatformMessages`.
pub struct ScriptedPlatform {
    script: Rc<RefCell<Script>>,
}

impl ScriptedPlatform {
    pub fn new() -> (Self, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script::default()));
        (
            Self {
                script: script.clone(),
            },
            script,
        )
    }
}

impl ArPlatform for ScriptedPlatform {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn request_session(&mut self, _request: &SessionRequest, _messages: &PlatformMessages) {
        self.script.borrow_mut().session_requests += 1;
    }

    fn request_hit_test_source(
        &mut self,
        session: SessionId,
        cancel: CancelToken,
        _messages: &PlatformMessages,
    ) {
        self.script
            .borrow_mut()
            .hit_test_requests
            .push((session, cancel));
    }

    fn poll_frame(&mut self) -> Option<ArFrame> {
        self.script.borrow().frame.clone()
    }

    fn end_session(&mut self, session: SessionId, _messages: &PlatformMessages) {
        self.script.borrow_mut().ended.push(session);
    }
}

/// App running the AR frame loop against `platform`, already in `AppState::Running`.
pub fn frame_loop_app(platform: ScriptedPlatform) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, AssetPlugin::default()))
        .init_asset::<Gltf>()
        .init_asset::<Scene>()
        .init_asset::<AnimationClip>()
        .init_asset::<AnimationGraph>()
        .insert_state(AppState::Running)
        .insert_resource(ArSettings::default())
        .insert_non_send_resource(Platform::new(platform))
        .add_plugins((XrPlugin, PlacementPlugin))
        .add_systems(
            Update,
            (apply_surface_pose, reset_reticle_on_session_change)
                .chain()
                .in_set(ArFrameSet::Present),
        );

    app.world_mut()
        .spawn((Reticle::default(), Transform::default(), Visibility::Hidden));
    app
}
