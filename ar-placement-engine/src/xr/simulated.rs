//! In-process AR device for native builds.
//!
//! The viewer walks over a flat floor (WASD, right-drag to look) and the
//! hit-test service reports where the centre of view meets that floor.

use std::sync::{Arc, Mutex};

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use constants::simulation::{
    SIM_FLOOR_HEIGHT, SIM_MAX_HIT_DISTANCE, SIM_MOVE_SPEED, SIM_SUPPORTED_FEATURES,
    SIM_VIEWER_HEIGHT, SIM_VIEWER_PITCH,
};

use super::error::ArError;
use super::platform::{
    ArFrame, ArPlatform, CancelToken, HitTestSourceId, PlatformEvent, PlatformMessages,
    SessionId, SessionRequest,
};
use super::pose::Pose;
use super::session::{EndArRequest, StartArRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub floor_height: f32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, SIM_FLOOR_HEIGHT + SIM_VIEWER_HEIGHT, 0.0),
            yaw: 0.0,
            pitch: SIM_VIEWER_PITCH,
            floor_height: SIM_FLOOR_HEIGHT,
        }
    }
}

impl DeviceState {
    pub fn viewer_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn viewer_pose(&self) -> Pose {
        Pose::from_translation_rotation(self.position, self.viewer_rotation())
    }

    /// Point where the view ray meets the floor, within hit-test range.
    pub fn floor_hit(&self) -> Option<Pose> {
        let direction = self.viewer_rotation() * Vec3::NEG_Z;
        if direction.y.abs() < 0.001 {
            return None;
        }
        let t = (self.floor_height - self.position.y) / direction.y;
        if t <= 0.0 || t > SIM_MAX_HIT_DISTANCE {
            return None;
        }
        Some(Pose::from_translation_rotation(
            self.position + direction * t,
            Quat::IDENTITY,
        ))
    }
}

/// Handle to the simulated device, shared by the platform and the input systems.
#[derive(Resource, Clone, Default)]
pub struct SimulatedDevice(Arc<Mutex<DeviceState>>);

impl SimulatedDevice {
    pub fn snapshot(&self) -> DeviceState {
        self.0.lock().map(|state| state.clone()).unwrap_or_default()
    }

    pub fn update(&self, apply: impl FnOnce(&mut DeviceState)) {
        if let Ok(mut state) = self.0.lock() {
            apply(&mut state);
        }
    }
}

pub struct SimulatedPlatform {
    device: SimulatedDevice,
    next_id: u64,
    session: Option<SessionId>,
    sources: Vec<HitTestSourceId>,
}

impl SimulatedPlatform {
    pub fn new(device: SimulatedDevice) -> Self {
        Self {
            device,
            next_id: 1,
            session: None,
            sources: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl ArPlatform for SimulatedPlatform {
    fn name(&self) -> &'static str {
        "simulated device"
    }

    fn request_session(&mut self, request: &SessionRequest, messages: &PlatformMessages) {
        if let Some(active) = self.session {
            messages.push(PlatformEvent::SessionRejected(ArError::SessionUnavailable(
                format!("session {active} is already running"),
            )));
            return;
        }

        let unsupported = request
            .required_features
            .iter()
            .find(|feature| !SIM_SUPPORTED_FEATURES.contains(&feature.as_str()));
        if let Some(feature) = unsupported {
            messages.push(PlatformEvent::SessionRejected(ArError::FeatureUnsupported(
                feature.clone(),
            )));
            return;
        }

        let id = SessionId(self.allocate_id());
        self.session = Some(id);
        self.sources.clear();
        messages.push(PlatformEvent::SessionGranted(id));
    }

    fn request_hit_test_source(
        &mut self,
        session: SessionId,
        cancel: CancelToken,
        messages: &PlatformMessages,
    ) {
        if cancel.is_cancelled() {
            return;
        }
        if self.session != Some(session) {
            messages.push(PlatformEvent::HitTestFailed {
                session,
                error: ArError::HitTestSetup(format!("session {session} is not running")),
            });
            return;
        }

        let source = HitTestSourceId(self.allocate_id());
        self.sources.push(source);
        messages.push(PlatformEvent::HitTestReady { session, source });
    }

    fn poll_frame(&mut self) -> Option<ArFrame> {
        let session = self.session?;
        let device = self.device.snapshot();
        let ranked: Vec<Pose> = device.floor_hit().into_iter().collect();

        let mut frame = ArFrame::new(session, Some(device.viewer_pose()));
        for &source in &self.sources {
            frame = frame.with_hit_results(source, ranked.clone());
        }
        Some(frame)
    }

    fn end_session(&mut self, session: SessionId, messages: &PlatformMessages) {
        if self.session != Some(session) {
            return;
        }
        self.session = None;
        self.sources.clear();
        messages.push(PlatformEvent::SessionEnded(session));
    }
}

/// Enter starts a session, Escape ends it, left click or Space selects.
pub fn simulated_input_bindings(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    ui: Query<&Interaction>,
    messages: Res<PlatformMessages>,
    mut start: EventWriter<StartArRequest>,
    mut end: EventWriter<EndArRequest>,
) {
    if keyboard.just_pressed(KeyCode::Enter) {
        start.write(StartArRequest);
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        end.write(EndArRequest);
    }

    let pointer_on_ui = ui.iter().any(|interaction| *interaction != Interaction::None);
    let clicked = mouse_button.just_pressed(MouseButton::Left) && !pointer_on_ui;
    if clicked || keyboard.just_pressed(KeyCode::Space) {
        messages.push(PlatformEvent::Select);
    }
}

/// Walk and look around with the simulated device.
pub fn simulated_viewer_controller(
    device: Res<SimulatedDevice>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let looking = mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO;

    let mut move_input = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) { move_input.y += 1.0; }
    if keyboard.pressed(KeyCode::KeyS) { move_input.y -= 1.0; }
    if keyboard.pressed(KeyCode::KeyD) { move_input.x += 1.0; }
    if keyboard.pressed(KeyCode::KeyA) { move_input.x -= 1.0; }

    if !looking && move_input == Vec2::ZERO {
        return;
    }

    let dt = time.delta_secs();
    device.update(|state| {
        if looking {
            let yaw_sens = 0.0035;
            let pitch_sens = 0.0030;
            state.yaw += -mouse_delta.x * yaw_sens;
            state.pitch = (state.pitch - mouse_delta.y * pitch_sens).clamp(-1.55, 1.55);
        }

        if move_input != Vec2::ZERO {
            // Walk on the floor plane regardless of pitch.
            let heading = Quat::from_rotation_y(state.yaw);
            let forward = heading * Vec3::NEG_Z;
            let right = heading * Vec3::X;
            let step = (right * move_input.x + forward * move_input.y).normalize();
            state.position += step * SIM_MOVE_SPEED * dt;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted_session(platform: &mut SimulatedPlatform, messages: &PlatformMessages) -> SessionId {
        platform.request_session(&SessionRequest::immersive_ar(), messages);
        match messages.drain().as_slice() {
            [PlatformEvent::SessionGranted(id)] => *id,
            other => panic!("expected a grant, got {other:?}"),
        }
    }

    #[test]
    fn floor_hit_lies_on_the_floor_in_front_of_the_viewer() {
        let state = DeviceState::default();
        let hit = state.floor_hit().expect("default pitch looks at the floor");
        let point = hit.translation();

        assert!((point.y - SIM_FLOOR_HEIGHT).abs() < 1e-5);
        assert!(point.z < 0.0);
        assert!(point.x.abs() < 1e-5);
    }

    #[test]
    fn looking_at_the_horizon_finds_no_surface() {
        let state = DeviceState {
            pitch: 0.0,
            ..default()
        };
        assert!(state.floor_hit().is_none());

        let looking_up = DeviceState {
            pitch: 0.5,
            ..default()
        };
        assert!(looking_up.floor_hit().is_none());
    }

    #[test]
    fn rejects_sessions_needing_unsupported_features() {
        let mut platform = SimulatedPlatform::new(SimulatedDevice::default());
        let messages = PlatformMessages::default();
        let mut request = SessionRequest::immersive_ar();
        request.required_features.push("depth-sensing".into());

        platform.request_session(&request, &messages);

        assert_eq!(
            messages.drain(),
            vec![PlatformEvent::SessionRejected(ArError::FeatureUnsupported(
                "depth-sensing".into()
            ))]
        );
        assert!(platform.poll_frame().is_none());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let mut platform = SimulatedPlatform::new(SimulatedDevice::default());
        let messages = PlatformMessages::default();
        granted_session(&mut platform, &messages);

        platform.request_session(&SessionRequest::immersive_ar(), &messages);
        assert!(matches!(
            messages.drain().as_slice(),
            [PlatformEvent::SessionRejected(ArError::SessionUnavailable(_))]
        ));
    }

    #[test]
    fn frames_carry_hits_once_a_source_exists() {
        let mut platform = SimulatedPlatform::new(SimulatedDevice::default());
        let messages = PlatformMessages::default();
        let session = granted_session(&mut platform, &messages);

        let before = platform.poll_frame().expect("session is running");
        assert!(before.viewer.is_some());

        platform.request_hit_test_source(session, CancelToken::default(), &messages);
        let source = match messages.drain().as_slice() {
            [PlatformEvent::HitTestReady { source, .. }] => *source,
            other => panic!("expected a hit-test source, got {other:?}"),
        };

        let frame = platform.poll_frame().expect("session is running");
        assert_eq!(frame.hit_test_results(source).len(), 1);
    }

    #[test]
    fn cancelled_setup_publishes_nothing() {
        let mut platform = SimulatedPlatform::new(SimulatedDevice::default());
        let messages = PlatformMessages::default();
        let session = granted_session(&mut platform, &messages);

        let cancel = CancelToken::default();
        cancel.cancel();
        platform.request_hit_test_source(session, cancel, &messages);

        assert!(messages.drain().is_empty());
    }

    #[test]
    fn ending_confirms_and_stops_frames() {
        let mut platform = SimulatedPlatform::new(SimulatedDevice::default());
        let messages = PlatformMessages::default();
        let session = granted_session(&mut platform, &messages);

        platform.end_session(session, &messages);

        assert_eq!(messages.drain(), vec![PlatformEvent::SessionEnded(session)]);
        assert!(platform.poll_frame().is_none());
    }
}
