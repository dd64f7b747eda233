use bevy::prelude::*;

use super::hit_test::PoseTracker;
use super::input::SelectEvent;
use super::platform::{Platform, PlatformEvent, PlatformMessages, SessionId, SessionRequest};

/// Coarse session lifecycle, used for run conditions and status display.
#[derive(States, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ArSessionState {
    #[default]
    Idle,
    Requesting,
    Active,
}

/// Ask the platform for an immersive AR session.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct StartArRequest;

/// Ask the platform to end the active session.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct EndArRequest;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArSessionStarted(pub SessionId);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArSessionEnded(pub SessionId);

/// State owned by one granted session.
///
/// Inserted when the platform grants a session and removed when it ends, so
/// nothing carries over into the next session.
#[derive(Resource, Debug)]
pub struct ArSession {
    id: SessionId,
    tracker: PoseTracker,
    placed_object: Option<Entity>,
}

impl ArSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            tracker: PoseTracker::new(id),
            placed_object: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tracker(&self) -> &PoseTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PoseTracker {
        &mut self.tracker
    }

    pub fn placed_object(&self) -> Option<Entity> {
        self.placed_object
    }

    pub fn mark_placed(&mut self, entity: Entity) {
        self.placed_object = Some(entity);
    }
}

/// Apply everything the platform queued since the last frame.
pub fn dispatch_platform_events(
    messages: Res<PlatformMessages>,
    mut session: Option<ResMut<ArSession>>,
    mut commands: Commands,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut started: EventWriter<ArSessionStarted>,
    mut ended: EventWriter<ArSessionEnded>,
    mut selects: EventWriter<SelectEvent>,
) {
    // Tracks insertions and removals queued earlier in this batch.
    let mut active = session.as_ref().map(|s| s.id());

    for event in messages.drain() {
        match event {
            PlatformEvent::SessionRequested => match active {
                Some(current) => debug!("Session {} is running, ignoring new request", current),
                None => next_state.set(ArSessionState::Requesting),
            },
            PlatformEvent::SessionGranted(id) => {
                if let Some(current) = active {
                    warn!("Session {} granted while {} is still active", id, current);
                    continue;
                }
                info!("AR session {} started", id);
                commands.insert_resource(ArSession::new(id));
                active = Some(id);
                next_state.set(ArSessionState::Active);
                started.write(ArSessionStarted(id));
            }
            PlatformEvent::SessionRejected(error) => {
                error!("{}", error);
                if active.is_none() {
                    next_state.set(ArSessionState::Idle);
                }
            }
            PlatformEvent::SessionEnded(id) => {
                if active != Some(id) {
                    debug!("Ignoring end of inactive session {}", id);
                    continue;
                }
                info!("AR session {} ended", id);
                commands.remove_resource::<ArSession>();
                active = None;
                next_state.set(ArSessionState::Idle);
                ended.write(ArSessionEnded(id));
            }
            PlatformEvent::HitTestReady { session: id, source } => match session.as_deref_mut() {
                Some(current) if current.id() == id => current.tracker_mut().on_source_ready(source),
                _ => debug!("Dropping hit-test source for stale session {}", id),
            },
            PlatformEvent::HitTestFailed { session: id, error } => match session.as_deref_mut() {
                Some(current) if current.id() == id => current.tracker_mut().on_setup_failed(&error),
                _ => debug!("Dropping hit-test failure for stale session {}: {}", id, error),
            },
            PlatformEvent::Select => {
                selects.write(SelectEvent);
            }
        }
    }
}

/// Forward start requests to the platform while no session exists.
pub fn request_session_start(
    mut requests: EventReader<StartArRequest>,
    state: Res<State<ArSessionState>>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut platform: NonSendMut<Platform>,
    messages: Res<PlatformMessages>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if *state.get() != ArSessionState::Idle {
        debug!("Start request ignored, session state is {:?}", state.get());
        return;
    }

    let request = SessionRequest::immersive_ar();
    info!(
        "Requesting {} session from {} (required: {:?})",
        request.mode.as_str(),
        platform.name(),
        request.required_features
    );
    platform.backend().request_session(&request, &messages);
    next_state.set(ArSessionState::Requesting);
}

pub fn request_session_end(
    mut requests: EventReader<EndArRequest>,
    session: Option<Res<ArSession>>,
    mut platform: NonSendMut<Platform>,
    messages: Res<PlatformMessages>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if let Some(session) = session {
        info!("Ending AR session {}", session.id());
        platform.backend().end_session(session.id(), &messages);
    }
}
