use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use super::error::ArError;
use super::pose::Pose;

/// Identifies one granted AR session. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a hit-test subscription created by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    ImmersiveAr,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmersiveAr => "immersive-ar",
        }
    }
}

/// Parameters of a session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: SessionMode,
    pub required_features: Vec<String>,
}

impl SessionRequest {
    /// Immersive AR with every feature in `constants::session::REQUIRED_FEATURES` required.
    pub fn immersive_ar() -> Self {
        Self {
            mode: SessionMode::ImmersiveAr,
            required_features: constants::session::REQUIRED_FEATURES
                .iter()
                .map(|feature| feature.to_string())
                .collect(),
        }
    }
}

/// Completions and input delivered by the platform outside the frame cadence.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A start control issued a request on its own (web user-activation path).
    SessionRequested,
    SessionGranted(SessionId),
    SessionRejected(ArError),
    SessionEnded(SessionId),
    HitTestReady {
        session: SessionId,
        source: HitTestSourceId,
    },
    HitTestFailed {
        session: SessionId,
        error: ArError,
    },
    /// Primary user action (screen tap / controller trigger).
    Select,
}

/// Queue shared between platform callbacks and the frame loop.
///
/// Callbacks push from wherever the platform invokes them; the frame loop
/// drains the whole queue once per frame, in arrival order.
#[derive(Resource, Clone, Default)]
pub struct PlatformMessages(Arc<Mutex<VecDeque<PlatformEvent>>>);

impl PlatformMessages {
    pub fn push(&self, event: PlatformEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(event);
        }
    }

    pub fn drain(&self) -> Vec<PlatformEvent> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Cancellation flag shared with an in-flight platform request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tracking data for one display frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ArFrame {
    pub session: SessionId,
    /// Pose of the viewer in the session reference space.
    pub viewer: Option<Pose>,
    hit_results: Vec<(HitTestSourceId, Vec<Pose>)>,
}

impl ArFrame {
    pub fn new(session: SessionId, viewer: Option<Pose>) -> Self {
        Self {
            session,
            viewer,
            hit_results: Vec::new(),
        }
    }

    /// Attach ranked results (best first) for `source`.
    pub fn with_hit_results(mut self, source: HitTestSourceId, ranked: Vec<Pose>) -> Self {
        self.hit_results.push((source, ranked));
        self
    }

    /// Ranked hit results for `source` in this frame; empty when the source produced none.
    pub fn hit_test_results(&self, source: HitTestSourceId) -> &[Pose] {
        self.hit_results
            .iter()
            .find(|(id, _)| *id == source)
            .map(|(_, poses)| poses.as_slice())
            .unwrap_or(&[])
    }
}

/// Seam between the frame loop and the device's AR runtime.
///
/// Request methods never block: their outcome arrives later as a
/// [`PlatformEvent`] pushed onto the supplied queue.
pub trait ArPlatform: 'static {
    fn name(&self) -> &'static str;

    fn request_session(&mut self, request: &SessionRequest, messages: &PlatformMessages);

    /// Resolve a viewer reference space, then a hit-test source anchored to it.
    /// Nothing is published once `cancel` fires.
    fn request_hit_test_source(
        &mut self,
        session: SessionId,
        cancel: CancelToken,
        messages: &PlatformMessages,
    );

    /// Tracking data for the current display frame, if the platform has any.
    fn poll_frame(&mut self) -> Option<ArFrame>;

    /// End `session`; the platform confirms with [`PlatformEvent::SessionEnded`].
    fn end_session(&mut self, session: SessionId, messages: &PlatformMessages);
}

/// Non-send resource owning the active platform backend.
pub struct Platform(Box<dyn ArPlatform>);

impl Platform {
    pub fn new(backend: impl ArPlatform) -> Self {
        Self(Box::new(backend))
    }

    pub fn backend(&mut self) -> &mut dyn ArPlatform {
        self.0.as_mut()
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// Tracking data sampled for the frame being processed.
///
/// Overwritten every frame so poses never outlive the frame they belong to.
#[derive(Resource, Default, Debug)]
pub struct CurrentFrame(pub Option<ArFrame>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_drain_in_arrival_order() {
        let messages = PlatformMessages::default();
        let callback_side = messages.clone();

        callback_side.push(PlatformEvent::SessionGranted(SessionId(1)));
        callback_side.push(PlatformEvent::Select);

        assert_eq!(
            messages.drain(),
            vec![
                PlatformEvent::SessionGranted(SessionId(1)),
                PlatformEvent::Select
            ]
        );
        assert!(messages.drain().is_empty());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancelToken::default();
        let in_flight = token.clone();
        assert!(!in_flight.is_cancelled());
        token.cancel();
        assert!(in_flight.is_cancelled());
    }

    #[test]
    fn hit_results_are_scoped_to_their_source() {
        let near = Pose::from_translation_rotation(Vec3::new(0.0, 0.0, -1.0), Quat::IDENTITY);
        let far = Pose::from_translation_rotation(Vec3::new(0.0, 0.0, -3.0), Quat::IDENTITY);
        let frame = ArFrame::new(SessionId(4), None)
            .with_hit_results(HitTestSourceId(1), vec![near, far]);

        assert_eq!(frame.hit_test_results(HitTestSourceId(1)), &[near, far]);
        assert!(frame.hit_test_results(HitTestSourceId(2)).is_empty());
    }

    #[test]
    fn immersive_request_requires_hit_test() {
        let request = SessionRequest::immersive_ar();
        assert_eq!(request.mode.as_str(), "immersive-ar");
        assert!(request.required_features.iter().any(|f| f == "hit-test"));
    }
}
