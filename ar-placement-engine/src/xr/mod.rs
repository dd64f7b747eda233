//! AR platform integration: sessions, surface tracking and user input.
//!
//! ## Frame Loop
//!
//! Every Bevy `Update` runs the AR frame in four chained stages:
//!
//! ```text
//! ArFrameSet::Ingest   drain PlatformMessages -> session lifecycle, SelectEvent
//!                      forward StartArRequest / EndArRequest to the platform
//! ArFrameSet::Track    sample the platform frame -> PoseTracker -> SurfacePoseSample
//! ArFrameSet::Present  reticle + camera follow the sampled poses
//! ArFrameSet::Place    select handling and model placement
//! ```
//!
//! Rendering and animation playback happen afterwards in Bevy's own schedules.
//!
//! ## Platform Seam
//!
//! [`platform::ArPlatform`] is implemented by:
//! - [`web::WebXrPlatform`] on wasm32, backed by the browser's WebXR runtime
//! - [`simulated::SimulatedPlatform`] on native, a walkable floor plane
//!
//! Platform callbacks never touch the ECS. They push [`platform::PlatformEvent`]s
//! onto a shared queue that `Ingest` drains once per frame, which keeps every
//! completion ordered relative to the frame loop.
//!
//! ## Session Scope
//!
//! A granted session is represented by the [`session::ArSession`] resource. It
//! owns the session's [`hit_test::PoseTracker`] and placed-object record and is
//! removed when the platform reports the session ended; dropping it cancels
//! any hit-test setup still in flight.

/// Typed failures reported by the platform and the model loader.
pub mod error;


/// User input delivered through the platform queue.
pub mod input;

/// Platform trait, message queue and per-frame tracking data.
pub mod platform;

/// Rigid transforms reported by the platform.
pub mod pose;

/// Session lifecycle and the session-scoped context.
pub mod session;

/// Simulated AR device for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub mod simulated;

/// WebXR backend for browser builds.
#[cfg(target_arch = "wasm32")]
pub mod web;

use bevy::prelude::*;

use crate::engine::core::app_state::AppState;
use hit_test::{SurfacePoseSample, sample_platform_frame, track_surface_pose};
use input::SelectEvent;
use platform::{CurrentFrame, Platform, PlatformMessages};
use session::{
    ArSessionEnded, ArSessionStarted, ArSessionState, EndArRequest, StartArRequest,
    dispatch_platform_events, request_session_end, request_session_start,
};

/// Stages of one AR frame, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArFrameSet {
    Ingest,
    Track,
    Present,
    Place,
}

/// Registers the platform backend, session lifecycle and surface tracking.
///
/// A [`Platform`] inserted before this plugin is kept; otherwise the default
/// backend for the target is created.
pub struct XrPlugin;

impl Plugin for XrPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlatformMessages>()
            .init_resource::<CurrentFrame>()
            .init_state::<ArSessionState>()
            .add_event::<StartArRequest>()
            .add_event::<EndArRequest>()
            .add_event::<ArSessionStarted>()
            .add_event::<ArSessionEnded>()
            .add_event::<SelectEvent>()
            .add_event::<SurfacePoseSample>()
            .configure_sets(
                Update,
                (
                    ArFrameSet::Ingest,
                    ArFrameSet::Track,
                    ArFrameSet::Present,
                    ArFrameSet::Place,
                )
                    .chain()
                    .distributive_run_if(in_state(AppState::Running)),
            )
            .add_systems(
                Update,
                (
                    dispatch_platform_events,
                    request_session_start,
                    request_session_end,
                )
                    .chain()
                    .in_set(ArFrameSet::Ingest),
            )
            .add_systems(
                Update,
                (sample_platform_frame, track_surface_pose)
                    .chain()
                    .in_set(ArFrameSet::Track),
            );

        if !app.world().contains_non_send::<Platform>() {
            let messages = app.world().resource::<PlatformMessages>().clone();
            let platform = create_platform(app, &messages);
            info!("AR platform: {}", platform.name());
            app.insert_non_send_resource(platform);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_platform(app: &mut App, _messages: &PlatformMessages) -> Platform {
    let device = simulated::SimulatedDevice::default();
    app.insert_resource(device.clone());
    Platform::new(simulated::SimulatedPlatform::new(device))
}

#[cfg(target_arch = "wasm32")]
fn create_platform(_app: &mut App, messages: &PlatformMessages) -> Platform {
    Platform::new(web::WebXrPlatform::new(messages))
}
