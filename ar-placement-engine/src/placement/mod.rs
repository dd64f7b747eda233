//! Tap-to-place of the configured model.
//!
//! ```text
//! SelectEvent ──► handle_select ──► PlacementState (one pending load)
//!                                        │
//!                 poll_model_load ◄──────┘  Assets<Gltf> / LoadState
//!                        │
//!                 ModelLoadOutcome ──► complete_placement ──► SceneRoot + PlacedObject
//!                                                               │
//!                          SceneInstanceReady ──► start_clips_on_ready
//! ```
//!
//! A session places at most one object. A failed load leaves nothing placed,
//! so the next select retries.

/// Animation playback for placed models.
pub mod animation;

/// Select handling, load polling and spawning of the placed model.
pub mod placer;

/// Pending-load bookkeeping and placement components.
pub mod state;

use bevy::prelude::*;

use crate::xr::ArFrameSet;
use animation::start_clips_on_ready;
use placer::{complete_placement, handle_select, poll_model_load};
use state::{ModelLoadOutcome, PlacementState};

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementState>()
            .add_event::<ModelLoadOutcome>()
            .add_systems(
                Update,
                (handle_select, poll_model_load, complete_placement)
                    .chain()
                    .in_set(ArFrameSet::Place),
            )
            .add_observer(start_clips_on_ready);
    }
}
