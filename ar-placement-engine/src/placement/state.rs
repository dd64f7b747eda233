use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::xr::error::ArError;
use crate::xr::platform::SessionId;
use crate::xr::pose::Pose;

/// When the placement position is sampled from the reticle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAnchor {
    /// Where the reticle is when the model finishes loading.
    #[default]
    LoadCompletion,
    /// Where the reticle was when the user tapped.
    Trigger,
}

/// A model load started by a select, waiting to be placed.
#[derive(Debug, Clone)]
pub struct PendingPlacement {
    pub session: SessionId,
    pub path: String,
    pub model: Handle<Gltf>,
    pub trigger_pose: Pose,
}

/// At most one model load is in flight at a time.
#[derive(Resource, Debug, Default)]
pub struct PlacementState {
    pending: Option<PendingPlacement>,
}

impl PlacementState {
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingPlacement> {
        self.pending.as_ref()
    }

    pub fn begin(&mut self, placement: PendingPlacement) {
        self.pending = Some(placement);
    }

    pub fn take(&mut self) -> Option<PendingPlacement> {
        self.pending.take()
    }
}

/// A model instance placed on a tracked surface.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedObject {
    /// Session that requested it. It may have ended before the model arrived.
    pub session: SessionId,
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub scene: Handle<Scene>,
    pub clips: Vec<Handle<AnimationClip>>,
}

/// Result of the pending model load.
#[derive(Event, Debug, Clone)]
pub enum ModelLoadOutcome {
    Loaded(LoadedModel),
    Failed(ArError),
}
