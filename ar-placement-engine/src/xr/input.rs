use bevy::prelude::*;

/// The user's primary action (screen tap or controller trigger).
///
/// Produced only by draining the platform queue, so every select is handled
/// at a fixed point in the frame.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectEvent;
