//! AR camera that renders from the tracked viewer pose.

/// Camera spawn and per-frame viewer pose synchronisation.
pub mod ar_camera;
