//! Scene content owned by the engine rather than by a placed model.

/// Placement reticle that mirrors the tracked surface pose.
pub mod reticle;

/// Visible floor for the simulated device's hit-test plane.
#[cfg(not(target_arch = "wasm32"))]
pub mod floor;
